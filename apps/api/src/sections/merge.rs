use crate::models::cv_sections::CvSections;

/// Picks the current CV sections from the remote and cached copies.
///
/// The remote copy wins whenever it is present; `None` for `remote` means the
/// profile had no `cvSections` object or an empty one.
pub fn merge(remote: Option<CvSections>, cached: Option<CvSections>) -> CvSections {
    remote.or(cached).unwrap_or_default()
}
