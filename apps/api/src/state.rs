use crate::config::Config;
use crate::remote::CvFileClient;
use crate::sections::reconciler::CvSectionReconciler;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the cache, the profile-service port and the sync notices.
    pub reconciler: CvSectionReconciler,
    pub cv_files: CvFileClient,
    pub config: Config,
}
