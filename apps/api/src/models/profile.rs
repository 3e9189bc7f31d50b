use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::cv_sections::CvSections;

/// Profile record owned by the remote profile service.
///
/// `cv_sections` is kept as the raw JSON object so callers can tell an absent
/// or empty object apart from one that merely holds empty lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub personal_link: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, rename = "avatar")]
    pub avatar_ref: Option<String>,
    #[serde(default)]
    pub cv_sections: Option<Map<String, Value>>,
}

impl UserProfile {
    /// Decodes `cvSections` when the remote object carries at least one key.
    pub fn remote_sections(&self) -> Result<Option<CvSections>, serde_json::Error> {
        match &self.cv_sections {
            Some(map) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map.clone())).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn identity(&self) -> ProfileIdentity {
        ProfileIdentity {
            user_name: non_blank(self.user_name.as_deref()),
            user_email: non_blank(self.user_email.as_deref()),
        }
    }
}

/// The two profile fields the remote upsert contract requires alongside
/// `cvSections`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileIdentity {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl ProfileIdentity {
    pub fn is_complete(&self) -> bool {
        self.user_name.is_some() && self.user_email.is_some()
    }
}

/// Body of `PUT /users/update-profile/{id}` as used for CV persistence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate<'a> {
    pub user_name: &'a str,
    pub user_email: &'a str,
    pub cv_sections: &'a CvSections,
}

/// CV file metadata owned by the external upload service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvFileRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub cv_name: String,
    pub file_path: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// Remote responses arrive either bare or wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_cv_sections_object_is_absent() {
        let p = profile(json!({ "id": "u1", "cvSections": {} }));
        assert!(p.remote_sections().unwrap().is_none());

        let p = profile(json!({ "id": "u1" }));
        assert!(p.remote_sections().unwrap().is_none());
    }

    #[test]
    fn test_object_with_empty_lists_is_present() {
        let p = profile(json!({ "id": "u1", "cvSections": { "education": [] } }));
        assert_eq!(p.remote_sections().unwrap(), Some(CvSections::default()));
    }

    #[test]
    fn test_identity_ignores_blank_fields() {
        let p = profile(json!({ "_id": "u1", "userName": "  ", "userEmail": "a@b.c" }));
        let identity = p.identity();
        assert_eq!(identity.user_name, None);
        assert_eq!(identity.user_email.as_deref(), Some("a@b.c"));
        assert!(!identity.is_complete());
    }

    #[test]
    fn test_envelope_accepts_wrapped_and_bare() {
        let wrapped: Envelope<UserProfile> =
            serde_json::from_value(json!({ "data": { "id": "u1" } })).unwrap();
        assert_eq!(wrapped.into_inner().id, "u1");

        let bare: Envelope<UserProfile> =
            serde_json::from_value(json!({ "id": "u2", "userName": "An" })).unwrap();
        assert_eq!(bare.into_inner().id, "u2");
    }

    #[test]
    fn test_update_body_shape() {
        let sections = CvSections::default();
        let body = ProfileUpdate {
            user_name: "An",
            user_email: "an@example.com",
            cv_sections: &sections,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["userName"], "An");
        assert_eq!(value["userEmail"], "an@example.com");
        assert_eq!(value["cvSections"]["introduction"], "");
    }
}
