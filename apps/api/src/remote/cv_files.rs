use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::models::profile::CvFileRecord;
use crate::remote::{BearerToken, RemoteBase, RemoteError};

/// A CV file received from the caller, forwarded as multipart.
#[derive(Debug, Clone)]
pub struct CvUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub cv_name: Option<String>,
}

/// Pass-through client for the external CV-file endpoints.
#[derive(Clone)]
pub struct CvFileClient {
    base: RemoteBase,
}

impl CvFileClient {
    pub fn new(base: RemoteBase) -> Self {
        Self { base }
    }

    /// GET /api/cv/list
    pub async fn list(&self, token: &BearerToken) -> Result<Vec<CvFileRecord>, RemoteError> {
        let url = self.base.url("/api/cv/list");
        self.base
            .send_json(self.base.client().get(url), token)
            .await
    }

    /// POST /api/cv/upload
    pub async fn upload(
        &self,
        token: &BearerToken,
        upload: CvUpload,
    ) -> Result<Value, RemoteError> {
        let mut part = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name);
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let mut form = Form::new().part("file", part);
        if let Some(cv_name) = upload.cv_name {
            form = form.text("cvName", cv_name);
        }

        let url = self.base.url("/api/cv/upload");
        self.base
            .send_json(self.base.client().post(url).multipart(form), token)
            .await
    }

    /// PUT /api/cv/set-default/{cvId}
    pub async fn set_default(&self, token: &BearerToken, cv_id: &str) -> Result<(), RemoteError> {
        let url = self.base.url(&format!("/api/cv/set-default/{cv_id}"));
        self.base
            .send_empty(self.base.client().put(url), token)
            .await
    }

    /// DELETE /api/cv/delete/{cvId}
    pub async fn delete(&self, token: &BearerToken, cv_id: &str) -> Result<(), RemoteError> {
        let url = self.base.url(&format!("/api/cv/delete/{cv_id}"));
        self.base
            .send_empty(self.base.client().delete(url), token)
            .await
    }
}
