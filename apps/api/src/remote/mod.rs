//! HTTP clients for the external profile and CV-file services.
//!
//! Every call forwards the caller's bearer credential. There is no retry and
//! no explicit timeout: a failed call is reported once and left to the caller.

pub mod cv_files;
pub mod profiles;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::models::profile::Envelope;

pub use cv_files::{CvFileClient, CvUpload};
pub use profiles::{HttpProfileClient, ProfileService};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential rejected by remote service (status {status})")]
    Unauthorized { status: u16 },

    #[error("Remote error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Opaque bearer credential forwarded verbatim to the remote services.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: String,
}

/// Shared base for the remote clients: one reqwest client plus the service
/// root URL.
#[derive(Clone)]
pub struct RemoteBase {
    client: Client,
    base_url: String,
}

impl RemoteBase {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Sends an authenticated request and decodes a (possibly `data`-wrapped)
    /// JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &BearerToken,
    ) -> Result<T, RemoteError> {
        let response = self.send(request, token).await?;
        let body = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.into_inner())
    }

    /// Sends an authenticated request, discarding the body on success.
    pub(crate) async fn send_empty(
        &self,
        request: RequestBuilder,
        token: &BearerToken,
    ) -> Result<(), RemoteError> {
        self.send(request, token).await?;
        Ok(())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        token: &BearerToken,
    ) -> Result<Response, RemoteError> {
        let response = request.bearer_auth(token.as_str()).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Remote service rejected credential: {status}");
            return Err(RemoteError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let message = serde_json::from_str::<RemoteErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Multipart, Path},
        http::{header, HeaderMap, StatusCode as AxumStatus},
        response::{IntoResponse, Response as AxumResponse},
        routing::{delete, get, post},
        Json, Router,
    };
    use bytes::Bytes;
    use serde_json::{json, Value};

    use crate::models::cv_sections::CvSections;
    use crate::models::profile::ProfileUpdate;

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    /// Serves `router` on an ephemeral local port.
    async fn serve(router: Router) -> RemoteBase {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        RemoteBase::new(format!("http://{addr}"))
    }

    fn bearer(headers: &HeaderMap) -> Option<&str> {
        headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    fn rejected(headers: &HeaderMap) -> Option<AxumResponse> {
        match bearer(headers) {
            Some("good") => None,
            Some("forbidden") => {
                Some((AxumStatus::FORBIDDEN, Json(json!({ "message": "forbidden" }))).into_response())
            }
            _ => Some(
                (AxumStatus::UNAUTHORIZED, Json(json!({ "message": "jwt expired" }))).into_response(),
            ),
        }
    }

    /// Profile service accepting only the token "good".
    fn profile_service(updates: Captured) -> Router {
        Router::new()
            .route(
                "/users/user/:id",
                get(|Path(id): Path<String>, headers: HeaderMap| async move {
                    if let Some(response) = rejected(&headers) {
                        return response;
                    }
                    match id.as_str() {
                        "crash" => (
                            AxumStatus::INTERNAL_SERVER_ERROR,
                            Json(json!({ "message": "database unavailable" })),
                        )
                            .into_response(),
                        "plain" => (AxumStatus::SERVICE_UNAVAILABLE, "upstream down").into_response(),
                        _ => Json(json!({
                            "data": { "_id": id, "userName": "An", "userEmail": "an@example.com" }
                        }))
                        .into_response(),
                    }
                }),
            )
            .route(
                "/users/update-profile/:id",
                axum::routing::put(
                    move |Path(id): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                        let updates = updates.clone();
                        async move {
                            if let Some(response) = rejected(&headers) {
                                return response;
                            }
                            updates.lock().unwrap().push((id, body.clone()));
                            Json(json!({ "data": body })).into_response()
                        }
                    },
                ),
            )
    }

    /// Upload service echoing what it received.
    fn upload_service(deleted: Captured) -> Router {
        Router::new()
            .route(
                "/api/cv/list",
                get(|headers: HeaderMap| async move {
                    if let Some(response) = rejected(&headers) {
                        return response;
                    }
                    Json(json!({ "data": [{
                        "_id": "cv1",
                        "cvName": "Backend CV",
                        "filePath": "uploads/cv1.pdf",
                        "isDefault": true
                    }] }))
                    .into_response()
                }),
            )
            .route(
                "/api/cv/upload",
                post(|mut multipart: Multipart| async move {
                    let mut received = serde_json::Map::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let content_type = field.content_type().map(str::to_string);
                        let content = field.text().await.unwrap();
                        received.insert(
                            name,
                            json!({
                                "fileName": file_name,
                                "contentType": content_type,
                                "content": content
                            }),
                        );
                    }
                    (AxumStatus::CREATED, Json(json!({ "data": received })))
                }),
            )
            .route(
                "/api/cv/delete/:id",
                delete(move |Path(id): Path<String>, headers: HeaderMap| {
                    let deleted = deleted.clone();
                    async move {
                        if let Some(response) = rejected(&headers) {
                            return response;
                        }
                        deleted.lock().unwrap().push((id, Value::Null));
                        AxumStatus::NO_CONTENT.into_response()
                    }
                }),
            )
    }

    fn good() -> BearerToken {
        BearerToken::new("good")
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let base = RemoteBase::new("http://profiles.local/");
        assert_eq!(base.url("/users/user/1"), "http://profiles.local/users/user/1");
    }

    #[test]
    fn test_bearer_token_debug_is_redacted() {
        let token = BearerToken::new("secret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
        assert_eq!(token.as_str(), "secret");
    }

    #[tokio::test]
    async fn test_fetch_profile_forwards_bearer_and_unwraps_data() {
        let base = serve(profile_service(Captured::default())).await;
        let client = HttpProfileClient::new(base);

        let profile = client.fetch_profile("u1", &good()).await.unwrap();
        assert_eq!(profile.id, "u1");
        assert!(profile.identity().is_complete());
    }

    #[tokio::test]
    async fn test_401_and_403_map_to_unauthorized() {
        let base = serve(profile_service(Captured::default())).await;
        let client = HttpProfileClient::new(base);

        for (token, expected) in [("expired", 401), ("forbidden", 403)] {
            let err = client
                .fetch_profile("u1", &BearerToken::new(token))
                .await
                .unwrap_err();
            assert!(
                matches!(err, RemoteError::Unauthorized { status } if status == expected),
                "{token}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_error_message_read_from_body() {
        let base = serve(profile_service(Captured::default())).await;
        let client = HttpProfileClient::new(base);

        match client.fetch_profile("crash", &good()).await.unwrap_err() {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }

        match client.fetch_profile("plain", &good()).await.unwrap_err() {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_update_profile_puts_identity_and_sections() {
        let updates = Captured::default();
        let base = serve(profile_service(updates.clone())).await;
        let client = HttpProfileClient::new(base);

        let sections: CvSections =
            serde_json::from_value(json!({ "introduction": "Hi", "hobbies": "chess" })).unwrap();
        let update = ProfileUpdate {
            user_name: "An",
            user_email: "an@example.com",
            cv_sections: &sections,
        };
        client.update_profile("u1", &good(), &update).await.unwrap();

        let updates = updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 1);
        let (id, body) = &updates[0];
        assert_eq!(id, "u1");
        assert_eq!(body["userName"], "An");
        assert_eq!(body["userEmail"], "an@example.com");
        assert_eq!(body["cvSections"]["introduction"], "Hi");
        assert_eq!(body["cvSections"]["hobbies"], "chess");
        assert_eq!(body["cvSections"]["skills"], json!([]));

        let err = client
            .update_profile("u1", &BearerToken::new("expired"), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized { status: 401 }));
    }

    #[tokio::test]
    async fn test_cv_list_and_delete() {
        let deleted = Captured::default();
        let base = serve(upload_service(deleted.clone())).await;
        let client = CvFileClient::new(base);

        let files = client.list(&good()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "cv1");
        assert!(files[0].is_default);

        client.delete(&good(), "cv1").await.unwrap();
        assert_eq!(deleted.lock().unwrap()[0].0, "cv1");

        let err = client
            .delete(&BearerToken::new("expired"), "cv1")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_cv_upload_forwards_file_and_name() {
        let base = serve(upload_service(Captured::default())).await;
        let client = CvFileClient::new(base);

        let created = client
            .upload(
                &good(),
                CvUpload {
                    file_name: "cv.pdf".to_string(),
                    content_type: Some("application/pdf".to_string()),
                    bytes: Bytes::from_static(b"%PDF-1.4"),
                    cv_name: Some("Backend CV".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(created["file"]["fileName"], "cv.pdf");
        assert_eq!(created["file"]["contentType"], "application/pdf");
        assert_eq!(created["file"]["content"], "%PDF-1.4");
        assert_eq!(created["cvName"]["content"], "Backend CV");
    }
}
