use async_trait::async_trait;
use tracing::debug;

use crate::models::profile::{ProfileUpdate, UserProfile};
use crate::remote::{BearerToken, RemoteBase, RemoteError};

/// Port to the remote profile service, the canonical home of `cvSections`.
///
/// Carried in `AppState` as `Arc<dyn ProfileService>` so tests can swap in an
/// in-memory double.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn fetch_profile(
        &self,
        user_id: &str,
        token: &BearerToken,
    ) -> Result<UserProfile, RemoteError>;

    /// Upserts the profile. The response body is not interpreted.
    async fn update_profile(
        &self,
        user_id: &str,
        token: &BearerToken,
        update: &ProfileUpdate<'_>,
    ) -> Result<(), RemoteError>;
}

/// reqwest implementation of `ProfileService`.
#[derive(Clone)]
pub struct HttpProfileClient {
    base: RemoteBase,
}

impl HttpProfileClient {
    pub fn new(base: RemoteBase) -> Self {
        Self { base }
    }
}

#[async_trait]
impl ProfileService for HttpProfileClient {
    /// GET /users/user/{id}
    async fn fetch_profile(
        &self,
        user_id: &str,
        token: &BearerToken,
    ) -> Result<UserProfile, RemoteError> {
        let url = self.base.url(&format!("/users/user/{user_id}"));
        debug!("Fetching profile {user_id}");
        self.base
            .send_json(self.base.client().get(url), token)
            .await
    }

    /// PUT /users/update-profile/{id}
    async fn update_profile(
        &self,
        user_id: &str,
        token: &BearerToken,
        update: &ProfileUpdate<'_>,
    ) -> Result<(), RemoteError> {
        let url = self.base.url(&format!("/users/update-profile/{user_id}"));
        debug!("Updating profile {user_id}");
        self.base
            .send_empty(self.base.client().put(url).json(update), token)
            .await
    }
}
