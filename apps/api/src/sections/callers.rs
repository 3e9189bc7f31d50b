//! Callers the profile service has recently accepted for a user.
//!
//! An entry is written only after `fetch_profile` succeeds with the caller's
//! token. It lets a write proceed while the profile service is briefly
//! unreachable, and carries the identity the remote upsert needs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::models::profile::ProfileIdentity;
use crate::remote::BearerToken;

pub const VERIFIED_CALLER_TTL_MINUTES: i64 = 15;
pub const MAX_VERIFIED_CALLERS: usize = 10_000;

#[derive(Debug, Clone)]
struct VerifiedCaller {
    token: BearerToken,
    identity: ProfileIdentity,
    verified_at: DateTime<Utc>,
}

/// Bounded, expiring map of `user_id` to the last verified caller.
#[derive(Clone)]
pub struct VerifiedCallers {
    inner: Arc<RwLock<HashMap<String, VerifiedCaller>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for VerifiedCallers {
    fn default() -> Self {
        Self::with_limits(
            Duration::minutes(VERIFIED_CALLER_TTL_MINUTES),
            MAX_VERIFIED_CALLERS,
        )
    }
}

impl VerifiedCallers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Records a successful verification, dropping expired entries and, when
    /// full, the oldest one.
    pub async fn remember(&self, user_id: &str, token: &BearerToken, identity: ProfileIdentity) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.retain(|_, caller| now - caller.verified_at < self.ttl);

        if inner.len() >= self.capacity && !inner.contains_key(user_id) {
            let oldest = inner
                .iter()
                .min_by_key(|(_, caller)| caller.verified_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                inner.remove(&key);
            }
        }

        inner.insert(
            user_id.to_string(),
            VerifiedCaller {
                token: token.clone(),
                identity,
                verified_at: now,
            },
        );
    }

    /// Identity from an unexpired verification of this exact token.
    pub async fn identity(&self, user_id: &str, token: &BearerToken) -> Option<ProfileIdentity> {
        let inner = self.inner.read().await;
        inner
            .get(user_id)
            .filter(|caller| &caller.token == token)
            .filter(|caller| Utc::now() - caller.verified_at < self.ttl)
            .map(|caller| caller.identity.clone())
    }

    /// Drops the entry for `user_id` if it was verified with `token`.
    pub async fn forget(&self, user_id: &str, token: &BearerToken) {
        let mut inner = self.inner.write().await;
        if inner.get(user_id).is_some_and(|caller| &caller.token == token) {
            inner.remove(user_id);
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
