//! CV Section Reconciler: keeps the local cache and the remote profile's
//! `cvSections` eventually consistent.
//!
//! Every operation first has the profile service confirm the caller's token
//! for the user. Reads prefer the remote copy whenever it is non-empty. Writes
//! go to the cache first and are then pushed to the remote service by a
//! spawned task; the remote write is never retried and never rolls the cache
//! back.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::SectionCache;
use crate::errors::AppError;
use crate::models::cv_sections::CvSections;
use crate::models::profile::{ProfileIdentity, ProfileUpdate, UserProfile};
use crate::remote::{BearerToken, ProfileService, RemoteError};
use crate::sections::callers::VerifiedCallers;
use crate::sections::editors::{next_entry_id, SectionEdit};
use crate::sections::merge::merge;
use crate::sections::notices::{SyncNotices, SyncOutcome};

/// Result of a commit: the sections now visible locally plus the background
/// remote write. Dropping the handle detaches the write; it still runs.
#[derive(Debug)]
pub struct CommitHandle {
    pub sections: CvSections,
    pub sync_id: Uuid,
    sync: JoinHandle<SyncOutcome>,
}

impl CommitHandle {
    /// Waits for the remote write to finish.
    pub async fn wait(self) -> (CvSections, SyncOutcome) {
        let outcome = match self.sync.await {
            Ok(outcome) => outcome,
            Err(e) => SyncOutcome::failed(self.sync_id, format!("sync task aborted: {e}")),
        };
        (self.sections, outcome)
    }

    /// Leaves the remote write running in the background.
    pub fn detach(self) -> CvSections {
        self.sections
    }
}

#[derive(Clone)]
pub struct CvSectionReconciler {
    profiles: Arc<dyn ProfileService>,
    cache: SectionCache,
    callers: VerifiedCallers,
    notices: SyncNotices,
}

/// A caller whose token the profile service accepted for the user.
struct Caller {
    identity: ProfileIdentity,
    /// `None` when the profile service was unreachable and an earlier
    /// verification of the same token was used instead.
    profile: Option<UserProfile>,
}

impl Caller {
    /// Remote `cvSections`. An undecodable remote object is an error, never
    /// treated as absent.
    fn remote_sections(&self, user_id: &str) -> Result<Option<CvSections>, AppError> {
        let Some(profile) = &self.profile else {
            return Ok(None);
        };
        profile.remote_sections().map_err(|e| {
            warn!("Remote cvSections for {user_id} could not be decoded: {e}");
            AppError::Remote(format!("remote cvSections could not be decoded: {e}"))
        })
    }
}

impl CvSectionReconciler {
    pub fn new(
        profiles: Arc<dyn ProfileService>,
        cache: SectionCache,
        callers: VerifiedCallers,
        notices: SyncNotices,
    ) -> Self {
        Self {
            profiles,
            cache,
            callers,
            notices,
        }
    }

    /// Loads the current sections for a user.
    ///
    /// When the profile service is unreachable, a caller verified within the
    /// last few minutes is served from the cache.
    pub async fn load(&self, user_id: &str, token: &BearerToken) -> Result<CvSections, AppError> {
        let caller = self.verify(user_id, token).await?;
        let remote = caller.remote_sections(user_id)?;
        self.reconcile(user_id, remote).await
    }

    /// Writes `sections` to the cache, then starts the remote upsert.
    ///
    /// The cache write completes before this returns, so any read that falls
    /// back to the cache observes the new value while the remote call is
    /// still pending.
    pub async fn commit(
        &self,
        user_id: &str,
        token: &BearerToken,
        sections: CvSections,
    ) -> Result<CommitHandle, AppError> {
        let caller = self.verify(user_id, token).await?;
        self.commit_verified(user_id, token, caller.identity, sections)
            .await
    }

    /// Validates one editor submission, applies it to the current sections
    /// and commits the result.
    pub async fn apply_edit(
        &self,
        user_id: &str,
        token: &BearerToken,
        edit: SectionEdit,
    ) -> Result<CommitHandle, AppError> {
        edit.validate()?;

        let caller = self.verify(user_id, token).await?;
        let remote = caller.remote_sections(user_id)?;
        let current = match self.cache.read(user_id).await? {
            Some(sections) => sections,
            None => self.reconcile(user_id, remote).await?,
        };
        let section = edit.section();
        let updated = edit.submit(current, next_entry_id())?;
        debug!("Applied {section} edit for {user_id}");

        self.commit_verified(user_id, token, caller.identity, updated)
            .await
    }

    /// Latest remote sync outcome for the user.
    pub async fn sync_status(
        &self,
        user_id: &str,
        token: &BearerToken,
    ) -> Result<Option<SyncOutcome>, AppError> {
        self.verify(user_id, token).await?;
        Ok(self.notices.latest(user_id).await)
    }

    /// Confirms that the profile service accepts `token` for `user_id`.
    async fn verify(&self, user_id: &str, token: &BearerToken) -> Result<Caller, AppError> {
        match self.profiles.fetch_profile(user_id, token).await {
            Ok(profile) => {
                let identity = profile.identity();
                self.callers
                    .remember(user_id, token, identity.clone())
                    .await;
                Ok(Caller {
                    identity,
                    profile: Some(profile),
                })
            }
            Err(RemoteError::Unauthorized { status }) => {
                warn!("Profile service rejected caller for {user_id} (status {status})");
                self.callers.forget(user_id, token).await;
                Err(AppError::Unauthorized)
            }
            Err(e) => match self.callers.identity(user_id, token).await {
                Some(identity) => {
                    warn!("Profile fetch for {user_id} failed, using earlier verification: {e}");
                    Ok(Caller {
                        identity,
                        profile: None,
                    })
                }
                None => {
                    warn!("Cannot verify caller for {user_id}: {e}");
                    Err(e.into())
                }
            },
        }
    }

    /// Applies the merge rule and refreshes the cache when the remote wins.
    async fn reconcile(
        &self,
        user_id: &str,
        remote: Option<CvSections>,
    ) -> Result<CvSections, AppError> {
        let from_remote = remote.is_some();
        let cached = if from_remote {
            None
        } else {
            self.cache.read(user_id).await?
        };
        let sections = merge(remote, cached);

        if from_remote {
            // Remote wins: refresh the local snapshot.
            if let Err(e) = self.cache.write(user_id, &sections).await {
                warn!("Failed to refresh cache for {user_id}: {e}");
            }
        }
        debug!(
            "Loaded CV sections for {user_id} (source: {}, blank: {})",
            if from_remote { "remote" } else { "cache" },
            sections.is_blank()
        );
        Ok(sections)
    }

    async fn commit_verified(
        &self,
        user_id: &str,
        token: &BearerToken,
        identity: ProfileIdentity,
        sections: CvSections,
    ) -> Result<CommitHandle, AppError> {
        self.cache.write(user_id, &sections).await?;

        let sync_id = Uuid::new_v4();
        info!(
            "Committed CV sections for {user_id} to {} cache, remote sync {sync_id} started",
            self.cache.backend()
        );

        let this = self.clone();
        let user_id = user_id.to_string();
        let token = token.clone();
        let payload = sections.clone();
        let sync = tokio::spawn(async move {
            let outcome = this
                .push_remote(&user_id, &token, &identity, &payload, sync_id)
                .await;
            this.notices.record(&user_id, outcome.clone()).await;
            outcome
        });

        Ok(CommitHandle {
            sections,
            sync_id,
            sync,
        })
    }

    async fn push_remote(
        &self,
        user_id: &str,
        token: &BearerToken,
        identity: &ProfileIdentity,
        sections: &CvSections,
        sync_id: Uuid,
    ) -> SyncOutcome {
        let (Some(user_name), Some(user_email)) =
            (identity.user_name.as_deref(), identity.user_email.as_deref())
        else {
            warn!("Skipping remote sync {sync_id} for {user_id}: profile lacks userName or userEmail");
            return SyncOutcome::skipped(sync_id, "profile is missing userName or userEmail");
        };

        let update = ProfileUpdate {
            user_name,
            user_email,
            cv_sections: sections,
        };
        match self.profiles.update_profile(user_id, token, &update).await {
            Ok(()) => {
                info!("Remote sync {sync_id} for {user_id} succeeded");
                SyncOutcome::synced(sync_id)
            }
            Err(RemoteError::Unauthorized { status }) => {
                warn!("Remote sync {sync_id} for {user_id} rejected (status {status})");
                self.callers.forget(user_id, token).await;
                SyncOutcome::unauthorized(sync_id)
            }
            Err(e) => {
                warn!("Remote sync {sync_id} for {user_id} failed: {e}");
                SyncOutcome::failed(sync_id, e.to_string())
            }
        }
    }
}
