//! # Managed Session Scope
//!
//! Acquire/release scope around the request's database handle. The core only
//! needs the guarantee that every acquired lease is released, on success,
//! error and early return alike; [`with_managed_session`] provides it.

use crate::error::{Result, SupervisorError};
use crate::models::DbSessionHandle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};
use uuid::Uuid;

/// A session checked out for the duration of one orchestration
pub struct SessionLease {
    pub lease_id: String,
    pub session: DbSessionHandle,
    pub acquired_at: DateTime<Utc>,
}

impl SessionLease {
    pub fn new(session: DbSessionHandle) -> Self {
        Self {
            lease_id: Uuid::new_v4().to_string(),
            session,
            acquired_at: Utc::now(),
        }
    }
}

impl fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLease")
            .field("lease_id", &self.lease_id)
            .field("session_id", &self.session.session_id())
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self, handle: &DbSessionHandle) -> Result<SessionLease>;

    async fn release(&self, lease: SessionLease) -> Result<()>;
}

/// Provider that leases the caller's handle as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSessionProvider;

#[async_trait]
impl SessionProvider for PassthroughSessionProvider {
    async fn acquire(&self, handle: &DbSessionHandle) -> Result<SessionLease> {
        Ok(SessionLease::new(handle.clone()))
    }

    async fn release(&self, _lease: SessionLease) -> Result<()> {
        Ok(())
    }
}

/// Run `body` with a leased session, releasing the lease on every exit path
///
/// A release failure is logged; the body's own outcome is returned.
pub async fn with_managed_session<F, Fut, T>(
    provider: &dyn SessionProvider,
    handle: &DbSessionHandle,
    body: F,
) -> Result<T>
where
    F: FnOnce(DbSessionHandle) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let lease = provider.acquire(handle).await.map_err(|e| match e {
        SupervisorError::Session(_) => e,
        other => SupervisorError::Session(other.to_string()),
    })?;
    let lease_id = lease.lease_id.clone();
    debug!(lease_id = %lease_id, session_id = %lease.session.session_id(), "Session lease acquired");

    let outcome = body(lease.session.clone()).await;

    if let Err(e) = provider.release(lease).await {
        warn!(lease_id = %lease_id, error = %e, "Failed to release session lease");
    } else {
        debug!(lease_id = %lease_id, "Session lease released");
    }

    outcome
}
