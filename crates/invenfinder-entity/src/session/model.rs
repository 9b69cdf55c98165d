//! Session entity model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A login session.
///
/// Local sessions are created on password login and deleted on logout.
/// SSO sessions are bound to the identity provider's access token and are
/// only ever marked revoked, so a revoked upstream token can never be
/// resurrected by a later lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// Opaque bearer credential presented by the client.
    #[serde(skip_serializing)]
    pub token: String,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Client address at creation.
    pub ip: String,
    /// User-Agent header at creation.
    pub user_agent: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Name of the identity provider backing this session.
    pub sso_provider: Option<String>,
    /// Last successful confirmation with the identity provider.
    pub last_verified: Option<DateTime<Utc>>,
    /// Revoked sessions never authenticate.
    pub revoked: bool,
}

impl Session {
    /// Whether the session is backed by an identity provider.
    pub fn is_sso(&self) -> bool {
        self.sso_provider.is_some()
    }

    /// Whether an SSO session is due for a provider round-trip at `now`.
    ///
    /// Local sessions never need revalidation. An SSO session that was never
    /// verified is always due.
    pub fn needs_revalidation(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        if !self.is_sso() {
            return false;
        }
        match self.last_verified {
            Some(verified) => (now - verified).to_std().is_ok_and(|age| age > interval),
            None => true,
        }
    }
}
