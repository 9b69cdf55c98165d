//! Request-scoped authentication state.

use std::sync::{Mutex, PoisonError};

use tokio::sync::OnceCell;

use invenfinder_entity::session::Session;
use invenfinder_entity::user::User;

/// Identity material presented with a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token from the `API-Key` header or the `SID` cookie.
    pub token: Option<String>,
    /// Identity provider named by the `SSO-Name` header.
    pub sso_provider: Option<String>,
}

/// Everything the access guard knows about one request.
///
/// The resolved session and user are computed at most once per request and
/// never shared between requests.
#[derive(Debug)]
pub struct RequestContext {
    credentials: Credentials,
    ip: Option<String>,
    user_agent: String,
    pub(crate) session: OnceCell<Option<Session>>,
    pub(crate) user: OnceCell<Option<User>>,
    headers: Mutex<Vec<(&'static str, String)>>,
}

impl RequestContext {
    /// Creates a context for a request from `ip` (if known).
    pub fn new(credentials: Credentials, ip: Option<String>, user_agent: impl Into<String>) -> Self {
        Self {
            credentials,
            ip,
            user_agent: user_agent.into(),
            session: OnceCell::new(),
            user: OnceCell::new(),
            headers: Mutex::new(Vec::new()),
        }
    }

    /// Presented credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Client address, when it could be determined.
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Client address for audit records.
    pub fn ip_or_unknown(&self) -> &str {
        self.ip.as_deref().unwrap_or("unknown")
    }

    /// User-Agent header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Queues a response header. Later values for the same name win.
    pub fn add_header(&self, name: &'static str, value: impl Into<String>) {
        self.headers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name, value.into()));
    }

    /// Drains the queued response headers.
    pub fn take_headers(&self) -> Vec<(&'static str, String)> {
        std::mem::take(&mut *self.headers.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
