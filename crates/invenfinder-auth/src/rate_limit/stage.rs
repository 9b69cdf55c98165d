//! Rate limiting as a guard stage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use invenfinder_core::config::BucketPolicy;
use invenfinder_core::error::AppError;
use invenfinder_core::result::AppResult;

use crate::guard::{AccessGuard, GuardStage, Outcome, RequestContext};

use super::bucket::Decision;
use super::limiter::{RateLimiter, bucket_key};

/// Response header carrying the bucket capacity.
pub const HEADER_LIMIT: &str = "RateLimit-Limit";
/// Response header carrying the whole tokens left.
pub const HEADER_REMAINING: &str = "RateLimit-Remaining";
/// Response header describing the refill policy.
pub const HEADER_POLICY: &str = "RateLimit-Policy";

/// Picks the client id a request is throttled under.
#[async_trait]
pub trait ClientIdExtractor: Send + Sync + std::fmt::Debug + 'static {
    /// `None` means the client cannot be identified.
    async fn client_id(
        &self,
        guard: &AccessGuard,
        ctx: &RequestContext,
    ) -> AppResult<Option<String>>;
}

/// Keys buckets by client address.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByIp;

#[async_trait]
impl ClientIdExtractor for ByIp {
    async fn client_id(&self, _: &AccessGuard, ctx: &RequestContext) -> AppResult<Option<String>> {
        Ok(ctx.ip().map(str::to_string))
    }
}

/// Keys buckets by the caller's session id.
#[derive(Debug, Clone, Copy, Default)]
pub struct BySession;

#[async_trait]
impl ClientIdExtractor for BySession {
    async fn client_id(
        &self,
        guard: &AccessGuard,
        ctx: &RequestContext,
    ) -> AppResult<Option<String>> {
        Ok(guard.session(ctx).await?.map(|s| s.id.to_string()))
    }
}

/// Callback run when a request is throttled.
pub type LimitCallback = Arc<dyn Fn(&RequestContext, &Decision) + Send + Sync>;

/// Draws one token per request and rejects with 429 once the bucket is dry.
///
/// Every evaluated request gets the `RateLimit-*` headers, admitted or not.
#[derive(Clone)]
pub struct RateLimitStage {
    limiter: RateLimiter,
    tag: String,
    policy: BucketPolicy,
    extractor: Arc<dyn ClientIdExtractor>,
    on_limit: Option<LimitCallback>,
}

impl std::fmt::Debug for RateLimitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitStage")
            .field("tag", &self.tag)
            .field("policy", &self.policy)
            .field("extractor", &self.extractor)
            .field("on_limit", &self.on_limit.is_some())
            .finish()
    }
}

impl RateLimitStage {
    /// A stage keyed by client address.
    pub fn new(limiter: RateLimiter, tag: impl Into<String>, policy: BucketPolicy) -> Self {
        Self {
            limiter,
            tag: tag.into(),
            policy,
            extractor: Arc::new(ByIp),
            on_limit: None,
        }
    }

    /// Replaces the client id extractor.
    pub fn keyed_by(mut self, extractor: impl ClientIdExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Runs `callback` whenever a request is rejected.
    pub fn on_limit(
        mut self,
        callback: impl Fn(&RequestContext, &Decision) + Send + Sync + 'static,
    ) -> Self {
        self.on_limit = Some(Arc::new(callback));
        self
    }
}

#[async_trait]
impl GuardStage for RateLimitStage {
    async fn evaluate(&self, guard: &AccessGuard, ctx: &RequestContext) -> AppResult<Outcome> {
        let client_id = self.extractor.client_id(guard, ctx).await?;
        let key = bucket_key(&self.tag, client_id.as_deref())?;
        let decision = self.limiter.check(&key, &self.policy).await?;

        ctx.add_header(HEADER_LIMIT, format!("{}", self.policy.max.floor()));
        ctx.add_header(
            HEADER_REMAINING,
            format!("{}", decision.remaining.max(0.0).floor()),
        );
        ctx.add_header(HEADER_POLICY, format!("{};w=60", self.policy.rate));

        if decision.admitted {
            return Ok(Outcome::Continue);
        }

        let retry_after = decision.retry_after.unwrap_or(1);
        warn!(
            key = %key,
            retry_after,
            "Request rate limited"
        );
        if let Some(callback) = &self.on_limit {
            callback(ctx, &decision);
        }

        let unit = if retry_after == 1 { "second" } else { "seconds" };
        Ok(Outcome::Reject(AppError::rate_limited(
            format!(
                "You've made too many requests in a short amount of time, please try again in {retry_after} {unit}"
            ),
            retry_after,
        )))
    }
}
