//! Keyed token-bucket throttling.
//!
//! Buckets are identified by `tag:clientID`, so call sites with different
//! tags never share a budget even for the same client.

pub mod bucket;
pub mod limiter;
pub mod stage;
pub mod sweep;

pub use bucket::{Bucket, Decision};
pub use limiter::{RateLimiter, bucket_key};
pub use stage::{ByIp, BySession, ClientIdExtractor, RateLimitStage};
pub use sweep::BucketSweeper;
