//! OpenID Connect delegation.
//!
//! The browser runs the authorization-code + PKCE flow itself and presents
//! the resulting access token; the server only discovers providers and
//! exchanges tokens for identity claims at the userinfo endpoint.

pub mod delegate;
pub mod discovery;
pub mod verifier;

pub use delegate::SsoDelegate;
pub use discovery::{ProviderMetadata, ProviderSummary};
pub use verifier::{IdentityVerifier, UserInfo};
