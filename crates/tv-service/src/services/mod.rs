//! Service layer for the token verifier.
//!
//! # Components
//!
//! - `authority` - HTTP client for the external trust authority
//! - `verifier` - Token verification pipeline

pub mod authority;
pub mod verifier;

pub use authority::{AuthorityClient, TrustAuthority};
// Mock authority for testing (exposed for integration tests)
#[allow(unused_imports)]
pub use authority::mock::MockAuthority;
