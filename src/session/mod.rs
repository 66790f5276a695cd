//! Upload Session Manager
//!
//! Turns a list of file descriptors into a session plan: one deterministic
//! object key and one time-bounded presigned upload grant per file.
//!
//! Protocol flow:
//! 1. Client describes its files (relative path, size, content type)
//! 2. Server sanitizes paths, derives object keys, and mints one grant per key
//! 3. Client PUTs each file directly to its granted URL before expiry
//!
//! The manager is stateless across calls: the returned plan is the session,
//! and each grant's expiry is the sole validity boundary.

pub mod keys;
pub mod manager;
pub mod types;

pub use keys::{derive_object_key, sanitize_relative_path};
pub use manager::{CredentialIssuer, S3CredentialIssuer, SessionManager};
pub use types::*;
