//! SessionRegistry integration tests
//!
//! Covers registration and lookup, identity uniqueness, and rebuilding the
//! default session from the credential store.

mod default_session;
mod operations;
