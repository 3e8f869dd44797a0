//! Interface to the hosting platform (GitHub).
//!
//! Provides token-based authentication, repository content access, branch
//! creation and pull request operations through a common trait, plus the
//! dry-run aware manager and the change submission workflow built on top.

/// Connection configuration and repository references.
pub mod config;

/// GitHub API client implementation.
pub mod github;

/// Dry-run aware wrapper around a forge implementation.
pub mod manager;

/// Request and response types exchanged with the forge.
pub mod request;

/// Idempotent branch, commit and pull request workflow.
pub mod submission;

/// Common traits for forge platform abstraction.
pub mod traits;
