//! crates/letter_core/src/ports.rs
//!
//! Defines the service contracts (traits) the letter core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the storage technology and of how tokens are kept.

use async_trait::async_trait;

use crate::domain::TokenRecord;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Access denial
//=========================================================================================

/// Why a token did not grant access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DenialReason {
    #[error("Token not found")]
    NotFound,
    #[error("Token is invalid")]
    Invalid,
    #[error("Token has expired")]
    Expired,
    #[error("Token has already been used")]
    AlreadyUsed,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Generic key-value persistence. Values are opaque bytes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>) -> PortResult<()>;

    /// Removes a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> PortResult<bool>;

    /// All keys starting with `prefix`, in ascending order.
    async fn keys(&self, prefix: &str) -> PortResult<Vec<String>>;
}

/// Decides whether a token opens a letter and records its one-time use.
#[async_trait]
pub trait TokenGate: Send + Sync {
    /// The outer result carries storage failures, the inner one the verdict.
    async fn validate(&self, token: &str) -> PortResult<Result<TokenRecord, DenialReason>>;

    /// Marks a token consumed. Returns `false` if it had already been used.
    async fn mark_used(&self, token: &str) -> PortResult<bool>;
}
