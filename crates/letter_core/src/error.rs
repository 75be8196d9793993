//! crates/letter_core/src/error.rs
//!
//! The error type for operations that combine the engine with the ports.

use crate::ports::{DenialReason, PortError};
use crate::traversal::TraversalError;
use crate::validation::Violation;

#[derive(Debug, thiserror::Error)]
pub enum LetterError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error("Access denied: {0}")]
    AccessDenied(DenialReason),

    /// The letter failed validation. Never repaired silently.
    #[error("Malformed letter ({} problem(s))", .0.len())]
    MalformedDocument(Vec<Violation>),

    #[error("Letter is not valid JSON: {0}")]
    InvalidJson(String),
}

pub type LetterResult<T> = Result<T, LetterError>;
