//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the recipient's browser and the
//! API server while a letter is being read.

use letter_core::{
    ports::DenialReason, LetterError, PortError, SectionView, Summary, SummaryRecord, TraversalError,
};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Redeems an access token. This must be the first message sent on the connection.
    Open { token: String },

    /// Follows one of the choices of the section currently shown.
    #[serde(rename_all = "camelCase")]
    Choose { choice_index: usize },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// How the reader should style the letter.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LetterStyle {
    pub theme: String,
    /// A CSS length, e.g. `1.2rem`.
    pub text_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_styles: Option<String>,
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the token was accepted and shows the start section.
    LetterOpened {
        title: String,
        style: LetterStyle,
        section: SectionView,
    },

    /// The section reached after a choice.
    Section { section: SectionView },

    /// The reader arrived at a final section. No further choices are accepted.
    #[serde(rename_all = "camelCase")]
    JourneyComplete { summary_id: String, summary: Summary },

    /// Reports an error to the client. Every error ends the reading session.
    Error { kind: ErrorKind, message: String },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TokenNotFound,
    TokenInvalid,
    TokenExpired,
    TokenAlreadyUsed,
    SectionNotFound,
    MalformedDocument,
    InvalidMessage,
    Internal,
}

impl ServerMessage {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn journey_complete(record: SummaryRecord) -> Self {
        ServerMessage::JourneyComplete {
            summary_id: record.id,
            summary: record.summary,
        }
    }
}

impl From<&LetterError> for ServerMessage {
    fn from(err: &LetterError) -> Self {
        let kind = match err {
            LetterError::AccessDenied(DenialReason::NotFound) => ErrorKind::TokenNotFound,
            LetterError::AccessDenied(DenialReason::Invalid) => ErrorKind::TokenInvalid,
            LetterError::AccessDenied(DenialReason::Expired) => ErrorKind::TokenExpired,
            LetterError::AccessDenied(DenialReason::AlreadyUsed) => ErrorKind::TokenAlreadyUsed,
            LetterError::Traversal(TraversalError::SectionNotFound(_))
            | LetterError::Port(PortError::NotFound(_)) => ErrorKind::SectionNotFound,
            LetterError::MalformedDocument(_) | LetterError::InvalidJson(_) => {
                ErrorKind::MalformedDocument
            }
            LetterError::Traversal(_) => ErrorKind::InvalidMessage,
            LetterError::Port(_) => ErrorKind::Internal,
        };
        let message = match err {
            LetterError::Port(PortError::NotFound(_)) => {
                "Letter not found. The link may be invalid or expired.".to_string()
            }
            LetterError::Port(_) => "Error loading letter. Please try again later.".to_string(),
            _ => err.to_string(),
        };
        ServerMessage::error(kind, message)
    }
}
