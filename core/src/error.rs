//! Error types for the ActiveCampaign client.
//!
//! # Design
//! Failures split along the three phases of a call: building the client
//! (`Configuration`), getting an answer from the server (`Transport`,
//! `HttpError`, `UnexpectedStatus`) and moving JSON in and out
//! (`SerializationError`, `DeserializationError`). Dictionary lookups have
//! their own `Lookup` variant since they never touch the network.

use thiserror::Error;

/// Errors returned by `ActiveCampaign`, `Config` and `Transport`
/// implementations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Token, base URL or API version resolved to an empty value.
    #[error("ActiveCampaign connection requires {0}")]
    Configuration(String),

    /// No response was obtained from the server.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a status of 400 or above.
    #[error("request failed: HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The server answered with a 1xx/3xx status the client cannot use.
    #[error("request failed: unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A dictionary category or label was never registered.
    #[error("dictionary lookup failed: {0}")]
    Lookup(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be decoded as JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

impl ApiError {
    /// True when the request did not complete or did not succeed, the cases
    /// boolean-mode operations report as `false`.
    pub fn is_request_failed(&self) -> bool {
        matches!(
            self,
            ApiError::Transport(_) | ApiError::HttpError { .. } | ApiError::UnexpectedStatus { .. }
        )
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } | ApiError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
