//! Unified error type for library providers.
//!
//! Providers funnel configuration, transport and payload failures into
//! [`Error`]. Hosts serving webhooks can derive an HTTP status code via
//! [`Error::http_status`].

use std::fmt;

use crate::media::MediaKind;

/// Every failure a library provider can report to its host.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A method needing server state was called before `initialize`.
    #[error("Provider has not been initialized")]
    NotInitialized,

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "user", "section").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The request never produced a usable response.
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        /// Endpoint path that was requested.
        endpoint: String,
        /// The underlying transport or decode error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The media server answered with a non-success status.
    #[error("Server returned {status} for {endpoint}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Endpoint path that was requested.
        endpoint: String,
        /// Response body, possibly empty.
        body: String,
    },

    /// A webhook request could not be understood.
    #[error("Invalid webhook payload: {0}")]
    Webhook(String),

    /// The server returned an item of a type the provider does not model.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// An item lacks the reference to its parent show or season.
    #[error("{kind} is missing {field}")]
    MissingParent {
        /// Kind of the item that was being resolved.
        kind: MediaKind,
        /// Name of the absent parent reference.
        field: &'static str,
    },
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Config(_) => 500,
            Error::NotInitialized => 503,
            Error::NotFound { .. } => 404,
            Error::Http { .. } => 502,
            Error::Api { .. } => 502,
            Error::Webhook(_) => 400,
            Error::UnsupportedMediaType(_) => 422,
            Error::MissingParent { .. } => 422,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Http`].
    pub fn http(
        endpoint: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Http {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
