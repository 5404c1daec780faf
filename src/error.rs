//! Error types
//!
//! Every failure the Kanidm client can produce is a variant of [`Error`].
//! Callers match on [`Error::kind`] rather than on the concrete variant so
//! that operation context added on the way up does not hide the cause.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Kanidm client and the resource lifecycle helpers
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP 404
    #[error("resource not found")]
    NotFound,

    /// HTTP 401
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 403
    #[error("forbidden")]
    Forbidden,

    /// Any other non-2xx status, with the response body if the server sent one
    #[error("API error (HTTP {status}){}", body_suffix(.body))]
    Api { status: u16, body: String },

    /// The request could not be built, sent, or its body read
    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("marshal request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Context added by an operation before the error is handed back up
    #[error("{operation}: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// The remote resource exists, but a follow-up step (token mint, secret
    /// fetch, read back) failed. The caller decides whether that is fatal.
    #[error("{resource} '{id}' was created but {step} failed: {source}")]
    Incomplete {
        resource: &'static str,
        id: String,
        step: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// An OAuth2 client was expected to be confidential but is public
    #[error("expected OAuth2 basic (confidential) client '{name}' but found a public client")]
    UnexpectedClientKind { name: String },
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Forbidden,
    Http,
    Transport,
    Encode,
    Decode,
    Config,
    Incomplete,
    UnexpectedClientKind,
}

impl Error {
    /// Wrap this error with the name of the operation that produced it
    pub fn context(self, operation: &'static str) -> Self {
        Error::Operation {
            operation,
            source: Box::new(self),
        }
    }

    /// Mark this error as having happened after `resource` `id` was created
    pub fn incomplete(self, resource: &'static str, id: &str, step: &'static str) -> Self {
        Error::Incomplete {
            resource,
            id: id.to_string(),
            step,
            source: Box::new(self),
        }
    }

    /// Kind of this error, looking through [`Error::Operation`] wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound => ErrorKind::NotFound,
            Error::Unauthorized => ErrorKind::Unauthorized,
            Error::Forbidden => ErrorKind::Forbidden,
            Error::Api { .. } => ErrorKind::Http,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Encode(_) => ErrorKind::Encode,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Config(_) => ErrorKind::Config,
            Error::Operation { source, .. } => source.kind(),
            Error::Incomplete { .. } => ErrorKind::Incomplete,
            Error::UnexpectedClientKind { .. } => ErrorKind::UnexpectedClientKind,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Innermost error, looking through both operation context and
    /// [`Error::Incomplete`]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Operation { source, .. } | Error::Incomplete { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}
