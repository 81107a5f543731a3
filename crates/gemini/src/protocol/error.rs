use std::error::Error;
use std::io;
use thiserror::Error;

use crate::protocol::status::{self, Status};

/// The error type handlers return.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A failure that maps to a specific gemini status.
///
/// When `expose` is set the message is sent to the client as the response
/// meta, otherwise the client only sees the default message of `status`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GeminiError {
    status: Status,
    message: String,
    expose: bool,
}

impl GeminiError {
    /// An exposed error carrying the default message of `status`.
    pub fn new(status: Status) -> Self {
        Self { status, message: status::default_message(status).to_owned(), expose: true }
    }

    pub fn with_message<S: Into<String>>(status: Status, message: S) -> Self {
        Self { status, message: message.into(), expose: true }
    }

    /// Keeps the message server side.
    pub fn hidden(mut self) -> Self {
        self.expose = false;
        self
    }

    pub fn not_found() -> Self {
        Self::new(status::NOT_FOUND)
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::with_message(status::BAD_REQUEST, message)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn expose(&self) -> bool {
        self.expose
    }
}

/// Failures while framing the request line off a connection.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("request line too large, exceed the limit {max_size}")]
    TooLarge { max_size: usize },

    #[error("client prematurely closed the connection")]
    ConnectionClosed,

    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large(max_size: usize) -> Self {
        Self::TooLarge { max_size }
    }

    pub fn invalid_url<S: ToString>(str: S) -> Self {
        Self::InvalidUrl { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The protocol error a client should see, if this failure is the client's fault.
    pub fn to_gemini_error(&self) -> Option<GeminiError> {
        match self {
            Self::TooLarge { .. } => Some(GeminiError::bad_request("URL Too Long")),
            Self::InvalidUrl { .. } => Some(GeminiError::bad_request("Invalid URL")),
            Self::ConnectionClosed | Self::Io { .. } => None,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    #[error("invalid response status: {0}")]
    InvalidStatus(Status),
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("response error: {source}")]
    Response {
        #[from]
        source: ResponseError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
