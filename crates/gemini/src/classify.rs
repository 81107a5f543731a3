//! Turns any failure raised while serving a request into a protocol-legal
//! [`GeminiError`].
//!
//! Classification happens exactly once per connection, at its outer
//! boundary. Failures that already carry a status are used verbatim;
//! everything else becomes a hidden `40` and is reported to the
//! [`ErrorSink`].

use std::any::Any;
use std::fmt;

use tracing::error;

use crate::protocol::{BoxError, GeminiError, ParseError, ResponseError, status};

/// Placeholder reported for failures that carry no message of their own.
pub const APPLICATION_ERROR: &str = "Application Error";

/// Receives the server-side description of unclassified failures.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, message: &str) {
        error!(cause = %message, "unhandled application error");
    }
}

/// Anything that can abort a request.
pub enum Failure {
    /// An error returned by framing, a handler or serialization.
    Error(BoxError),
    /// A handler panicked, the payload is not assumed to be an error.
    Panic(Box<dyn Any + Send>),
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Failure::Panic(_) => f.debug_tuple("Panic").finish(),
        }
    }
}

impl Failure {
    pub fn error<E: Into<BoxError>>(e: E) -> Self {
        Failure::Error(e.into())
    }
}

impl From<BoxError> for Failure {
    fn from(e: BoxError) -> Self {
        Failure::Error(e)
    }
}

/// Maps `failure` to the error a client is allowed to see.
pub fn classify(failure: &Failure, sink: &dyn ErrorSink) -> GeminiError {
    let error = match failure {
        Failure::Error(error) => error,
        Failure::Panic(_) => {
            sink.report(APPLICATION_ERROR);
            return internal_error();
        }
    };

    if let Some(gemini_error) = error.downcast_ref::<GeminiError>() {
        if status::is_valid(gemini_error.status()) {
            return gemini_error.clone();
        }
        sink.report(&ResponseError::InvalidStatus(gemini_error.status()).to_string());
        return internal_error();
    }

    if let Some(gemini_error) = error.downcast_ref::<ParseError>().and_then(ParseError::to_gemini_error) {
        return gemini_error;
    }

    sink.report(&error.to_string());
    internal_error()
}

fn internal_error() -> GeminiError {
    GeminiError::new(status::TEMPORARY_FAILURE).hidden()
}
