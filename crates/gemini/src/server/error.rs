use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("there is no middleware to process requests")]
    NoMiddleware,

    #[error("invalid address passed: \"{0}\"")]
    InvalidAddress(String),

    #[error("middleware can only be registered before listening")]
    NotIdle,

    #[error("application is already listening")]
    AlreadyListening,

    #[error("application has been closed")]
    Closed,

    #[error("tls configuration error: {reason}")]
    Tls { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ApplicationError {
    pub fn invalid_address<S: ToString>(str: S) -> Self {
        Self::InvalidAddress(str.to_string())
    }

    pub fn tls<S: ToString>(str: S) -> Self {
        Self::Tls { reason: str.to_string() }
    }
}
