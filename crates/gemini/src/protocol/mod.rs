//! Core gemini protocol types.
//!
//! - [`Request`]: the parsed request line, immutable once built
//! - [`Response`]: the mutable status/meta/body record handlers fill in
//! - [`status`]: status codes, [`StatusClass`] and the default message table
//! - errors: [`GeminiError`] for handlers, [`ParseError`] for framing,
//!   [`ResponseError`] for validation and [`SendError`] for writing

mod request;
pub use request::Request;

mod response;
pub use response::Response;

pub mod status;
pub use status::Status;
pub use status::StatusClass;

mod error;
pub use error::BoxError;
pub use error::GeminiError;
pub use error::ParseError;
pub use error::ResponseError;
pub use error::SendError;
