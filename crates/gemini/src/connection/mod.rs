//! Gemini connection handling module
//!
//! A gemini connection carries exactly one request. [`GeminiConnection`]
//! drives it from start to end:
//!
//! - frames the request line with [`RequestDecoder`](crate::codec::RequestDecoder)
//! - runs the [`Pipeline`](crate::server::Pipeline) to obtain a response
//! - writes the response with [`ResponseEncoder`](crate::codec::ResponseEncoder)
//! - shuts the write half down, closing the connection

mod gemini_connection;

pub use gemini_connection::GeminiConnection;
