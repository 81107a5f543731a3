//! Gemini codec module for framing requests and writing responses
//!
//! Both halves plug into `tokio_util::codec`:
//!
//! - [`RequestDecoder`]: frames the single CRLF terminated request line,
//!   bounded by [`MAX_REQUEST_BYTES`]
//! - [`ResponseEncoder`]: validates and writes a [`Response`](crate::protocol::Response)
//!
//! # Example
//!
//! ```no_run
//! use micro_gemini::codec::{RequestDecoder, ResponseEncoder};
//! use micro_gemini::protocol::Response;
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::from("gemini://localhost/\r\n");
//! let request = decoder.decode(&mut request_buffer);
//!
//! let mut encoder = ResponseEncoder::new();
//! let mut response_buffer = BytesMut::new();
//! encoder.encode(Response::new(), &mut response_buffer).unwrap();
//! ```

mod request_decoder;
mod response_encoder;

pub use request_decoder::MAX_REQUEST_BYTES;
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
