//! Gemini request line decoder
//!
//! Accumulates bytes until the CRLF terminator shows up within the first
//! [`MAX_REQUEST_BYTES`] bytes, then parses the line into a [`Request`].
//!
//! # Example
//!
//! ```no_run
//! use micro_gemini::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("gemini://localhost/\r\n");
//! let request = decoder.decode(&mut buffer);
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, Request};

/// Maximum size of a request line: a 1024 byte url plus CRLF, with room for
/// one extra byte clients commonly send.
pub const MAX_REQUEST_BYTES: usize = 1026;

const CRLF: &[u8; 2] = b"\r\n";

/// Frames exactly one request line.
///
/// Bytes following the terminator are discarded: a gemini connection carries
/// a single request.
#[derive(Debug, Clone)]
pub struct RequestDecoder {
    max_size: usize,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { max_size: MAX_REQUEST_BYTES }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// # Returns
    ///
    /// - `Ok(Some(request))`: a full request line was received
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the line is too large or is not an absolute url
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let window = src.len().min(self.max_size);

        let Some(index) = src[..window].windows(CRLF.len()).position(|w| w == CRLF) else {
            ensure!(src.len() < self.max_size, ParseError::too_large(self.max_size));
            return Ok(None);
        };

        let line = src.split_to(index + CRLF.len());
        if !src.is_empty() {
            trace!(excess = src.len(), "discard bytes after the request line");
            src.clear();
        }

        let raw = std::str::from_utf8(&line).map_err(ParseError::invalid_url)?;
        Request::parse(raw).map(Some)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(request) => Ok(Some(request)),
            None => Err(ParseError::ConnectionClosed),
        }
    }
}
