//! The mutable gemini response that handlers populate.
//!
//! Serialization is pure: it validates the status and renders
//! `"<status> <meta>\r\n"` followed by the body, but only for success
//! statuses. A body set under any other status is dropped here, not earlier.

use bytes::{BufMut, Bytes, BytesMut};

use crate::ensure;
use crate::protocol::request::TERMINATOR;
use crate::protocol::status::{self, Status};
use crate::protocol::{GeminiError, ResponseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    meta: Option<String>,
    body: Option<Bytes>,
}

impl Default for Response {
    fn default() -> Self {
        Self { status: status::SUCCESS, meta: None, body: None }
    }
}

impl Response {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds the response a client sees for `error`.
    pub fn from_error(error: &GeminiError) -> Self {
        let meta = error.expose().then(|| error.message().to_owned());
        Self { status: error.status(), meta, body: None }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) -> &mut Self {
        self.status = status;
        self
    }

    /// The meta line as it will be sent: the explicit meta, or the default
    /// message of the current status.
    pub fn meta(&self) -> &str {
        self.meta.as_deref().unwrap_or_else(|| status::default_message(self.status))
    }

    pub fn set_meta<S: Into<String>>(&mut self, meta: S) -> &mut Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn set_body<B: Into<Bytes>>(&mut self, body: B) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn clear_body(&mut self) -> &mut Self {
        self.body = None;
        self
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        ensure!(status::is_valid(self.status), ResponseError::InvalidStatus(self.status));
        Ok(())
    }

    /// Appends the wire form of this response to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), ResponseError> {
        self.validate()?;

        let meta = self.meta();
        let body = self.body.as_ref().filter(|_| status::is_success(self.status));

        dst.reserve(2 + 1 + meta.len() + TERMINATOR.len() + body.map_or(0, Bytes::len));
        dst.put_slice(self.status.to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(meta.as_bytes());
        dst.put_slice(TERMINATOR.as_bytes());
        if let Some(body) = body {
            dst.put_slice(body);
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Bytes, ResponseError> {
        let mut dst = BytesMut::new();
        self.encode(&mut dst)?;
        Ok(dst.freeze())
    }
}
