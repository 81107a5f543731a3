use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::{Response, SendError};

/// Writes a [`Response`] in its wire form.
///
/// The status is validated before anything reaches `dst`, so an invalid
/// response leaves the buffer untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst).map_err(|e| {
            error!(cause = %e, "refuse to encode response");
            SendError::from(e)
        })
    }
}
