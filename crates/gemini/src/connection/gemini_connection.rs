use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace};

use crate::classify::Failure;
use crate::codec::{MAX_REQUEST_BYTES, RequestDecoder, ResponseEncoder};
use crate::protocol::{ParseError, Request, SendError};
use crate::server::Pipeline;

/// A single-shot gemini connection.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct GeminiConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> GeminiConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), MAX_REQUEST_BYTES),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Reads the request, answers it and closes the connection.
    ///
    /// Framing failures skip the middleware entirely and are answered with
    /// their classified status. The only error returned is a failure to
    /// write the response.
    pub async fn process(mut self, pipeline: &Pipeline) -> Result<(), SendError> {
        let response = match self.read_request().await {
            Ok(request) => {
                trace!(url = %request.url(), "receive request");
                pipeline.respond(request).await
            }
            Err(e) => {
                debug!(cause = %e, "can't receive request");
                pipeline.respond_to_failure(Failure::error(e))
            }
        };

        trace!(status = response.status(), "send response");
        self.framed_write.send(response).await?;
        self.framed_write.close().await?;
        Ok(())
    }

    async fn read_request(&mut self) -> Result<Request, ParseError> {
        self.framed_read.next().await.unwrap_or(Err(ParseError::ConnectionClosed))
    }
}
