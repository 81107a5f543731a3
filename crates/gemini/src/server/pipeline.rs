use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::debug;

use crate::classify::{ErrorSink, Failure, classify};
use crate::context::Context;
use crate::middleware::Chain;
use crate::protocol::{Request, Response};

/// Turns a request into the response written back, whatever happens in
/// between.
#[derive(Clone)]
pub struct Pipeline {
    chain: Chain,
    sink: Arc<dyn ErrorSink>,
}

impl Pipeline {
    pub fn new(chain: Chain, sink: Arc<dyn ErrorSink>) -> Self {
        Self { chain, sink }
    }

    /// Runs the chain over a fresh context.
    ///
    /// A handler error, a panic or a response with an out of range status
    /// all replace the response with the classified failure.
    pub async fn respond(&self, request: Request) -> Response {
        let mut ctx = Context::new(request);

        let outcome = AssertUnwindSafe(self.chain.run(&mut ctx, None)).catch_unwind().await;
        let failure = match outcome {
            Ok(Ok(())) => match ctx.response().validate() {
                Ok(()) => return ctx.into_response(),
                Err(e) => Failure::error(e),
            },
            Ok(Err(e)) => Failure::Error(e),
            Err(panic) => Failure::Panic(panic),
        };

        debug!(failure = ?failure, "request failed");
        self.respond_to_failure(failure)
    }

    pub fn respond_to_failure(&self, failure: Failure) -> Response {
        Response::from_error(&classify(&failure, self.sink.as_ref()))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("chain", &self.chain).finish_non_exhaustive()
    }
}
