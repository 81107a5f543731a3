//! Request handlers and their composition.
//!
//! Every handler implements [`Middleware`]: it receives the [`Context`] and a
//! [`Next`] continuation. Code before `next.run(ctx).await` runs on the way
//! in, code after it runs on the way out, in reverse registration order.
//! Not calling `next` at all stops the chain at that handler.
//!
//! ```no_run
//! use micro_gemini::middleware::{middleware_fn, compose, Middleware};
//! use std::sync::Arc;
//!
//! let log = middleware_fn(|ctx, next| {
//!     Box::pin(async move {
//!         let path = ctx.request().path().to_owned();
//!         next.run(ctx).await?;
//!         tracing::info!(path, status = ctx.response().status(), "served");
//!         Ok(())
//!     })
//! });
//!
//! let hello = middleware_fn(|ctx, _next| {
//!     Box::pin(async move {
//!         ctx.response_mut().set_body("Hello world!");
//!         Ok(())
//!     })
//! });
//!
//! let chain = compose(vec![Arc::new(log) as Arc<dyn Middleware>, Arc::new(hello)]);
//! ```

mod compose;

pub use compose::Chain;
pub use compose::Next;
pub use compose::NextError;
pub use compose::compose;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::protocol::BoxError;

pub type HandlerResult = Result<(), BoxError>;

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult;
}

#[derive(Debug)]
pub struct FnMiddleware<F> {
    f: F,
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        (self.f)(ctx, next).await
    }
}

/// Turns a closure returning a boxed future into a [`Middleware`].
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    FnMiddleware { f }
}
