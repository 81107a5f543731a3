use async_trait::async_trait;
use futures::future::BoxFuture;
use micro_gemini::middleware::HandlerResult;

use crate::RouterContext;

/// Handles a request matched by the [`Router`](crate::Router).
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn call(&self, ctx: RouterContext<'_>) -> HandlerResult;
}

/// a closure holder which represents any boxed-future returning route handler
#[derive(Debug)]
pub struct FnRouteHandler<F> {
    f: F,
}

pub fn route_fn<F>(f: F) -> FnRouteHandler<F>
where
    F: for<'c> Fn(RouterContext<'c>) -> BoxFuture<'c, HandlerResult> + Send + Sync,
{
    FnRouteHandler { f }
}

#[async_trait]
impl<F> RouteHandler for FnRouteHandler<F>
where
    F: for<'c> Fn(RouterContext<'c>) -> BoxFuture<'c, HandlerResult> + Send + Sync,
{
    async fn call(&self, ctx: RouterContext<'_>) -> HandlerResult {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_route_handler<T: RouteHandler>(_handler: &T) {
        // no op
    }

    #[test]
    fn closure_is_route_handler() {
        let handler = route_fn(|mut ctx| {
            Box::pin(async move {
                let name = ctx.param("name").unwrap_or("world").to_owned();
                ctx.response_mut().set_body(format!("Hello {name}!"));
                Ok(())
            })
        });
        assert_is_route_handler(&handler);
    }
}
