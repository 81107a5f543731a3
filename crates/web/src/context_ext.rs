use async_trait::async_trait;
use micro_gemini::Context;
use micro_gemini::middleware::HandlerResult;

use crate::proxy::{ProxyOptions, proxy};
use crate::send::{SendOptions, send};

/// File serving and proxying as methods on [`Context`].
///
/// Also available on [`RouterContext`](crate::RouterContext) through deref.
#[async_trait]
pub trait ContextExt {
    /// Serves `options.path`, or the request path when unset.
    async fn send(&mut self, options: &SendOptions) -> HandlerResult;

    async fn proxy(&mut self, url: &str, options: &ProxyOptions) -> HandlerResult;
}

#[async_trait]
impl ContextExt for Context {
    async fn send(&mut self, options: &SendOptions) -> HandlerResult {
        let path = options.path.clone().unwrap_or_else(|| self.request().path().to_owned());
        send(self, &path, options).await
    }

    async fn proxy(&mut self, url: &str, options: &ProxyOptions) -> HandlerResult {
        proxy(self, url, options).await
    }
}
