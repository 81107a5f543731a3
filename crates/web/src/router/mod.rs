//! Path based routing on top of the middleware chain.
//!
//! Routes are registered with [`Router::on`]. Patterns use `/` separated
//! segments where `:name` (or `{name}`) captures one segment and `{*name}`
//! captures the rest of the path.
//!
//! Unlike most routers, every matching route runs, in registration order,
//! unless [`RouterOptions::first_match_only`] is set. Requests that match
//! no route fall through to the next middleware.

mod pattern;

use async_trait::async_trait;
use micro_gemini::Context;
use micro_gemini::middleware::{HandlerResult, Middleware, Next};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

use crate::handler::RouteHandler;
use crate::{PathParams, RouterContext};

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Only requests whose raw line starts with this prefix are routed.
    pub url_prefix: String,
    /// Prepended to every registered route.
    pub prefix: String,
    pub first_match_only: bool,
}

impl RouterOptions {
    pub fn with_url_prefix<S: Into<String>>(url_prefix: S) -> Self {
        Self { url_prefix: url_prefix.into(), ..Default::default() }
    }
}

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("invalid route '{route}': {source}")]
    InvalidRoute {
        route: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// Main router structure that dispatches gemini requests to route handlers
pub struct Router {
    options: RouterOptions,
    routes: Vec<Route>,
}

/// A registered route with its own matcher, so overlapping patterns can all
/// match the same path.
struct Route {
    pattern: String,
    matcher: matchit::Router<()>,
    handler: Box<dyn RouteHandler>,
}

impl Route {
    fn matches(&self, path: &str) -> Option<PathParams> {
        self.matcher.at(path).ok().map(|matched| matched.params.into())
    }
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        Self { options, routes: Vec::new() }
    }

    pub fn url_prefix(&self) -> &str {
        &self.options.url_prefix
    }

    pub fn prefix(&self) -> &str {
        &self.options.prefix
    }

    /// Registers `handler` for `prefix + route`.
    pub fn on<H: RouteHandler + 'static>(&mut self, route: &str, handler: H) -> Result<&mut Self, RouterError> {
        let pattern = pattern::translate(&format!("{}{}", self.options.prefix, route));

        let mut matcher = matchit::Router::new();
        matcher
            .insert(pattern.as_str(), ())
            .map_err(|source| RouterError::InvalidRoute { route: route.to_owned(), source })?;

        self.routes.push(Route { pattern, matcher, handler: Box::new(handler) });
        Ok(self)
    }

    /// The router as middleware, ready for
    /// [`Application::register_shared`](micro_gemini::server::Application::register_shared).
    pub fn routes(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns = self.routes.iter().map(|route| route.pattern.as_str()).collect::<Vec<_>>();
        f.debug_struct("Router").field("options", &self.options).field("routes", &patterns).finish()
    }
}

#[async_trait]
impl Middleware for Router {
    async fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        if !ctx.request().raw().starts_with(&self.options.url_prefix) {
            return next.run(ctx).await;
        }

        let path = ctx.request().path().to_owned();
        let mut matched = false;
        for route in &self.routes {
            let Some(params) = route.matches(&path) else {
                continue;
            };
            trace!(route = %route.pattern, path, "route matched");
            matched = true;
            route.handler.call(RouterContext::new(ctx, params)).await?;
            if self.options.first_match_only {
                break;
            }
        }

        if matched { Ok(()) } else { next.run(ctx).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_fn;
    use micro_gemini::middleware::{compose, middleware_fn};
    use micro_gemini::protocol::{GeminiError, Request};
    use std::sync::Mutex;

    type Seen = Arc<Mutex<Vec<String>>>;

    fn context(url: &str) -> Context {
        Context::new(Request::parse(url).unwrap())
    }

    fn record(seen: &Seen, label: &'static str) -> impl RouteHandler + use<> {
        let seen = Arc::clone(seen);
        route_fn(move |ctx| {
            let seen = Arc::clone(&seen);
            Box::pin(async move {
                let params = ctx.params().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",");
                seen.lock().unwrap().push(format!("{label}[{params}]"));
                Ok(())
            })
        })
    }

    fn seen(seen: &Seen) -> Vec<String> {
        seen.lock().unwrap().clone()
    }

    async fn run(router: Router, ctx: &mut Context) -> HandlerResult {
        let fallback = middleware_fn(|ctx, _next| {
            Box::pin(async move {
                ctx.response_mut().set_body("fallback");
                Ok(())
            })
        });
        compose(vec![router.routes(), Arc::new(fallback)]).run(ctx, None).await
    }

    fn body(ctx: &Context) -> Option<&[u8]> {
        ctx.response().body().map(|b| &b[..])
    }

    #[tokio::test]
    async fn named_segments_are_captured() {
        let calls = Seen::default();
        let mut router = Router::new(RouterOptions::with_url_prefix("gemini://localhost"));
        router.on("/api/:name", record(&calls, "api")).unwrap();

        run(router, &mut context("gemini://localhost/api/j%C3%B6rg")).await.unwrap();

        assert_eq!(seen(&calls), vec!["api[name=jörg]"]);
    }

    #[tokio::test]
    async fn every_matching_route_runs_in_order() {
        let calls = Seen::default();
        let mut router = Router::new(RouterOptions::default());
        router
            .on("/api/:name", record(&calls, "param"))
            .unwrap()
            .on("/api/special", record(&calls, "static"))
            .unwrap()
            .on("/other", record(&calls, "other"))
            .unwrap();

        run(router, &mut context("gemini://localhost/api/special")).await.unwrap();

        // both overlapping routes run; most routers would stop at the first,
        // which is what `first_match_only` opts into
        assert_eq!(seen(&calls), vec!["param[name=special]", "static[]"]);
    }

    #[tokio::test]
    async fn first_match_only_stops_after_one_route() {
        let calls = Seen::default();
        let options = RouterOptions { first_match_only: true, ..Default::default() };
        let mut router = Router::new(options);
        router.on("/api/:name", record(&calls, "param")).unwrap().on("/api/special", record(&calls, "static")).unwrap();

        run(router, &mut context("gemini://localhost/api/special")).await.unwrap();

        assert_eq!(seen(&calls), vec!["param[name=special]"]);
    }

    #[tokio::test]
    async fn prefix_is_prepended_to_routes() {
        let calls = Seen::default();
        let options = RouterOptions { prefix: "/v1".into(), ..Default::default() };
        let mut router = Router::new(options);
        router.on("/users/{id}", record(&calls, "user")).unwrap();
        assert_eq!(router.prefix(), "/v1");

        let mut ctx = context("gemini://localhost/users/1");
        run(router, &mut ctx).await.unwrap();
        assert!(seen(&calls).is_empty());
        assert_eq!(body(&ctx), Some(&b"fallback"[..]));
    }

    #[tokio::test]
    async fn unmatched_requests_fall_through() {
        let calls = Seen::default();
        let mut router = Router::new(RouterOptions::default());
        router.on("/hello", record(&calls, "hello")).unwrap();

        let mut ctx = context("gemini://localhost/nope");
        run(router, &mut ctx).await.unwrap();

        assert!(seen(&calls).is_empty());
        assert_eq!(body(&ctx), Some(&b"fallback"[..]));
    }

    #[tokio::test]
    async fn url_prefix_mismatch_falls_through() {
        let calls = Seen::default();
        let mut router = Router::new(RouterOptions::with_url_prefix("gemini://localhost"));
        router.on("/", record(&calls, "root")).unwrap();

        let mut ctx = context("gemini://example.com/");
        run(router, &mut ctx).await.unwrap();

        assert!(seen(&calls).is_empty());
        assert_eq!(body(&ctx), Some(&b"fallback"[..]));
    }

    #[tokio::test]
    async fn matched_routes_do_not_reach_next() {
        let mut router = Router::new(RouterOptions::default());
        router
            .on(
                "/",
                route_fn(|mut ctx| {
                    Box::pin(async move {
                        ctx.response_mut().set_body("Hello World!");
                        Ok(())
                    })
                }),
            )
            .unwrap();

        let mut ctx = context("gemini://localhost");
        run(router, &mut ctx).await.unwrap();

        assert_eq!(body(&ctx), Some(&b"Hello World!"[..]));
    }

    #[tokio::test]
    async fn route_errors_propagate() {
        let mut router = Router::new(RouterOptions::default());
        router
            .on("/gone", route_fn(|_ctx| Box::pin(async { Err(GeminiError::new(52).into()) })))
            .unwrap();

        let error = run(router, &mut context("gemini://localhost/gone")).await.unwrap_err();

        assert_eq!(error.downcast_ref::<GeminiError>().map(GeminiError::status), Some(52));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let mut router = Router::new(RouterOptions::default());
        let result = router.on("/{*rest}/more", route_fn(|_ctx| Box::pin(async { Ok(()) })));
        assert!(matches!(result, Err(RouterError::InvalidRoute { .. })));
    }
}
