//! Routing, static files and proxying for `micro-gemini`.
//!
//! Everything here plugs into the engine's middleware chain:
//!
//! - [`Router`]: dispatches requests to [`RouteHandler`]s by path pattern
//! - [`send()`]: answers with a file below a root directory
//! - [`proxy()`]: answers with the response of another gemini server
//! - [`ContextExt`]: `send` and `proxy` as methods on the context
//!
//! ```no_run
//! use micro_gemini::server::Application;
//! use micro_gemini_web::{route_fn, Router, RouterOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new(RouterOptions::with_url_prefix("gemini://localhost"));
//! router.on("/api/:name", route_fn(|mut ctx| {
//!     Box::pin(async move {
//!         let greeting = format!("Hello {}!", ctx.param("name").unwrap_or_default());
//!         ctx.response_mut().set_body(greeting);
//!         Ok(())
//!     })
//! }))?;
//!
//! let mut app = Application::new();
//! app.register(router)?;
//! app.listen(":1965").await?;
//! # Ok(())
//! # }
//! ```

mod context_ext;
mod handler;
mod request;

pub mod proxy;
pub mod router;
pub mod send;

pub use context_ext::ContextExt;
pub use handler::FnRouteHandler;
pub use handler::RouteHandler;
pub use handler::route_fn;
pub use proxy::{ProxyOptions, proxy};
pub use request::PathParams;
pub use request::RouterContext;
pub use router::{Router, RouterOptions};
pub use send::{SendOptions, send};
