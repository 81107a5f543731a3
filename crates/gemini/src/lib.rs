//! An asynchronous micro gemini server implementation
//!
//! This crate provides a small gemini server built on top of tokio. A request
//! is a single URL line, a response is a status, a meta line and, for
//! successful requests, a body; every connection carries exactly one of each.
//! Request handling is a chain of onion-model middleware sharing one
//! [`Context`].
//!
//! # Features
//!
//! - Request line framing with the protocol's 1024 byte URL limit
//! - Middleware composition with before and after logic
//! - Central error classification into protocol-legal statuses
//! - Plain TCP or TLS listeners, closable at any time
//!
//! # Example
//!
//! ```no_run
//! use micro_gemini::middleware::middleware_fn;
//! use micro_gemini::protocol::GeminiError;
//! use micro_gemini::server::Application;
//! use tracing::{Level, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber)?;
//!
//!     let mut app = Application::new();
//!     app.register(middleware_fn(|ctx, next| {
//!         Box::pin(async move {
//!             next.run(ctx).await?;
//!             info!(url = %ctx.request().url(), status = ctx.response().status(), "served");
//!             Ok(())
//!         })
//!     }))?;
//!     app.register(middleware_fn(|ctx, _next| {
//!         Box::pin(async move {
//!             if ctx.request().path() != "/" {
//!                 return Err(GeminiError::not_found().into());
//!             }
//!             ctx.response_mut().set_meta("text/gemini; lang=en").set_body("# Hello World!\n");
//!             Ok(())
//!         })
//!     }))?;
//!
//!     app.listen(":1965").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: requests, responses, statuses and errors
//! - [`codec`]: framing of the request line and encoding of the response
//! - [`middleware`]: the handler trait and its composition
//! - [`connection`]: driving a single connection from request to close
//! - [`server`]: the application, its listener and lifecycle
//!
//! # Error Handling
//!
//! Handlers return [`protocol::BoxError`]. A [`protocol::GeminiError`] picks
//! the response status, and its message is only sent when it is exposed.
//! Any other error, or a panic, is answered with a generic `40` and reported
//! to the application's [`classify::ErrorSink`].

pub mod classify;
pub mod codec;
pub mod connection;
pub mod middleware;
pub mod protocol;
pub mod server;

mod context;
pub use context::Context;

mod utils;
pub(crate) use utils::ensure;
