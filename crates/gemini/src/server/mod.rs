//! Listening for gemini connections.
//!
//! [`Application`] owns the middleware chain and the listener lifecycle,
//! [`ListenOptions`] say where to listen and whether to use TLS.

mod application;
mod error;
mod options;
mod pipeline;
mod tls;

pub use application::{Application, State};
pub use error::ApplicationError;
pub use options::{DEFAULT_PORT, IntoListenOptions, ListenOptions, TlsOptions, Transport};
pub use pipeline::Pipeline;
