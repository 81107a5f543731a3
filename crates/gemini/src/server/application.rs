use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::classify::{ErrorSink, TracingSink};
use crate::connection::GeminiConnection;
use crate::context::Context;
use crate::ensure;
use crate::middleware::{Middleware, compose};
use crate::protocol::{BoxError, Request, Response, SendError};
use crate::server::{ApplicationError, IntoListenOptions, Pipeline, Transport, tls};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Listening,
    Closed,
}

#[derive(Debug)]
struct Lifecycle {
    state: State,
    local_addr: Option<SocketAddr>,
}

/// A gemini server: an ordered middleware list plus the listener that
/// feeds it.
///
/// Middleware can only be registered while the application is idle. Once
/// [`listen`](Self::listen) starts, the chain is fixed; once
/// [`close`](Self::close) is called the application cannot be restarted.
///
/// # Example
///
/// ```no_run
/// use micro_gemini::middleware::middleware_fn;
/// use micro_gemini::server::Application;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut app = Application::new();
/// app.register(middleware_fn(|ctx, _next| {
///     Box::pin(async move {
///         ctx.response_mut().set_body("Hello World!");
///         Ok(())
///     })
/// }))?;
/// app.listen("127.0.0.1:1965").await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    middleware: Vec<Arc<dyn Middleware>>,
    sink: Arc<dyn ErrorSink>,
    lifecycle: Mutex<Lifecycle>,
    shutdown: CancellationToken,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Reports unclassified failures to `sink` instead of the log.
    pub fn with_sink(sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            middleware: Vec::new(),
            sink,
            lifecycle: Mutex::new(Lifecycle { state: State::Idle, local_addr: None }),
            shutdown: CancellationToken::new(),
        }
    }

    /// Appends `middleware` to the chain.
    pub fn register<M: Middleware + 'static>(&mut self, middleware: M) -> Result<&mut Self, ApplicationError> {
        self.register_shared(Arc::new(middleware))
    }

    pub fn register_shared(&mut self, middleware: Arc<dyn Middleware>) -> Result<&mut Self, ApplicationError> {
        ensure!(self.state() == State::Idle, ApplicationError::NotIdle);
        self.middleware.push(middleware);
        Ok(self)
    }

    pub fn state(&self) -> State {
        self.lifecycle().state
    }

    /// The bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle().local_addr
    }

    /// Binds and serves connections until [`close`](Self::close) is called
    /// or the options' signal is cancelled.
    ///
    /// Fails with [`ApplicationError::NoMiddleware`] when nothing was
    /// registered. Each accepted connection is served on its own task.
    pub async fn listen<O: IntoListenOptions>(&self, options: O) -> Result<(), ApplicationError> {
        ensure!(!self.middleware.is_empty(), ApplicationError::NoMiddleware);
        let options = options.into_listen_options()?;

        {
            let mut lifecycle = self.lifecycle();
            match lifecycle.state {
                State::Idle => lifecycle.state = State::Listening,
                State::Listening => return Err(ApplicationError::AlreadyListening),
                State::Closed => return Err(ApplicationError::Closed),
            }
        }

        let (tcp_listener, acceptor) = match self.bind(&options.bind_address(), &options.transport).await {
            Ok(bound) => bound,
            Err(e) => {
                error!(cause = %e, "bind server error");
                self.back_to_idle();
                return Err(e);
            }
        };

        let local_addr = match tcp_listener.local_addr() {
            Ok(local_addr) => local_addr,
            Err(e) => {
                error!(cause = %e, "read listener address error");
                self.back_to_idle();
                return Err(e.into());
            }
        };
        self.lifecycle().local_addr = Some(local_addr);
        info!(address = %local_addr, secure = acceptor.is_some(), "start listening");

        let pipeline = Arc::new(Pipeline::new(compose(self.middleware.clone()), Arc::clone(&self.sink)));
        let signal = options.signal.unwrap_or_default();

        loop {
            let (tcp_stream, remote_addr) = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = signal.cancelled() => {
                    self.close();
                    break;
                }
                accepted = tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let pipeline = Arc::clone(&pipeline);
            let acceptor = acceptor.clone();

            tokio::spawn(async move {
                let result = match acceptor {
                    None => serve(tcp_stream, &pipeline).await,
                    Some(acceptor) => match acceptor.accept(tcp_stream).await {
                        Ok(tls_stream) => serve(tls_stream, &pipeline).await,
                        Err(e) => {
                            debug!(cause = %e, remote = %remote_addr, "tls handshake failed");
                            return;
                        }
                    },
                };

                match result {
                    Ok(()) => trace!(remote = %remote_addr, "finished process, connection shutdown"),
                    Err(e) => warn!(cause = %e, remote = %remote_addr, "failed to send response"),
                }
            });
        }

        self.lifecycle().local_addr = None;
        info!(address = %local_addr, "stop listening");
        Ok(())
    }

    async fn bind(
        &self,
        address: &str,
        transport: &Transport,
    ) -> Result<(TcpListener, Option<TlsAcceptor>), ApplicationError> {
        let acceptor = match transport {
            Transport::Plain => None,
            Transport::Tls(tls_options) => Some(tls::acceptor(tls_options)?),
        };
        let tcp_listener = TcpListener::bind(address).await?;
        Ok((tcp_listener, acceptor))
    }

    /// Stops accepting connections and releases the listening socket.
    ///
    /// Connections already accepted are left to finish. Closing is final,
    /// and closing twice is a no-op.
    pub fn close(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state != State::Closed {
            info!("closing application");
        }
        lifecycle.state = State::Closed;
        lifecycle.local_addr = None;
        self.shutdown.cancel();
    }

    /// Runs the chain for `url` without any networking.
    ///
    /// Failures are returned as raised by the middleware, they are not
    /// classified into a response.
    pub async fn handle(&self, url: &str) -> Result<Response, BoxError> {
        let mut ctx = Context::new(Request::parse(url)?);
        compose(self.middleware.clone()).run(&mut ctx, None).await?;
        Ok(ctx.into_response())
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Undoes the `Idle -> Listening` transition of a `listen` that failed
    /// before accepting, unless `close` won in the meantime.
    fn back_to_idle(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state == State::Listening {
            lifecycle.state = State::Idle;
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("middleware", &self.middleware.len())
            .field("lifecycle", &*self.lifecycle())
            .finish_non_exhaustive()
    }
}

async fn serve<S>(stream: S, pipeline: &Pipeline) -> Result<(), SendError>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, writer) = tokio::io::split(stream);
    GeminiConnection::new(reader, writer).process(pipeline).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use crate::protocol::GeminiError;

    fn hello() -> impl Middleware {
        middleware_fn(|ctx, _next| {
            Box::pin(async move {
                ctx.response_mut().set_body("Hello World!");
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn listen_without_middleware_fails() {
        let app = Application::new();

        let error = app.listen("127.0.0.1:0").await.unwrap_err();

        assert!(matches!(error, ApplicationError::NoMiddleware));
        assert_eq!(app.state(), State::Idle);
    }

    #[tokio::test]
    async fn listen_rejects_malformed_addresses() {
        let mut app = Application::new();
        app.register(hello()).unwrap();

        let error = app.listen("localhost").await.unwrap_err();

        assert!(matches!(error, ApplicationError::InvalidAddress(_)));
        assert_eq!(app.state(), State::Idle);
    }

    #[tokio::test]
    async fn failed_bind_returns_to_idle() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();
        let mut app = Application::new();
        app.register(hello()).unwrap();

        let error = app.listen(format!("127.0.0.1:{port}")).await.unwrap_err();

        assert!(matches!(error, ApplicationError::Io { .. }));
        assert_eq!(app.state(), State::Idle);
        assert_eq!(app.local_addr(), None);
        app.register(hello()).unwrap();
    }

    #[tokio::test]
    async fn closed_application_cannot_listen() {
        let mut app = Application::new();
        app.register(hello()).unwrap();
        app.close();
        app.close();

        assert_eq!(app.state(), State::Closed);
        assert!(matches!(app.listen("127.0.0.1:0").await, Err(ApplicationError::Closed)));
        assert!(matches!(app.register(hello()), Err(ApplicationError::NotIdle)));
    }

    #[tokio::test]
    async fn handle_runs_the_chain_without_networking() {
        let mut app = Application::new();
        app.register(hello()).unwrap();

        let response = app.handle("gemini://localhost/").await.unwrap();

        assert_eq!(response.status(), 20);
        assert_eq!(response.body().map(|b| &b[..]), Some(&b"Hello World!"[..]));
    }

    #[tokio::test]
    async fn handle_returns_the_populated_response() {
        let mut app = Application::new();
        app.register(middleware_fn(|ctx, _next| {
            Box::pin(async move {
                ctx.response_mut().set_body("Hello world").set_meta("text/gemini; lang=en").set_status(20);
                Ok(())
            })
        }))
        .unwrap();

        let response = app.handle("gemini://example.com/test").await.unwrap();

        assert_eq!(response.status(), 20);
        assert_eq!(response.meta(), "text/gemini; lang=en");
        assert_eq!(response.body().map(|b| &b[..]), Some(&b"Hello world"[..]));
    }

    #[tokio::test]
    async fn handle_propagates_unclassified_errors() {
        let mut app = Application::new();
        app.register(middleware_fn(|_ctx, _next| {
            Box::pin(async move { Err(GeminiError::with_message(41, "An Error!").into()) })
        }))
        .unwrap();

        let error = app.handle("gemini://localhost/").await.unwrap_err();

        assert_eq!(error.downcast_ref::<GeminiError>().map(GeminiError::status), Some(41));
    }

    #[tokio::test]
    async fn handle_rejects_relative_urls() {
        let mut app = Application::new();
        app.register(hello()).unwrap();

        assert!(app.handle("/relative").await.is_err());
    }
}
