//! Forwarding a request to another gemini server.
//!
//! The upstream response replaces the local one as is. Any failure on the
//! way, from connecting to parsing the reply, is answered with `43 Proxy
//! error`.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use micro_gemini::Context;
use micro_gemini::middleware::HandlerResult;
use micro_gemini::protocol::status::{self, Status};
use micro_gemini::protocol::{GeminiError, Response};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, InvalidDnsNameError, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use url::Url;

/// Upper bound for an upstream response, header and body together.
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProxyOptions {
    /// Follow `3x` redirects instead of handing them to the client.
    pub follow_redirects: bool,
    pub max_redirects: usize,
    /// Connect with TLS.
    pub secure: bool,
    /// Overrides the port of the target url.
    pub port: Option<u16>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self { follow_redirects: false, max_redirects: 5, secure: true, port: None }
    }
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("invalid target url: {source}")]
    InvalidUrl {
        #[from]
        source: url::ParseError,
    },

    #[error("target url has no host: {0}")]
    MissingHost(Url),

    #[error("invalid server name: {source}")]
    ServerName {
        #[from]
        source: InvalidDnsNameError,
    },

    #[error("tls error: {source}")]
    Tls {
        #[from]
        source: rustls::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("malformed upstream response: {reason}")]
    MalformedResponse { reason: String },

    #[error("too many redirects, exceed the limit {max_redirects}")]
    TooManyRedirects { max_redirects: usize },
}

impl ProxyError {
    fn malformed<S: ToString>(str: S) -> Self {
        Self::MalformedResponse { reason: str.to_string() }
    }
}

/// Replaces the response with the one `url` answers.
pub async fn proxy(ctx: &mut Context, url: &str, options: &ProxyOptions) -> HandlerResult {
    match fetch(url, options).await {
        Ok(response) => {
            *ctx.response_mut() = response;
            Ok(())
        }
        Err(e) => {
            warn!(cause = %e, url, "proxy request failed");
            Err(GeminiError::new(status::PROXY_ERROR).into())
        }
    }
}

/// Requests `url` upstream, following redirects when asked to.
pub async fn fetch(url: &str, options: &ProxyOptions) -> Result<Response, ProxyError> {
    let mut target = Url::parse(url)?;
    let mut redirects = 0;

    loop {
        let response = request_once(&target, options).await?;
        if !(options.follow_redirects && status::is_redirect(response.status())) {
            return Ok(response);
        }
        if redirects == options.max_redirects {
            return Err(ProxyError::TooManyRedirects { max_redirects: options.max_redirects });
        }
        redirects += 1;
        target = target.join(response.meta())?;
        debug!(%target, redirects, "follow redirect");
    }
}

async fn request_once(target: &Url, options: &ProxyOptions) -> Result<Response, ProxyError> {
    let host = target.host_str().ok_or_else(|| ProxyError::MissingHost(target.clone()))?;
    let port = options.port.or(target.port()).unwrap_or(micro_gemini::server::DEFAULT_PORT);
    let stream = TcpStream::connect((host, port)).await?;

    let raw = if options.secure {
        let server_name = ServerName::try_from(host.trim_start_matches('[').trim_end_matches(']').to_owned())?;
        let stream = connector()?.connect(server_name, stream).await?;
        exchange(stream, target).await?
    } else {
        exchange(stream, target).await?
    };

    parse_response(Bytes::from(raw))
}

async fn exchange<S>(mut stream: S, target: &Url) -> Result<Vec<u8>, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(format!("{target}\r\n").as_bytes()).await?;
    stream.flush().await?;

    let mut raw = Vec::new();
    stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut raw).await?;
    Ok(raw)
}

/// Parses `"<status> <meta>\r\n<body>"` as sent by an upstream server.
fn parse_response(mut raw: Bytes) -> Result<Response, ProxyError> {
    let header_end = raw
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| ProxyError::malformed("missing header terminator"))?;
    let header = raw.split_to(header_end);
    let body = raw.split_off(2);

    let header = std::str::from_utf8(&header).map_err(ProxyError::malformed)?;
    let (code, meta) = header.split_once(' ').unwrap_or((header, ""));
    let code = code.parse::<Status>().map_err(ProxyError::malformed)?;
    if !status::is_valid(code) {
        return Err(ProxyError::malformed(format!("status out of range: {code}")));
    }

    let mut response = Response::new();
    response.set_status(code);
    if !meta.is_empty() {
        response.set_meta(meta);
    }
    if status::is_success(code) {
        response.set_body(body);
    }
    Ok(response)
}

fn connector() -> Result<TlsConnector, ProxyError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(TrustAnyCertificate { provider }))
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Gemini servers usually present self-signed certificates, trusted on first
/// use rather than through a CA chain. Signatures are still checked.
#[derive(Debug)]
struct TrustAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for TrustAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micro_gemini::protocol::Request;
    use std::net::SocketAddr;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    /// A plain TCP upstream answering each request with `answer(path)`.
    async fn upstream(answer: fn(&str) -> String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    let (reader, mut writer) = stream.into_split();
                    let mut line = String::new();
                    tokio::io::BufReader::new(reader).read_line(&mut line).await.unwrap();
                    let url = Url::parse(line.trim_end()).unwrap();
                    writer.write_all(answer(url.path()).as_bytes()).await.unwrap();
                    writer.shutdown().await.unwrap();
                });
            }
        });
        addr
    }

    fn plain(port: u16) -> ProxyOptions {
        ProxyOptions { secure: false, port: Some(port), ..Default::default() }
    }

    fn context() -> Context {
        Context::new(Request::parse("gemini://localhost/").unwrap())
    }

    fn capsule(path: &str) -> String {
        match path {
            "/" => "20 text/gemini\r\n# Upstream\n".into(),
            "/old" => "31 /new\r\n".into(),
            "/new" => "20 text/gemini\r\nmoved here".into(),
            "/loop" => "30 loop\r\n".into(),
            "/gone" => "52 \r\n".into(),
            _ => "51 Not found\r\n".into(),
        }
    }

    #[tokio::test]
    async fn upstream_response_replaces_the_local_one() {
        let addr = upstream(capsule).await;
        let mut ctx = context();

        proxy(&mut ctx, "gemini://localhost/", &plain(addr.port())).await.unwrap();

        let bytes = ctx.response().serialize().unwrap();
        assert_eq!(&bytes[..], b"20 text/gemini\r\n# Upstream\n");
    }

    #[tokio::test]
    async fn redirects_are_passed_through_by_default() {
        let addr = upstream(capsule).await;
        let mut ctx = context();

        proxy(&mut ctx, "gemini://localhost/old", &plain(addr.port())).await.unwrap();

        assert_eq!(ctx.response().status(), 31);
        assert_eq!(ctx.response().meta(), "/new");
    }

    #[tokio::test]
    async fn redirects_are_followed_relative_to_the_target() {
        let addr = upstream(capsule).await;
        let options = ProxyOptions { follow_redirects: true, ..plain(addr.port()) };
        let mut ctx = context();

        proxy(&mut ctx, "gemini://localhost/old", &options).await.unwrap();

        assert_eq!(ctx.response().body().map(|b| &b[..]), Some(&b"moved here"[..]));
    }

    #[tokio::test]
    async fn redirect_loops_are_a_proxy_error() {
        let addr = upstream(capsule).await;
        let options = ProxyOptions { follow_redirects: true, max_redirects: 3, ..plain(addr.port()) };

        let error = fetch("gemini://localhost/loop", &options).await.unwrap_err();
        assert!(matches!(error, ProxyError::TooManyRedirects { max_redirects: 3 }));

        let error = proxy(&mut context(), "gemini://localhost/loop", &options).await.unwrap_err();
        assert_eq!(error.downcast_ref::<GeminiError>(), Some(&GeminiError::new(43)));
    }

    #[tokio::test]
    async fn empty_upstream_meta_uses_the_status_default() {
        let addr = upstream(capsule).await;

        let response = fetch("gemini://localhost/gone", &plain(addr.port())).await.unwrap();

        assert_eq!(response.status(), 52);
        assert_eq!(response.meta(), "Gone");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_proxy_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let error = proxy(&mut context(), "gemini://localhost/", &plain(port)).await.unwrap_err();

        assert_eq!(error.downcast_ref::<GeminiError>().map(GeminiError::status), Some(43));
    }

    #[tokio::test]
    async fn invalid_target_is_a_proxy_error() {
        let error = proxy(&mut context(), "not a url", &ProxyOptions::default()).await.unwrap_err();
        assert_eq!(error.downcast_ref::<GeminiError>().map(GeminiError::message), Some("Proxy error"));
    }

    #[test]
    fn malformed_responses() {
        for raw in [&b"20 text/gemini"[..], b"2x meta\r\n", b"99 meta\r\n", b"\xff\xfe\r\n"] {
            assert!(matches!(parse_response(Bytes::copy_from_slice(raw)), Err(ProxyError::MalformedResponse { .. })));
        }
    }

    #[test]
    fn body_of_failure_is_ignored() {
        let response = parse_response(Bytes::from_static(b"51 missing\r\nstray")).unwrap();
        assert_eq!(response.meta(), "missing");
        assert_eq!(response.body(), None);
    }
}
