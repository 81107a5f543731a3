use micro_gemini::middleware::middleware_fn;
use micro_gemini::server::{Application, ListenOptions, TlsOptions};
use micro_gemini_web::{ContextExt, ProxyOptions};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut app = Application::new();
    app.register(middleware_fn(|ctx, _next| {
        Box::pin(async move {
            let options = ProxyOptions { follow_redirects: true, ..Default::default() };
            ctx.proxy("gemini://geminiprotocol.net/", &options).await
        })
    }))?;

    let tls = TlsOptions::new("resources/localhost-cert.pem", "resources/localhost-key.pem");
    app.listen(ListenOptions::tls("0.0.0.0", 1965, tls)).await?;
    Ok(())
}
