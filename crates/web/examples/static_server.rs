use micro_gemini::middleware::middleware_fn;
use micro_gemini::server::Application;
use micro_gemini_web::{ContextExt, SendOptions};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Serves the directory given as first argument, `.` by default, on
/// `:1965` without TLS.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let root = std::env::args().nth(1).unwrap_or_else(|| ".".to_owned());
    let options = Arc::new(SendOptions::new(root).with_index("index.gmi"));

    let mut app = Application::new();
    app.register(middleware_fn(move |ctx, _next| {
        let options = Arc::clone(&options);
        Box::pin(async move { ctx.send(&options).await })
    }))?;

    app.listen(":1965").await?;
    Ok(())
}
