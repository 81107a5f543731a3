use micro_gemini::middleware::middleware_fn;
use micro_gemini::server::{Application, ListenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut app = Application::new();
    app.register(middleware_fn(|ctx, _next| {
        Box::pin(async move {
            ctx.response_mut().set_body("Hello world!");
            Ok(())
        })
    }))?;

    let app = std::sync::Arc::new(app);
    let server = tokio::spawn({
        let app = std::sync::Arc::clone(&app);
        async move { app.listen(ListenOptions::plain("127.0.0.1", 0)).await }
    });

    let addr = loop {
        match app.local_addr() {
            Some(addr) => break addr,
            None => tokio::task::yield_now().await,
        }
    };

    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(b"gemini://localhost/\r\n").await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    info!(response, "received");

    app.close();
    server.await??;
    Ok(())
}
