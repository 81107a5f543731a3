use micro_gemini::server::{Application, ListenOptions, TlsOptions};
use micro_gemini_web::{Router, RouterOptions, route_fn};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut router = Router::new(RouterOptions::with_url_prefix("gemini://localhost"));
    router
        .on(
            "/",
            route_fn(|mut ctx| {
                Box::pin(async move {
                    ctx.response_mut().set_body("Hello World!");
                    Ok(())
                })
            }),
        )?
        .on(
            "/hello",
            route_fn(|mut ctx| {
                Box::pin(async move {
                    ctx.response_mut().set_body("Hello route");
                    Ok(())
                })
            }),
        )?
        .on(
            "/api/:name",
            route_fn(|mut ctx| {
                Box::pin(async move {
                    let body = format!("Hello {}!", ctx.param("name").unwrap_or_default());
                    ctx.response_mut().set_body(body);
                    Ok(())
                })
            }),
        )?;

    let mut app = Application::new();
    app.register(router)?;

    let tls = TlsOptions::new("resources/localhost-cert.pem", "resources/localhost-key.pem");
    app.listen(ListenOptions::tls("0.0.0.0", 1965, tls)).await?;
    Ok(())
}
