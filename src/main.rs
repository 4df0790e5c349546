use anyhow::Result;
use axum::{routing::get, Router};
use lang_cookie::{with_language_detection, Config, Localizer, ResolvedLanguage};
use tracing::info;

async fn index(ResolvedLanguage(lang): ResolvedLanguage) -> String {
    format!("Detected language: {}\n", lang)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lang_cookie=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        cookie = %config.cookie_name,
        param = %config.get_param_name,
        default = %config.default_language,
        whitelist = ?config.whitelist().map(|langs| langs.iter().collect::<Vec<_>>()),
        "Loaded language detection configuration"
    );

    let localizer = Localizer::new(config)?;
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }));
    let app = with_language_detection(app, localizer).layer(
        tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ),
    );

    let addr = format!("0.0.0.0:{}", port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
