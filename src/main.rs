use actix_web::{App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod model;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to initialize application");
        std::process::exit(1);
    });

    let registry = state.registry;
    let assessment_service = state.assessment_service;

    tracing::info!(
        model = %config.judge.model,
        "Starting AI literacy assessment server on {}",
        bind_addr
    );

    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .app_data(assessment_service.clone())
            .configure(api::health::configure)
            .configure(api::openapi::configure)
            .configure(api::assessment::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
