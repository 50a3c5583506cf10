use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod ai;
mod cache;
mod config;
mod error;
mod routes;
mod telemetry;
mod utils;
mod weather;

use ai::{build_text_generator, AiGateway};
use config::Config;
use routes::{create_router, AppState};
use telemetry::{Telemetry, TracingTelemetry};
use weather::{openweather::OpenWeatherClient, WeatherService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_gateway_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.openweather_api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY is not set; weather requests will fail");
    }

    let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry);

    let weather_client = OpenWeatherClient::new(&config, telemetry.clone())?;
    let weather_service = Arc::new(WeatherService::new(weather_client));

    let generator = build_text_generator(&config)?;
    let ai_gateway = Arc::new(AiGateway::new(
        generator,
        config.ai_system_prompt.clone(),
        telemetry.clone(),
    ));

    let state = AppState {
        weather_service,
        ai_gateway,
        telemetry,
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
