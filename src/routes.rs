use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    ai::{AiError, AiGateway},
    cache::CacheStats,
    error::{map_upstream_error, ApiError, UpstreamError},
    telemetry::Telemetry,
    utils::{is_valid_lang_code, validate_coordinates},
    weather::{report::WeatherReport, types::GeoResult, types::Units, WeatherQuery, WeatherService},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather_service: Arc<WeatherService>,
    pub ai_gateway: Arc<AiGateway>,
    pub telemetry: Arc<dyn Telemetry>,
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub units: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AiRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AiResponse {
    pub response: String,
    pub cached: bool,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub caches: CacheReport,
}

#[derive(Debug, Serialize)]
pub struct CacheReport {
    pub geocode: CacheStats,
    pub weather: CacheStats,
    pub ai: CacheStats,
}

impl WeatherParams {
    /// Boundary validation. A query without a city must carry both
    /// coordinates; the service never sees a location-less request.
    pub fn into_query(self) -> Result<WeatherQuery, ApiError> {
        let units = match self.units.as_deref() {
            None => Units::default(),
            Some(raw) => raw.parse::<Units>().map_err(ApiError::bad_request)?,
        };

        let lang = match self.lang {
            None => "en".to_string(),
            Some(lang) if is_valid_lang_code(&lang) => lang.to_ascii_lowercase(),
            Some(lang) => {
                return Err(ApiError::bad_request(format!(
                    "Invalid lang: {}. Must be a 2-letter language code",
                    lang
                )))
            }
        };

        let city = self
            .city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if city.is_none() {
            match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => {
                    validate_coordinates(lat, lon).map_err(ApiError::bad_request)?
                }
                _ => {
                    return Err(ApiError::bad_request(
                        "Either city or both lat and lon must be provided",
                    ))
                }
            }
        }

        Ok(WeatherQuery {
            city,
            lat: self.lat,
            lon: self.lon,
            units,
            lang,
        })
    }
}

fn upstream_failure(state: &AppState, operation: &str, err: UpstreamError) -> ApiError {
    tracing::error!(status = err.status_code(), "{} failed: {}", operation, err);
    map_upstream_error(&err, state.telemetry.as_ref())
}

// Route handlers
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let weather = state.weather_service.cache_stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        caches: CacheReport {
            geocode: weather.geocode,
            weather: weather.weather,
            ai: state.ai_gateway.cache_stats(),
        },
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    params: Result<Query<WeatherParams>, QueryRejection>,
) -> Result<Json<WeatherReport>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = params.into_query()?;

    match state.weather_service.get_current_weather(&query).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err(upstream_failure(&state, "Weather lookup", e)),
    }
}

pub async fn geocode(
    State(state): State<AppState>,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> Result<Json<GeoResult>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let city = params
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("city must be provided"))?;

    match state.weather_service.resolve_city(city).await {
        Ok(geo) => Ok(Json(geo)),
        Err(e) => Err(upstream_failure(&state, "Geocoding", e)),
    }
}

pub async fn generate_text(
    State(state): State<AppState>,
    payload: Result<Json<AiRequest>, JsonRejection>,
) -> Result<Json<AiResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    match state.ai_gateway.generate(&request.prompt).await {
        Ok(generated) => Ok(Json(AiResponse {
            response: generated.text,
            cached: generated.cached,
            generated_at: chrono::Utc::now(),
        })),
        Err(AiError::EmptyPrompt) => Err(ApiError::bad_request("prompt must not be empty")),
        Err(e) => {
            tracing::error!("Text generation failed: {}", e);
            Err(ApiError::internal("Failed to generate response"))
        }
    }
}

pub async fn clear_caches(State(state): State<AppState>) -> StatusCode {
    state.weather_service.clear_caches();
    state.ai_gateway.clear_cache();
    tracing::info!("All caches cleared");
    StatusCode::NO_CONTENT
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather", get(get_weather))
        .route("/api/geocode", get(geocode))
        .route("/api/ai/generate", post(generate_text))
        .route("/api/cache", delete(clear_caches))
        .with_state(state)
}
