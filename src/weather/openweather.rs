use super::types::*;
use crate::config::Config;
use crate::error::{UpstreamError, UpstreamErrorKind};
use crate::telemetry::{SchemaViolation, Telemetry};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const GEOCODING: &str = "geocoding";
const WEATHER: &str = "weather";

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

/// HTTP client for the OpenWeather geocoding and current-weather endpoints.
///
/// This is the only place raw transport and HTTP failures are classified into
/// [`UpstreamError`]s.
pub struct OpenWeatherClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    geocode_direct_path: String,
    current_path: String,
    telemetry: Arc<dyn Telemetry>,
}

impl OpenWeatherClient {
    pub fn new(config: &Config, telemetry: Arc<dyn Telemetry>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("WeatherGateway/1.0")
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.openweather_api_key.clone(),
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            geocode_direct_path: config.openweather_geocode_direct_path.clone(),
            current_path: config.openweather_current_path.clone(),
            telemetry,
        })
    }

    pub async fn resolve_location(&self, city: &str) -> Result<GeoResult, UpstreamError> {
        let api_key = self.api_key()?;
        let context = json!({ "city": city });

        let url = format!(
            "{}{}?q={}&limit=1",
            self.base_url,
            self.geocode_direct_path,
            urlencoding::encode(city)
        );

        tracing::debug!(city, "resolving location upstream");
        let payload = self
            .get_json(&url, &[("appid", api_key)], GEOCODING, "City not found", &context)
            .await?;

        if !payload.is_array() {
            return Err(self.schema_violation(
                GEOCODING,
                "expected an array of location candidates".to_string(),
                payload,
                context,
            ));
        }

        let Some(first) = payload.as_array().and_then(|c| c.first()).cloned() else {
            return Err(UpstreamError::not_found("City not found"));
        };

        match serde_json::from_value::<GeocodeResponse>(first) {
            Ok(geo) => Ok(geo.into()),
            Err(e) => Err(self
                .schema_violation(GEOCODING, e.to_string(), payload, context)
                .with_cause(e)),
        }
    }

    pub async fn fetch_weather(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
        lang: &str,
    ) -> Result<WeatherSnapshot, UpstreamError> {
        let api_key = self.api_key()?;
        let context = json!({
            "lat": lat,
            "lon": lon,
            "units": units.as_str(),
            "lang": lang,
        });

        let url = format!("{}{}", self.base_url, self.current_path);
        let lat_param = lat.to_string();
        let lon_param = lon.to_string();

        tracing::debug!(lat, lon, units = units.as_str(), lang, "fetching weather upstream");
        let payload = self
            .get_json(
                &url,
                &[
                    ("lat", lat_param.as_str()),
                    ("lon", lon_param.as_str()),
                    ("units", units.as_str()),
                    ("lang", lang),
                    ("appid", api_key),
                ],
                WEATHER,
                "Location not found",
                &context,
            )
            .await?;

        let snapshot = match serde_json::from_value::<WeatherSnapshot>(payload.clone()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return Err(self
                    .schema_violation(WEATHER, e.to_string(), payload, context)
                    .with_cause(e))
            }
        };

        if let Err(reason) = snapshot.validate() {
            return Err(self.schema_violation(WEATHER, reason, payload, context));
        }

        Ok(snapshot)
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::not_configured("OPENWEATHER_API_KEY is not configured"))
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
        upstream: &'static str,
        not_found_message: &str,
        context: &Value,
    ) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                let err = UpstreamError::from_transport(e.without_url());
                tracing::warn!(upstream, error = %err, "upstream request failed");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let kind = UpstreamErrorKind::from_http_status(status.as_u16());
            let message = match kind {
                UpstreamErrorKind::NotFound => not_found_message.to_string(),
                _ => error_message(response).await,
            };
            tracing::warn!(upstream, status = status.as_u16(), %message, "upstream returned an error");
            return Err(UpstreamError::new(kind, message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_transport(e.without_url()))?;

        match serde_json::from_str::<Value>(&body) {
            Ok(json) => Ok(json),
            Err(e) => Err(self
                .schema_violation(
                    upstream,
                    format!("body is not valid JSON: {}", e),
                    Value::String(body),
                    context.clone(),
                )
                .with_cause(e)),
        }
    }

    fn schema_violation(
        &self,
        upstream: &'static str,
        reason: String,
        payload: Value,
        context: Value,
    ) -> UpstreamError {
        let message = format!("Invalid {} response from upstream: {}", upstream, reason);
        self.telemetry.schema_violation(SchemaViolation {
            upstream,
            reason,
            payload,
            context,
        });
        UpstreamError::invalid_response(message)
    }
}

// Never fails: an unreadable error body degrades to a generic message.
async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<UpstreamErrorBody>().await {
        Ok(body) if !body.message.trim().is_empty() => body.message,
        _ => format!("Upstream request failed with status {}", status.as_u16()),
    }
}
