pub mod openweather;
pub mod report;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::cache::{
    geocode_cache_key, weather_cache_key, CacheStats, TtlCache, GEOCODE_TTL, WEATHER_TTL,
};
use crate::error::UpstreamError;
use openweather::OpenWeatherClient;
use report::WeatherReport;
use serde::Serialize;
use types::{GeoResult, Units, WeatherSnapshot};

#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub units: Units,
    pub lang: String,
}

impl Default for WeatherQuery {
    fn default() -> Self {
        Self {
            city: None,
            lat: None,
            lon: None,
            units: Units::Metric,
            lang: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WeatherCacheStats {
    pub geocode: CacheStats,
    pub weather: CacheStats,
}

/// Two-stage pipeline: resolve a city to coordinates, then fetch current
/// weather for them. Each stage consults its own cache first.
///
/// Upstream errors are returned unchanged; translating them for HTTP clients
/// happens at the route layer.
pub struct WeatherService {
    client: OpenWeatherClient,
    geocode_cache: TtlCache<GeoResult>,
    weather_cache: TtlCache<WeatherSnapshot>,
}

impl WeatherService {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self {
            client,
            geocode_cache: TtlCache::new("geocode"),
            weather_cache: TtlCache::new("weather"),
        }
    }

    pub async fn get_current_weather(&self, query: &WeatherQuery) -> Result<WeatherReport, UpstreamError> {
        let (lat, lon) = match query.city.as_deref() {
            Some(city) => {
                let geo = self.resolve_city(city).await?;
                (geo.lat, geo.lon)
            }
            // Callers validate before this point; (0, 0) only guards against
            // a query that slipped through without any location.
            None => (query.lat.unwrap_or(0.0), query.lon.unwrap_or(0.0)),
        };

        let (snapshot, cached) = self
            .fetch_weather(lat, lon, query.units, &query.lang)
            .await?;

        Ok(WeatherReport::from_snapshot(&snapshot, query.units, cached))
    }

    pub async fn resolve_city(&self, city: &str) -> Result<GeoResult, UpstreamError> {
        let key = geocode_cache_key(city);
        if let Some(geo) = self.geocode_cache.get(&key) {
            tracing::debug!(city = %key, "geocode cache hit");
            return Ok(geo);
        }

        tracing::debug!(city = %key, "geocode cache miss");
        let geo = self.client.resolve_location(city.trim()).await?;
        self.geocode_cache.put(key, geo.clone(), GEOCODE_TTL);
        Ok(geo)
    }

    async fn fetch_weather(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
        lang: &str,
    ) -> Result<(WeatherSnapshot, bool), UpstreamError> {
        let key = weather_cache_key(lat, lon, units.as_str());
        if let Some(snapshot) = self.weather_cache.get(&key) {
            tracing::debug!(key = %key, "weather cache hit");
            return Ok((snapshot, true));
        }

        tracing::debug!(key = %key, "weather cache miss");
        let snapshot = self.client.fetch_weather(lat, lon, units, lang).await?;
        self.weather_cache.put(key, snapshot.clone(), WEATHER_TTL);
        Ok((snapshot, false))
    }

    pub fn cache_stats(&self) -> WeatherCacheStats {
        WeatherCacheStats {
            geocode: self.geocode_cache.stats(),
            weather: self.weather_cache.stats(),
        }
    }

    pub fn clear_caches(&self) {
        self.geocode_cache.clear();
        self.weather_cache.clear();
    }
}
