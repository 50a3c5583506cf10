//! Outward-facing weather shape built from an upstream [`WeatherSnapshot`].

use super::types::{Units, WeatherSnapshot};
use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub location: Location,
    pub condition: Condition,
    pub temperature: Temperature,
    pub wind: Wind,
    pub atmosphere: Atmosphere,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<Precipitation>,
    pub sun: SunTimes,
    pub timestamp: String,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub name: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub timezone_offset: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Condition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Wind {
    pub speed: f64,
    pub direction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Atmosphere {
    pub humidity: u32,
    pub pressure: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<u32>,
    pub clouds: u32,
}

/// Millimetres over the most recent reporting period.
#[derive(Debug, Clone, Serialize)]
pub struct Precipitation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snow: Option<f64>,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SunTimes {
    pub sunrise: String,
    pub sunset: String,
}

pub fn epoch_to_iso(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl WeatherReport {
    /// Build the report. The snapshot has already been validated, so the
    /// condition list is non-empty.
    pub fn from_snapshot(snapshot: &WeatherSnapshot, units: Units, cached: bool) -> Self {
        let condition = snapshot
            .weather
            .first()
            .map(|c| Condition {
                id: c.id,
                main: c.main.clone(),
                description: c.description.clone(),
                icon: c.icon.clone(),
            })
            .unwrap_or_else(|| Condition {
                id: 0,
                main: String::new(),
                description: String::new(),
                icon: String::new(),
            });

        let precipitation = if snapshot.rain.is_some() || snapshot.snow.is_some() {
            Some(Precipitation {
                rain: snapshot.rain.as_ref().and_then(|r| r.amount_mm()),
                snow: snapshot.snow.as_ref().and_then(|s| s.amount_mm()),
                unit: "mm",
            })
        } else {
            None
        };

        Self {
            location: Location {
                name: snapshot.name.clone(),
                country: snapshot.sys.country.clone(),
                lat: snapshot.coord.lat,
                lon: snapshot.coord.lon,
                timezone_offset: snapshot.timezone,
            },
            condition,
            temperature: Temperature {
                current: snapshot.main.temp,
                feels_like: snapshot.main.feels_like,
                min: snapshot.main.temp_min,
                max: snapshot.main.temp_max,
                unit: units.temperature_symbol(),
            },
            wind: Wind {
                speed: snapshot.wind.speed,
                direction: snapshot.wind.deg,
                gust: snapshot.wind.gust,
                unit: units.wind_symbol(),
            },
            atmosphere: Atmosphere {
                humidity: snapshot.main.humidity,
                pressure: snapshot.main.pressure,
                visibility: snapshot.visibility,
                clouds: snapshot.clouds.all,
            },
            precipitation,
            sun: SunTimes {
                sunrise: epoch_to_iso(snapshot.sys.sunrise),
                sunset: epoch_to_iso(snapshot.sys.sunset),
            },
            timestamp: epoch_to_iso(snapshot.dt),
            cached,
        }
    }
}
