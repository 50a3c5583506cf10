use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_symbol(self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl std::str::FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            other => Err(format!("Invalid units: {}. Must be metric or imperial", other)),
        }
    }
}

/// One candidate from the direct geocoding endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub state: Option<String>,
}

/// Resolved location for a city query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl From<GeocodeResponse> for GeoResult {
    fn from(geo: GeocodeResponse) -> Self {
        Self {
            name: geo.name,
            lat: geo.lat,
            lon: geo.lon,
            country_code: geo.country,
            state: geo.state,
        }
    }
}

/// Current-weather payload as returned by the upstream provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSnapshot {
    pub coord: SnapshotCoord,
    pub weather: Vec<SnapshotCondition>,
    pub main: SnapshotMain,
    pub visibility: Option<u32>,
    pub wind: SnapshotWind,
    pub clouds: SnapshotClouds,
    pub rain: Option<SnapshotPrecipitation>,
    pub snow: Option<SnapshotPrecipitation>,
    pub dt: i64,
    pub sys: SnapshotSys,
    pub timezone: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotCondition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: u32,
    pub humidity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotWind {
    pub speed: f64,
    pub deg: f64,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotClouds {
    pub all: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotPrecipitation {
    #[serde(rename = "1h")]
    pub last_1h: Option<f64>,
    #[serde(rename = "3h")]
    pub last_3h: Option<f64>,
}

impl SnapshotPrecipitation {
    /// Most recent reported amount in millimetres.
    pub fn amount_mm(&self) -> Option<f64> {
        self.last_1h.or(self.last_3h)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSys {
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

impl WeatherSnapshot {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.weather.is_empty() {
            return Err("weather condition list is empty".to_string());
        }
        if !self.coord.lat.is_finite() || !self.coord.lon.is_finite() {
            return Err("coordinates are not finite".to_string());
        }
        Ok(())
    }
}
