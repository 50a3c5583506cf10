use serde_json::{json, Value};

pub fn geocode_json() -> Value {
    json!([{
        "name": "London",
        "local_names": { "en": "London", "fr": "Londres" },
        "lat": 51.5074,
        "lon": -0.1278,
        "country": "GB",
        "state": "England"
    }])
}

pub fn snapshot_json(temp: f64, humidity: u32) -> Value {
    json!({
        "coord": { "lon": -0.1278, "lat": 51.5074 },
        "weather": [
            { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
        ],
        "base": "stations",
        "main": {
            "temp": temp,
            "feels_like": temp - 0.8,
            "temp_min": temp - 1.5,
            "temp_max": temp + 1.2,
            "pressure": 1015,
            "humidity": humidity
        },
        "visibility": 10000,
        "wind": { "speed": 4.1, "deg": 240 },
        "clouds": { "all": 75 },
        "dt": 1717243200,
        "sys": { "country": "GB", "sunrise": 1717213600, "sunset": 1717272800 },
        "timezone": 3600,
        "id": 2643743,
        "name": "London",
        "cod": 200
    })
}
