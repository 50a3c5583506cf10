use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenRouter,
    Gemini,
}

impl std::str::FromStr for AiProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(AiProvider::OpenRouter),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(anyhow::anyhow!(
                "AI_PROVIDER must be `openrouter` or `gemini`, got `{}`",
                other
            )),
        }
    }
}

/// Process configuration. Upstream credentials are optional here and checked
/// per request, so the server starts even when a backend is not set up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub upstream_timeout: Duration,
    pub ai_timeout: Duration,
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    pub openweather_geocode_direct_path: String,
    pub openweather_current_path: String,
    pub ai_provider: AiProvider,
    pub ai_system_prompt: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub or_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let upstream_timeout_secs = secs_var("UPSTREAM_TIMEOUT_SECS", 5)?;
        let ai_timeout_secs = secs_var("AI_TIMEOUT_SECS", 60)?;

        let ai_provider = match env::var("AI_PROVIDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => AiProvider::OpenRouter,
        };

        Ok(Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            openweather_api_key: optional_var("OPENWEATHER_API_KEY"),
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            openweather_geocode_direct_path: env::var("OPENWEATHER_GEOCODE_DIRECT_PATH")
                .unwrap_or_else(|_| "/geo/1.0/direct".to_string()),
            openweather_current_path: env::var("OPENWEATHER_CURRENT_PATH")
                .unwrap_or_else(|_| "/data/2.5/weather".to_string()),
            ai_provider,
            ai_system_prompt: optional_var("AI_SYSTEM_PROMPT"),
            openrouter_api_key: optional_var("OPENROUTER_API_KEY"),
            openrouter_base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".to_string()),
            or_model: env::var("OR_MODEL")
                .unwrap_or_else(|_| "deepseek/deepseek-chat-v3-0324:free".to_string()),
            gemini_api_key: optional_var("GEMINI_API_KEY"),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
        })
    }
}

// Blank values count as unset so `KEY=` in a .env file disables the backend.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_var(name: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds", name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration pointing every upstream at `base_url` (a mock server).
    pub fn for_upstream(base_url: &str) -> Self {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            upstream_timeout: Duration::from_secs(5),
            ai_timeout: Duration::from_secs(5),
            openweather_api_key: Some("test-key".to_string()),
            openweather_base_url: base_url.to_string(),
            openweather_geocode_direct_path: "/geo/1.0/direct".to_string(),
            openweather_current_path: "/data/2.5/weather".to_string(),
            ai_provider: AiProvider::OpenRouter,
            ai_system_prompt: None,
            openrouter_api_key: Some("test-key".to_string()),
            openrouter_base_url: format!("{}/api/v1/chat/completions", base_url),
            or_model: "test/model".to_string(),
            gemini_api_key: Some("test-key".to_string()),
            gemini_base_url: base_url.to_string(),
            gemini_model: "gemini-test".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_provider_parsing() {
        assert_eq!("openrouter".parse::<AiProvider>().unwrap(), AiProvider::OpenRouter);
        assert_eq!(" Gemini ".parse::<AiProvider>().unwrap(), AiProvider::Gemini);
        assert!("bard".parse::<AiProvider>().is_err());
    }
}
