pub mod gemini;
pub mod openrouter;

use crate::cache::{CacheStats, TtlCache, AI_TEXT_CAPACITY, AI_TEXT_TTL};
use crate::config::{AiProvider, Config};
use crate::telemetry::{SchemaViolation, Telemetry};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String, payload: Value },
}

impl AiError {
    pub fn malformed(reason: impl Into<String>, payload: Value) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
            payload,
        }
    }
}

/// A language-model backend that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// URL requests are sent to; part of the cache key.
    fn endpoint(&self) -> &str;

    fn model(&self) -> &str;

    async fn generate_text(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, AiError>;
}

pub fn build_text_generator(config: &Config) -> Result<Arc<dyn TextGenerator>, reqwest::Error> {
    let generator: Arc<dyn TextGenerator> = match config.ai_provider {
        AiProvider::OpenRouter => Arc::new(openrouter::OpenRouterClient::new(config)?),
        AiProvider::Gemini => Arc::new(gemini::GeminiClient::new(config)?),
    };
    tracing::info!(
        provider = ?config.ai_provider,
        model = generator.model(),
        "text generation backend selected"
    );
    Ok(generator)
}

// Parse a response body, treating anything that is not JSON as a shape failure.
fn parse_body(body: String) -> Result<Value, AiError> {
    serde_json::from_str(&body)
        .map_err(|e| AiError::malformed(format!("body is not valid JSON: {}", e), Value::String(body)))
}

#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub cached: bool,
}

/// Cached prompt -> text generation in front of a [`TextGenerator`].
pub struct AiGateway {
    generator: Arc<dyn TextGenerator>,
    cache: TtlCache<String>,
    system_instruction: Option<String>,
    telemetry: Arc<dyn Telemetry>,
}

impl AiGateway {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        system_instruction: Option<String>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            generator,
            cache: TtlCache::bounded("ai_text", AI_TEXT_CAPACITY),
            system_instruction,
            telemetry,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<Generated, AiError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AiError::EmptyPrompt);
        }

        let key = format!(
            "{}|{}|{}",
            self.generator.endpoint(),
            self.generator.model(),
            prompt
        );
        if let Some(text) = self.cache.get(&key) {
            tracing::debug!(model = self.generator.model(), "ai text cache hit");
            return Ok(Generated { text, cached: true });
        }

        let result = self
            .generator
            .generate_text(prompt, self.system_instruction.as_deref())
            .await;

        let text = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(text) => {
                return Err(self.report(AiError::malformed("generated text is empty", Value::String(text)), prompt))
            }
            Err(err @ AiError::MalformedResponse { .. }) => return Err(self.report(err, prompt)),
            Err(err) => {
                tracing::warn!(model = self.generator.model(), error = %err, "text generation failed");
                return Err(err);
            }
        };

        self.cache.put(key, text.clone(), AI_TEXT_TTL);
        Ok(Generated { text, cached: false })
    }

    fn report(&self, err: AiError, prompt: &str) -> AiError {
        if let AiError::MalformedResponse { reason, payload } = &err {
            self.telemetry.schema_violation(SchemaViolation {
                upstream: "ai",
                reason: reason.clone(),
                payload: payload.clone(),
                context: json!({
                    "endpoint": self.generator.endpoint(),
                    "model": self.generator.model(),
                    "prompt_chars": prompt.chars().count(),
                }),
            });
        }
        err
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedGenerator;
    use super::*;
    use crate::telemetry::testing::RecordingTelemetry;

    fn gateway(generator: Arc<ScriptedGenerator>) -> (AiGateway, Arc<RecordingTelemetry>) {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let gateway = AiGateway::new(generator, Some("be brief".to_string()), telemetry.clone());
        (gateway, telemetry)
    }

    #[tokio::test]
    async fn test_repeat_prompt_is_served_from_cache() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("sunny".to_string())]));
        let (gateway, _) = gateway(generator.clone());

        let first = gateway.generate("Will it rain?").await.unwrap();
        let second = gateway.generate("  Will it rain?\n").await.unwrap();

        assert_eq!(first.text, "sunny");
        assert!(!first.cached);
        assert_eq!(second.text, "sunny");
        assert!(second.cached);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_is_trimmed_and_system_instruction_forwarded() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let (gateway, _) = gateway(generator.clone());

        gateway.generate("  hello  ").await.unwrap();

        let prompts = generator.prompts.lock().clone();
        assert_eq!(prompts, vec![("hello".to_string(), Some("be brief".to_string()))]);
    }

    #[tokio::test]
    async fn test_cache_key_includes_model() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let telemetry = Arc::new(RecordingTelemetry::default());
        let gateway_a = AiGateway::new(generator.clone(), None, telemetry.clone());
        gateway_a.generate("hi").await.unwrap();

        let mut other = ScriptedGenerator::new(vec![]);
        other.model = "other-model".to_string();
        let other = Arc::new(other);
        let gateway_b = AiGateway::new(other.clone(), None, telemetry);
        let result = gateway_b.generate("hi").await.unwrap();

        assert!(!result.cached);
        assert_eq!(other.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_evicts_oldest_prompt_beyond_capacity() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let (gateway, _) = gateway(generator.clone());

        for i in 0..=AI_TEXT_CAPACITY {
            gateway.generate(&format!("prompt {}", i)).await.unwrap();
        }
        assert_eq!(gateway.cache_stats().entry_count, AI_TEXT_CAPACITY);

        let newest = gateway
            .generate(&format!("prompt {}", AI_TEXT_CAPACITY))
            .await
            .unwrap();
        assert!(newest.cached);

        let oldest = gateway.generate("prompt 0").await.unwrap();
        assert!(!oldest.cached);
        assert_eq!(generator.calls(), AI_TEXT_CAPACITY + 2);
    }

    #[tokio::test]
    async fn test_malformed_response_is_reported_and_not_cached() {
        let payload = json!({ "choices": [] });
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(AiError::malformed(
            "no choices",
            payload.clone(),
        ))]));
        let (gateway, telemetry) = gateway(generator.clone());

        let err = gateway.generate("hello").await.unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse { .. }));

        let violations = telemetry.schema_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].upstream, "ai");
        assert_eq!(violations[0].payload, payload);
        assert_eq!(violations[0].context["model"], "test-model");
        assert_eq!(gateway.cache_stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_blank_generated_text_is_rejected() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok("   ".to_string())]));
        let (gateway, telemetry) = gateway(generator);

        let err = gateway.generate("hello").await.unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse { .. }));
        assert_eq!(telemetry.schema_violations().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_reported_as_schema_violation() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(AiError::ApiError(
            "HTTP 503: overloaded".to_string(),
        ))]));
        let (gateway, telemetry) = gateway(generator);

        let err = gateway.generate("hello").await.unwrap_err();
        assert!(matches!(err, AiError::ApiError(_)));
        assert!(telemetry.events().is_empty());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_without_upstream_call() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let (gateway, _) = gateway(generator.clone());

        assert!(matches!(gateway.generate("  ").await, Err(AiError::EmptyPrompt)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_clear_cache_drops_entries() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let (gateway, _) = gateway(generator.clone());

        gateway.generate("hello").await.unwrap();
        gateway.clear_cache();

        assert!(!gateway.generate("hello").await.unwrap().cached);
        assert_eq!(generator.calls(), 2);
    }
}
