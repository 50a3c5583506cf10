use super::{parse_body, AiError, TextGenerator};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat completions via OpenRouter.
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("WeatherGateway/1.0")
            .timeout(config.ai_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.openrouter_api_key.clone(),
            endpoint: config.openrouter_base_url.clone(),
            model: config.or_model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_text(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AiError::NotConfigured("OPENROUTER_API_KEY"))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_instruction {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: 500,
            temperature: 0.7,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("HTTP {}: {}", status, error_text)));
        }

        let payload = parse_body(response.text().await?)?;
        let chat_response: ChatResponse = serde_json::from_value(payload.clone())
            .map_err(|e| AiError::malformed(e.to_string(), payload.clone()))?;

        match chat_response.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => Err(AiError::malformed("No response choices", payload)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_chat_completion_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "hi there" }, "finish_reason": "stop" }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&Config::for_upstream(&server.uri())).unwrap();
        let text = client.generate_text("hello", Some("be brief")).await.unwrap();

        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&Config::for_upstream(&server.uri())).unwrap();
        let err = client.generate_text("hello", None).await.unwrap_err();

        match err {
            AiError::MalformedResponse { payload, .. } => assert_eq!(payload, json!({ "choices": [] })),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&Config::for_upstream(&server.uri())).unwrap();
        let err = client.generate_text("hello", None).await.unwrap_err();

        match err {
            AiError::ApiError(message) => assert!(message.contains("slow down")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let mut config = Config::for_upstream("http://127.0.0.1:9");
        config.openrouter_api_key = None;
        let client = OpenRouterClient::new(&config).unwrap();

        let err = client.generate_text("hello", None).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured("OPENROUTER_API_KEY")));
    }
}
