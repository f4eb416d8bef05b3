use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::parser;
use crate::prompt;

/// Connection settings for an OpenAI-compatible chat completions endpoint
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://models.github.ai/inference".to_string(),
            model: "openai/gpt-4.1-mini".to_string(),
            api_key: String::new(),
            temperature: 0.0,
            request_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client for the LLM endpoint")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat completion round trip, returning the first choice's content
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            response_format: ResponseFormat { format_type: "json_object" },
        };

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the LLM endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM request failed: {} {}", status, body.trim());
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("LLM response contained no message content")
    }

    /// Complete and insist on JSON output.
    ///
    /// Output that does not parse as JSON gets at most `max_repairs` follow-up
    /// requests asking the model to fix it. Transport and status errors are
    /// returned immediately.
    pub async fn complete_json(
        &self,
        system: &str,
        user: &str,
        max_repairs: usize,
    ) -> Result<String> {
        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let mut response = self.complete(&messages).await?;

        for attempt in 1..=max_repairs {
            if parser::is_valid_json(&response) {
                return Ok(response);
            }

            warn!(model = %self.model, attempt, "LLM returned invalid JSON, requesting repair");
            debug!(response = %response, "Invalid LLM output");

            messages.push(ChatMessage::assistant(response.clone()));
            messages.push(ChatMessage::user(prompt::build_repair_prompt(&response)));
            response = self.complete(&messages).await?;
        }

        if parser::is_valid_json(&response) {
            return Ok(response);
        }
        anyhow::bail!("LLM did not return valid JSON after {} repair attempts", max_repairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            ..LlmConfig::default()
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"nodes\": []}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server)).unwrap();
        let content = client.complete(&[ChatMessage::user("hi")]).await.unwrap();

        assert_eq!(content, "{\"nodes\": []}");
    }

    #[tokio::test]
    async fn test_complete_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server)).unwrap();
        let err = client.complete_json("sys", "user", 1).await.unwrap_err();

        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad credentials"));
    }

    #[tokio::test]
    async fn test_complete_json_gives_up_after_repairs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json")))
            .expect(2)
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server)).unwrap();
        let err = client.complete_json("sys", "user", 1).await.unwrap_err();

        assert!(err.to_string().contains("valid JSON"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = LlmConfig { api_key: "sk-secret".to_string(), ..LlmConfig::default() };
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
