use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{PlannerError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const MAX_RETRIES: usize = 3;

/// Anything that can turn a chat request into the model's raw reply text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest, timeout: Duration) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a chat completion, retrying 429 and 5xx responses with backoff.
    pub async fn chat_completion(&self, body: &Value, timeout: Duration) -> Result<Value> {
        let mut attempt = 0;
        let mut backoff = Duration::from_millis(250);
        let request_url = build_chat_url(&self.base_url);

        loop {
            let response = self
                .http
                .post(&request_url)
                .timeout(timeout)
                .bearer_auth(&self.api_key)
                .header("Content-Type", "application/json")
                .header("X-Title", "trip-agent-rs")
                .json(body)
                .send()
                .await
                .map_err(|err| transport_error(err, timeout))?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response
                .text()
                .await
                .map_err(|err| transport_error(err, timeout))?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_duration = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < MAX_RETRIES {
                    warn!(target: "tripagent::llm", attempt, ?retry_after_duration, "rate limited, retrying");
                    tokio::time::sleep(retry_after_duration).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(PlannerError::RateLimit {
                    retry_after: retry_after_duration.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!(target: "tripagent::llm", attempt, status = status.as_u16(), "server error, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            if !status.is_success() {
                let api_message = serde_json::from_str::<Value>(&response_text)
                    .ok()
                    .and_then(|body| {
                        body.get("error")
                            .and_then(|error| error.get("message"))
                            .and_then(|value| value.as_str())
                            .map(|s| s.to_string())
                    })
                    .unwrap_or(response_text);

                return Err(PlannerError::Upstream {
                    status: status.as_u16(),
                    message: api_message,
                });
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
                PlannerError::Unknown(format!("model endpoint returned invalid JSON: {err}"))
            })?;

            if let Some(error) = response_json.get("error") {
                let error_message = error
                    .get("message")
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| error.to_string());
                return Err(PlannerError::Upstream {
                    status: status.as_u16(),
                    message: error_message,
                });
            }

            return Ok(response_json);
        }
    }

    /// Single attempt against `url` exactly as given; hands back the upstream status and body untouched.
    pub async fn forward(&self, url: &str, body: &Value, timeout: Duration) -> Result<(u16, Value)> {
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(err, timeout))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| transport_error(err, timeout))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok((status, body))
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: &ChatCompletionRequest, timeout: Duration) -> Result<String> {
        let response = self.chat_completion(&request.to_value(), timeout).await?;
        completion_text(&response).ok_or_else(|| {
            PlannerError::Upstream {
                status: 200,
                message: "completion response carried no message content".to_string(),
            }
        })
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> PlannerError {
    if err.is_timeout() {
        PlannerError::Timeout(format!("model call exceeded {}s", timeout.as_secs()))
    } else {
        PlannerError::Http(err.to_string())
    }
}

/// Text of the first choice. Content given as a list of parts is concatenated.
pub fn completion_text(response: &Value) -> Option<String> {
    let content = response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?;

    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

pub(crate) fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            response_format: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Ask for `{"type": "json_object"}` output where the provider supports it.
    pub fn with_json_object_format(mut self) -> Self {
        self.response_format = Some(json!({"type": "json_object"}));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Value] {
        &self.messages
    }

    pub fn to_value(&self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(response_format) = &self.response_format {
            body["response_format"] = response_format.clone();
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_accepts_both_forms() {
        assert_eq!(
            build_chat_url("https://api.example.com/v1/"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("https://api.example.com/v1/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_skips_unset_fields() {
        let request = ChatCompletionRequest::new("gpt-4o-mini", vec![json!({"role": "user", "content": "hi"})]);
        let body = request.to_value();
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("response_format").is_none());

        let body = request
            .with_max_tokens(Some(4000))
            .with_json_object_format()
            .to_value();
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_completion_text_shapes() {
        let plain = json!({"choices": [{"message": {"content": "{\"a\":1}"}}]});
        assert_eq!(completion_text(&plain).as_deref(), Some("{\"a\":1}"));

        let parts = json!({"choices": [{"message": {"content": [{"type": "text", "text": "ab"}, {"type": "text", "text": "c"}]}}]});
        assert_eq!(completion_text(&parts).as_deref(), Some("abc"));

        assert!(completion_text(&json!({"choices": []})).is_none());
    }
}
