use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ClaudeConfig;
use crate::error::RecipeError;
use crate::processor::CompletionService;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MAX_TOKENS: u32 = 900;

/// Upstream error bodies are cut to this many characters before being echoed.
const DETAIL_LIMIT: usize = 500;

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl ClaudeClient {
    pub fn new(config: &ClaudeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One POST to the messages endpoint. Returns the decoded envelope, not yet reduced to text.
    pub async fn submit_completion(&self, prompt: &str) -> Result<Envelope, RecipeError> {
        let url = format!("{}/v1/messages", self.base_url);
        info!("🔗 Requesting recipe from {} (model {})", url, self.model);

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecipeError::Transport(format!("request timed out: {e}"))
                } else {
                    RecipeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let response_text = response.text().await.map_err(|e| RecipeError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("❌ Completion service error response: {}", response_text);
            return Err(RecipeError::Upstream { status: status.as_u16(), detail: upstream_detail(&response_text) });
        }

        decode_envelope(&response_text)
    }
}

#[async_trait]
impl CompletionService for ClaudeClient {
    async fn complete(&self, prompt: &str) -> Result<String, RecipeError> {
        let envelope = self.submit_completion(prompt).await?;
        extract_text(envelope)
    }
}

// --- Envelope decoding ---

/// The shapes a messages-style response has been seen to carry its text in.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Envelope {
    /// `{"content": [{"type": "text", "text": "..."}, ...]}`
    Blocks { content: Vec<ContentBlock> },
    /// `{"content": {"text": "..."}}`
    Nested { content: NestedText },
    /// `{"completion": "..."}` from the legacy text-completions API.
    Legacy { completion: String },
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct NestedText {
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: String,
    message: String,
}

pub fn decode_envelope(body: &str) -> Result<Envelope, RecipeError> {
    serde_json::from_str(body).map_err(|_| {
        let preview: String = body.chars().take(DETAIL_LIMIT).collect();
        RecipeError::Envelope(format!("unrecognized response shape: {preview}"))
    })
}

pub fn extract_text(envelope: Envelope) -> Result<String, RecipeError> {
    match envelope {
        Envelope::Blocks { content } => {
            let texts: Vec<String> = content
                .into_iter()
                .filter(|block| block.kind.as_deref().map_or(true, |k| k == "text"))
                .filter_map(|block| block.text)
                .collect();
            if texts.is_empty() {
                return Err(RecipeError::Envelope("no text content blocks in response".to_string()));
            }
            Ok(texts.join("\n"))
        }
        Envelope::Nested { content } => Ok(content.text),
        Envelope::Legacy { completion } => Ok(completion),
    }
}

fn upstream_detail(body: &str) -> String {
    let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) if parsed.error.error_type.is_empty() => parsed.error.message,
        Ok(parsed) => format!("{}: {}", parsed.error.error_type, parsed.error.message),
        Err(_) => body.to_string(),
    };
    detail.chars().take(DETAIL_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ClaudeClient {
        let cfg = ClaudeConfig::new("test-key").unwrap().with_base_url(server.uri());
        ClaudeClient::new(&cfg).unwrap()
    }

    #[test]
    fn blocks_are_joined_with_newlines() {
        let env = decode_envelope(
            r#"{"id":"msg_1","content":[{"type":"text","text":"{\"a\":"},{"type":"tool_use","id":"t"},{"type":"text","text":"1}"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(env).unwrap(), "{\"a\":\n1}");
    }

    #[test]
    fn nested_and_legacy_shapes_decode() {
        let nested = decode_envelope(r#"{"content":{"text":"hi"}}"#).unwrap();
        assert_eq!(extract_text(nested).unwrap(), "hi");
        let legacy = decode_envelope(r#"{"completion":" hello","stop_reason":"stop_sequence"}"#).unwrap();
        assert_eq!(extract_text(legacy).unwrap(), " hello");
    }

    #[test]
    fn unknown_shapes_are_envelope_errors() {
        for body in [r#"{"choices":[]}"#, r#"{"content":"plain"}"#, "<html>502</html>", ""] {
            assert!(matches!(decode_envelope(body), Err(RecipeError::Envelope(_))), "body: {body}");
        }
        let empty = decode_envelope(r#"{"content":[{"type":"tool_use"}]}"#).unwrap();
        assert!(matches!(extract_text(empty), Err(RecipeError::Envelope(_))));
    }

    #[test]
    fn upstream_detail_prefers_api_error_message() {
        assert_eq!(
            upstream_detail(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            "overloaded_error: Overloaded"
        );
        assert_eq!(upstream_detail("Service Unavailable"), "Service Unavailable");
        assert_eq!(upstream_detail(&"x".repeat(800)).len(), 500);
    }

    #[tokio::test]
    async fn sends_expected_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-3-5-sonnet-20241022",
                "max_tokens": 900,
                "messages": [{ "role": "user", "content": "prompt text" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "{}" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).complete("prompt text").await.unwrap();
        assert_eq!(text, "{}");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        match client_for(&server).complete("p").await {
            Err(RecipeError::Upstream { status, detail }) => {
                assert_eq!(status, 503);
                assert_eq!(detail, "busy");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_envelope_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(matches!(client_for(&server).complete("p").await, Err(RecipeError::Envelope(_))));
    }

    #[tokio::test]
    async fn slow_service_times_out_as_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let cfg = ClaudeConfig::new("k")
            .unwrap()
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(200));
        let client = ClaudeClient::new(&cfg).unwrap();
        assert!(matches!(client.complete("p").await, Err(RecipeError::Transport(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let cfg = ClaudeConfig::new("k").unwrap().with_base_url("http://127.0.0.1:1");
        let client = ClaudeClient::new(&cfg).unwrap();
        assert!(matches!(client.complete("p").await, Err(RecipeError::Transport(_))));
    }
}
