//! AI analysis gateway.
//!
//! [`ChatGateway`] talks to any OpenAI-compatible chat completions endpoint
//! (Gemini, DeepSeek and Qwen all provide one). The rest of the backend only
//! sees the [`AnalysisGateway`] trait.

use async_trait::async_trait;
use cuotiben_core::{OcrResult, PoemAnalysis, WordAnalysis};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AiConfig, Provider};
use crate::services::prompts;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("malformed model output: {0}")]
    Malformed(String),

    #[error("model returned empty content")]
    EmptyOutput,

    #[error("unsupported input: {0}")]
    Unsupported(String),
}

impl GatewayError {
    /// Whether trying again later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Timeout | Self::Network(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::Malformed(_) | Self::EmptyOutput | Self::Unsupported(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Structured analysis backed by a language model.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Analyse a chunk of words. Results may come back in any order.
    async fn analyze_words(&self, words: &[String]) -> Result<Vec<WordAnalysis>, GatewayError>;

    async fn analyze_poem(&self, text: &str) -> Result<PoemAnalysis, GatewayError>;

    /// Recognise words in a base64 image (raw or data URL).
    async fn recognize_words(&self, image: &str) -> Result<OcrResult, GatewayError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Word analyses, either wrapped in `{"words": [...]}` or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WordsPayload {
    Wrapped { words: Vec<WordAnalysis> },
    Bare(Vec<WordAnalysis>),
}

impl WordsPayload {
    fn into_vec(self) -> Vec<WordAnalysis> {
        match self {
            Self::Wrapped { words } | Self::Bare(words) => words,
        }
    }
}

/// Gateway over an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct ChatGateway {
    client: Client,
    provider: Provider,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatGateway {
    pub fn new(config: &AiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            provider: config.provider,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    async fn complete(
        &self,
        model: &str,
        system: &str,
        content: MessageContent<'_>,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(system),
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(
            provider = self.provider.as_str(),
            model, "Calling analysis model"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(
                provider = self.provider.as_str(),
                status = status.as_u16(),
                "Analysis request failed: {}",
                message
            );
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(GatewayError::RateLimited(message));
            }
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GatewayError::EmptyOutput)
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        model: &str,
        system: &str,
        content: MessageContent<'_>,
    ) -> Result<T, GatewayError> {
        let text = self.complete(model, system, content).await?;
        parse_json(&text)
    }
}

#[async_trait]
impl AnalysisGateway for ChatGateway {
    async fn analyze_words(&self, words: &[String]) -> Result<Vec<WordAnalysis>, GatewayError> {
        let prompt = prompts::words_prompt(words);
        let payload: WordsPayload = self
            .complete_json(&self.model, prompts::WORDS_SYSTEM, MessageContent::Text(&prompt))
            .await?;
        Ok(payload.into_vec())
    }

    async fn analyze_poem(&self, text: &str) -> Result<PoemAnalysis, GatewayError> {
        let prompt = prompts::poem_prompt(text);
        self.complete_json(&self.model, prompts::POEM_SYSTEM, MessageContent::Text(&prompt))
            .await
    }

    async fn recognize_words(&self, image: &str) -> Result<OcrResult, GatewayError> {
        let model = self.provider.vision_model().ok_or_else(|| {
            GatewayError::Unsupported(format!(
                "{} cannot read images",
                self.provider.as_str()
            ))
        })?;
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompts::OCR_PROMPT,
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image_data_url(image),
                },
            },
        ]);
        self.complete_json(model, prompts::OCR_SYSTEM, content).await
    }
}

/// Turn raw base64 into a data URL; data URLs pass through.
pub fn image_data_url(image: &str) -> String {
    let image = image.trim();
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", image)
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    serde_json::from_str(strip_json_fences(text)).map_err(|e| GatewayError::Malformed(e.to_string()))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_words_payload_accepts_both_shapes() {
        let wrapped: WordsPayload =
            parse_json(r#"{"words": [{"word": "精益求精", "pinyin": "jīng yì qiú jīng"}]}"#)
                .unwrap();
        let bare: WordsPayload = parse_json(r#"[{"word": "画蛇添足"}]"#).unwrap();
        assert_eq!(wrapped.into_vec()[0].word, "精益求精");
        assert_eq!(bare.into_vec()[0].word, "画蛇添足");
    }

    #[test]
    fn test_malformed_output_is_permanent() {
        let err = parse_json::<WordsPayload>("抱歉，我无法完成").unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::RateLimited(String::new()).is_transient());
        assert!(GatewayError::Timeout.is_transient());
        assert!(GatewayError::Network(String::new()).is_transient());
        assert!(GatewayError::Upstream {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!GatewayError::Upstream {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!GatewayError::EmptyOutput.is_transient());
    }

    #[test]
    fn test_image_data_url() {
        assert_eq!(image_data_url("aGVsbG8="), "data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(
            image_data_url("data:image/png;base64,aGVsbG8="),
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn test_image_request_shape() {
        let message = ChatMessage {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: "read" },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AA==".to_string(),
                    },
                },
            ]),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["content"][0], json!({"type": "text", "text": "read"}));
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(value["content"][1]["image_url"]["url"], "data:image/png;base64,AA==");
    }

    /// Serve a single canned chat completions response on a local port.
    async fn mock_upstream(status: AxumStatus, body: Value) -> String {
        serve(Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        ))
        .await
    }

    /// Answer every OCR request with the requested model name as the only word.
    async fn model_echo_upstream() -> String {
        serve(Router::new().route(
            "/v1/chat/completions",
            post(|Json(request): Json<Value>| async move {
                let model = request["model"].as_str().unwrap_or_default().to_string();
                Json(completion(&json!({ "words": [model] }).to_string()))
            }),
        ))
        .await
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn gateway(base_url: String, provider: Provider) -> ChatGateway {
        ChatGateway::new(&AiConfig {
            provider,
            api_key: "test-key".to_string(),
            base_url,
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[tokio::test]
    async fn test_analyze_words_parses_fenced_output() {
        let content = "```json\n{\"words\": [{\"word\": \"精益求精\", \"pinyin\": \"jīng yì qiú jīng\"}]}\n```";
        let url = mock_upstream(AxumStatus::OK, completion(content)).await;
        let words = gateway(url, Provider::DeepSeek)
            .analyze_words(&["精益求精".to_string()])
            .await
            .unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].pinyin, "jīng yì qiú jīng");
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let url = mock_upstream(
            AxumStatus::TOO_MANY_REQUESTS,
            json!({ "error": { "message": "quota exceeded" } }),
        )
        .await;
        let err = gateway(url, Provider::Gemini)
            .analyze_poem("床前明月光")
            .await
            .unwrap_err();
        match err {
            GatewayError::RateLimited(message) => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_are_empty_output() {
        let url = mock_upstream(AxumStatus::OK, json!({ "choices": [] })).await;
        let err = gateway(url, Provider::Qwen)
            .analyze_words(&["一".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::EmptyOutput));
    }

    #[tokio::test]
    async fn test_deepseek_cannot_read_images() {
        let err = gateway("http://127.0.0.1:9".to_string(), Provider::DeepSeek)
            .recognize_words("aGVsbG8=")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_ocr_uses_vision_model() {
        let url = model_echo_upstream().await;
        let result = gateway(url, Provider::Qwen)
            .recognize_words("aGVsbG8=")
            .await
            .unwrap();
        assert_eq!(result.words, vec!["qwen-vl-plus".to_string()]);
    }
}
