//! OpenRouter chat-completions backend.

use std::time::Duration;

use base64::Engine;
use newsrelay_shared::{NewsRelayError, ReasoningConfig, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::service::{ReasoningRequest, ReasoningService, ServiceError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
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
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`ReasoningService`] backed by an OpenAI-compatible chat completions API.
pub struct OpenRouterService {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterService {
    pub fn new(api_key: String, config: &ReasoningConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NewsRelayError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn headers(&self) -> std::result::Result<HeaderMap, ServiceError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| ServiceError::Fatal("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("X-Title", HeaderValue::from_static("newsrelay"));
        Ok(headers)
    }

    fn build_body<'a>(&'a self, request: &ReasoningRequest) -> ChatRequest<'a> {
        let content = match &request.image {
            None => MessageContent::Text(request.prompt.clone()),
            Some(image) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
                MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: request.prompt.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{encoded}", image.mime_type),
                        },
                    },
                ])
            }
        };

        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        }
    }
}

impl ReasoningService for OpenRouterService {
    async fn complete(
        &self,
        request: &ReasoningRequest,
    ) -> std::result::Result<String, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, image = request.image.is_some(), "chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| ServiceError::Transient(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ServiceError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, message));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Transient(format!("unreadable response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ServiceError::Transient("empty completion".into()))
    }
}

fn classify_status(status: StatusCode, message: String) -> ServiceError {
    let detail = format!("HTTP {status}: {message}");
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ServiceError::Transient(detail)
    } else {
        ServiceError::Fatal(detail)
    }
}
