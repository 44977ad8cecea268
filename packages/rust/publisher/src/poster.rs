//! Posting API boundary and the X API v2 client.

use std::future::Future;
use std::time::Duration;

use newsrelay_shared::{NewsRelayError, PublicationConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Why a post did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostError {
    /// The API answered with an error status.
    #[error("posting API rejected the message (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("posting API unreachable: {0}")]
    Network(String),

    /// Success status, but the body had no post id.
    #[error("posting API returned an unexpected body: {0}")]
    Malformed(String),
}

/// What the posting API assigned to a successful post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub post_id: String,
}

/// Sends one message to an external channel.
pub trait Poster {
    fn post(
        &self,
        text: &str,
    ) -> impl Future<Output = std::result::Result<PostReceipt, PostError>> + Send;
}

// ---------------------------------------------------------------------------
// X API v2
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    data: Option<CreatedPost>,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
}

/// [`Poster`] for `POST /2/tweets` with an OAuth 2.0 user access token.
pub struct XPoster {
    http: Client,
    token: String,
    endpoint: String,
}

impl XPoster {
    pub fn new(token: String, config: &PublicationConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NewsRelayError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            token,
            endpoint: format!("{}/2/tweets", config.api_base_url.trim_end_matches('/')),
        })
    }
}

impl Poster for XPoster {
    async fn post(&self, text: &str) -> std::result::Result<PostReceipt, PostError> {
        debug!(chars = text.chars().count(), "creating post");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&CreatePost { text })
            .send()
            .await
            .map_err(|e| PostError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PostError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PostError::Network(e.to_string()))?;
        let parsed: CreatePostResponse =
            serde_json::from_str(&body).map_err(|_| PostError::Malformed(body.clone()))?;

        parsed
            .data
            .map(|d| d.id)
            .filter(|id| !id.is_empty())
            .map(|post_id| PostReceipt { post_id })
            .ok_or(PostError::Malformed(body))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn poster(server: &MockServer) -> XPoster {
        let config = PublicationConfig {
            api_base_url: server.uri(),
            ..PublicationConfig::default()
        };
        XPoster::new("user-token".into(), &config).unwrap()
    }

    #[tokio::test]
    async fn post_returns_assigned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header("authorization", "Bearer user-token"))
            .and(body_json(serde_json::json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "data": { "id": "1845000000000000000", "text": "hello" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = poster(&server).post("hello").await.unwrap();
        assert_eq!(receipt.post_id, "1845000000000000000");
    }

    #[tokio::test]
    async fn error_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("duplicate content"))
            .mount(&server)
            .await;

        let err = poster(&server).post("hello").await.unwrap_err();
        assert_eq!(
            err,
            PostError::Rejected {
                status: 403,
                message: "duplicate content".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_id_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"errors": []})))
            .mount(&server)
            .await;

        let err = poster(&server).post("hello").await.unwrap_err();
        assert!(matches!(err, PostError::Malformed(_)));
    }
}
