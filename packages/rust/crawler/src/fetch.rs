//! HTTP fetching of article pages and media files.

use std::time::Duration;

use newsrelay_shared::{NewsRelayError, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// Default cap on a page or media body (20 MB).
const MAX_BODY_BYTES: u64 = 20 * 1024 * 1024;

/// HTTP settings for page and media requests.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Bodies larger than this are refused.
    pub max_body_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("newsrelay/", env!("CARGO_PKG_VERSION")).into(),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// An article page as served, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL; relative links resolve against this.
    pub url: Url,
    pub html: String,
}

/// A downloaded media file.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

/// Fetches pages and media with one shared client.
pub struct PageFetcher {
    client: Client,
    max_body_bytes: u64,
}

impl PageFetcher {
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| NewsRelayError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_body_bytes: opts.max_body_bytes,
        })
    }

    /// Fetch an article page as text.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let response = self.get(url).await?;
        let final_url = response.url().clone();
        let body = self.read_body(url, response).await?;
        let html = String::from_utf8_lossy(&body).into_owned();

        debug!(bytes = html.len(), final_url = %final_url, "page fetched");
        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }

    /// Download a media file into memory.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn download(&self, url: &Url) -> Result<Download> {
        let response = self.get(url.as_str()).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = self.read_body(url.as_str(), response).await?;

        debug!(bytes = bytes.len(), "media downloaded");
        Ok(Download {
            bytes,
            content_type,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsRelayError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsRelayError::Network(format!("{url}: HTTP {status}")));
        }

        Ok(response)
    }

    /// Read the body chunk by chunk, stopping as soon as it passes the cap.
    ///
    /// `Content-Length` is not trusted; chunked responses carry none.
    async fn read_body(&self, url: &str, mut response: reqwest::Response) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NewsRelayError::Network(format!("{url}: failed to read body: {e}")))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(too_large(url, self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

fn too_large(url: &str, max: u64) -> NewsRelayError {
    NewsRelayError::validation(format!("{url}: response larger than {max} bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_page_returns_html_and_final_url() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/article"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string("<html><body>hi</body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&FetchOptions::default()).unwrap();
        let page = fetcher
            .fetch_page(&format!("{}/article", server.uri()))
            .await
            .unwrap();
        assert!(page.html.contains("hi"));
        assert_eq!(page.url.path(), "/article");
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&FetchOptions::default()).unwrap();
        let url = Url::parse(&format!("{}/missing.jpg", server.uri())).unwrap();
        let err = fetcher.download(&url).await.unwrap_err();
        assert!(matches!(err, NewsRelayError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn download_keeps_bytes_and_content_type() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/a.png"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
            )
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&FetchOptions::default()).unwrap();
        let url = Url::parse(&format!("{}/a.png", server.uri())).unwrap();
        let download = fetcher.download(&url).await.unwrap();
        assert_eq!(download.bytes.len(), 4);
        assert_eq!(download.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn body_over_cap_is_refused() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/big.jpg"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_raw(vec![0u8; 4096], "image/jpeg"),
            )
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/big"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
            .mount(&server)
            .await;

        let opts = FetchOptions {
            max_body_bytes: 1024,
            ..FetchOptions::default()
        };
        let fetcher = PageFetcher::new(&opts).unwrap();

        let url = Url::parse(&format!("{}/big.jpg", server.uri())).unwrap();
        let err = fetcher.download(&url).await.unwrap_err();
        assert!(matches!(err, NewsRelayError::Validation { .. }));

        let err = fetcher
            .fetch_page(&format!("{}/big", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, NewsRelayError::Validation { .. }));
    }

    #[tokio::test]
    async fn body_at_cap_is_kept() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_raw(vec![1u8; 1024], "image/jpeg"),
            )
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&FetchOptions {
            max_body_bytes: 1024,
            ..FetchOptions::default()
        })
        .unwrap();
        let url = Url::parse(&format!("{}/exact.jpg", server.uri())).unwrap();
        assert_eq!(fetcher.download(&url).await.unwrap().bytes.len(), 1024);
    }
}
