//! Scripted service doubles and fixtures for stage tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use newsrelay_classifier::{
    Classifier, ReasoningRequest, ReasoningService, RetryPolicy, ServiceError,
};
use newsrelay_publisher::{PostError, PostReceipt, Poster};
use newsrelay_shared::{AppConfig, FeedSource};
use uuid::Uuid;

type Responder = Box<dyn Fn(&ReasoningRequest) -> Result<String, ServiceError> + Send + Sync>;

/// A [`ReasoningService`] that answers from a closure and records prompts.
pub struct ScriptedService {
    respond: Responder,
    prompts: Mutex<Vec<(String, bool)>>,
}

impl ScriptedService {
    pub fn new(
        respond: impl Fn(&ReasoningRequest) -> Result<String, ServiceError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replay `responses` in order; fails transiently once they run out.
    pub fn sequence(responses: Vec<Result<String, ServiceError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::Transient("script exhausted".into())))
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Number of calls that carried an image.
    pub fn image_calls(&self) -> usize {
        self.prompts.lock().unwrap().iter().filter(|(_, img)| *img).count()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

impl ReasoningService for ScriptedService {
    async fn complete(&self, request: &ReasoningRequest) -> Result<String, ServiceError> {
        self.prompts
            .lock()
            .unwrap()
            .push((request.prompt.clone(), request.image.is_some()));
        (self.respond)(request)
    }
}

/// Classifier over a scripted service with an immediate three-attempt policy.
pub fn scripted_classifier(service: ScriptedService) -> Classifier<ScriptedService> {
    Classifier::new(service, RetryPolicy::immediate(3))
}

/// A [`Poster`] that replays results and records the messages it was given.
pub struct ScriptedPoster {
    results: Mutex<VecDeque<Result<PostReceipt, PostError>>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedPoster {
    pub fn new(results: Vec<Result<PostReceipt, PostError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds every time with ids `post-1`, `post-2`, ...
    pub fn always_ok(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|n| {
                    Ok(PostReceipt {
                        post_id: format!("post-{n}"),
                    })
                })
                .collect(),
        )
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Poster for ScriptedPoster {
    async fn post(&self, text: &str) -> Result<PostReceipt, PostError> {
        self.sent.lock().unwrap().push(text.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PostError::Network("script exhausted".into())))
    }
}

/// Fresh workspace directory under the system temp dir.
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nr_core_{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Config rooted at `root` with no delays and the given feeds.
pub fn test_config(root: &std::path::Path, feeds: Vec<FeedSource>) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.store_file = root.join("records.json");
    config.paths.media_dir = root.join("media");
    config.paths.site_dir = root.join("site");
    config.discovery.call_delay_ms = 0;
    config.enrichment.call_delay_ms = 0;
    config.publication.base_url = "https://user.github.io/site/".into();
    config.feeds = feeds;
    config
}

/// JPEG-looking bytes above the default minimum media size.
pub fn jpeg_bytes(fill: u8) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend(std::iter::repeat_n(fill, 12 * 1024));
    bytes
}
