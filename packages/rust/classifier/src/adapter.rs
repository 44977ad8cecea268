//! The classifier adapter: one call, one structured verdict, or nothing.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::retry::RetryPolicy;
use crate::service::{ReasoningRequest, ReasoningService, ServiceError};

/// Wraps a [`ReasoningService`] with response parsing and the retry policy.
pub struct Classifier<S> {
    service: S,
    policy: RetryPolicy,
}

impl<S: ReasoningService> Classifier<S> {
    pub fn new(service: S, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Send `request` and parse the answer as `T`.
    ///
    /// A response that does not parse counts as a transient failure. Returns
    /// `None` once the retry budget is spent or on a fatal error; callers skip
    /// the item for this run.
    pub async fn classify<T: DeserializeOwned>(&self, request: &ReasoningRequest) -> Option<T> {
        let mut attempt = 1;
        loop {
            let error = match self.service.complete(request).await {
                Ok(text) => match parse_structured::<T>(&text) {
                    Ok(value) => return Some(value),
                    Err(e) => {
                        debug!(response = %text, "unparseable classifier response");
                        ServiceError::Transient(format!("malformed response: {e}"))
                    }
                },
                Err(e) => e,
            };

            match self.policy.delay_after(attempt, &error) {
                Some(delay) => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "classifier call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!(attempt, error = %error, "classifier call gave no result");
                    return None;
                }
            }
        }
    }
}

/// Parse a response that is bare JSON or JSON inside a fenced code block.
pub fn parse_structured<T: DeserializeOwned>(response: &str) -> serde_json::Result<T> {
    serde_json::from_str(strip_code_fences(response))
}

/// Remove a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        accept: bool,
    }

    /// Replays a fixed list of responses, then fails transiently.
    struct Scripted {
        responses: Mutex<Vec<Result<String, ServiceError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<String, ServiceError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl ReasoningService for Scripted {
        async fn complete(&self, _request: &ReasoningRequest) -> Result<String, ServiceError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ServiceError::Transient("script exhausted".into())))
        }
    }

    fn classifier(responses: Vec<Result<String, ServiceError>>) -> Classifier<Scripted> {
        Classifier::new(Scripted::new(responses), RetryPolicy::immediate(3))
    }

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
        assert_eq!(strip_code_fences("```json{}```"), "{}");
    }

    #[tokio::test]
    async fn parses_fenced_answer() {
        let c = classifier(vec![Ok("```json\n{\"accept\": true}\n```".into())]);
        let v: Option<Verdict> = c.classify(&ReasoningRequest::text("p")).await;
        assert_eq!(v, Some(Verdict { accept: true }));
        assert_eq!(c.service().calls(), 1);
    }

    #[tokio::test]
    async fn malformed_then_valid_within_budget() {
        let c = classifier(vec![
            Ok("I think yes".into()),
            Err(ServiceError::RateLimited { retry_after: None }),
            Ok("{\"accept\": false}".into()),
        ]);
        let v: Option<Verdict> = c.classify(&ReasoningRequest::text("p")).await;
        assert_eq!(v, Some(Verdict { accept: false }));
        assert_eq!(c.service().calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_yields_none() {
        let c = classifier(vec![
            Err(ServiceError::Transient("timeout".into())),
            Err(ServiceError::Transient("timeout".into())),
            Err(ServiceError::Transient("timeout".into())),
            Ok("{\"accept\": true}".into()),
        ]);
        let v: Option<Verdict> = c.classify(&ReasoningRequest::text("p")).await;
        assert_eq!(v, None);
        assert_eq!(c.service().calls(), 3);
    }

    #[tokio::test]
    async fn fatal_stops_immediately() {
        let c = classifier(vec![
            Err(ServiceError::Fatal("401".into())),
            Ok("{\"accept\": true}".into()),
        ]);
        let v: Option<Verdict> = c.classify(&ReasoningRequest::text("p")).await;
        assert_eq!(v, None);
        assert_eq!(c.service().calls(), 1);
    }
}
