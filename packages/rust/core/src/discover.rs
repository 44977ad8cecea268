//! Discovery stage: feeds in, new `Detected` records out.

use newsrelay_classifier::prompts::relevance_prompt;
use newsrelay_classifier::{Classifier, ReasoningRequest, ReasoningService, RelevanceVerdict};
use newsrelay_discovery::{FeedEntry, FeedReader};
use newsrelay_shared::text::truncate_chars;
use newsrelay_shared::{Classification, Result, WorkItem, require_feeds};
use tracing::{debug, info, instrument, warn};

use crate::context::{StageContext, pause};
use crate::report::DiscoverySummary;

/// Poll every configured feed and store the entries the classifier accepts.
///
/// A feed that fails to fetch or parse is logged and skipped. Entries already
/// tracked are skipped before any classifier call. Irrelevant entries are
/// dropped without a trace in the store.
#[instrument(skip_all, fields(feeds = ctx.config.feeds.len()))]
pub async fn discover<S: ReasoningService>(
    ctx: &StageContext<'_>,
    reader: &FeedReader,
    classifier: &Classifier<S>,
) -> Result<DiscoverySummary> {
    let feeds = require_feeds(ctx.config)?;
    let settings = &ctx.config.discovery;
    let mut records = ctx.store.load()?;
    let mut summary = DiscoverySummary::default();

    ctx.progress.stage("Discovering");

    for feed in feeds {
        summary.feeds_polled += 1;
        let entries = match reader.fetch(&feed.url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(feed = %feed.name, error = %e, "feed skipped");
                summary.feeds_failed += 1;
                continue;
            }
        };

        let total = entries.len();
        for (i, entry) in entries.into_iter().enumerate() {
            summary.entries_seen += 1;
            ctx.progress.item(&entry.title, i + 1, total);

            if records.contains_source(&entry.link) {
                summary.duplicates += 1;
                continue;
            }

            let plain = entry.plain_text();
            let prompt = relevance_prompt(
                &settings.relevance_criteria,
                &entry.title,
                truncate_chars(&plain, settings.prompt_summary_chars),
            );
            let verdict: Option<RelevanceVerdict> =
                classifier.classify(&ReasoningRequest::text(prompt)).await;
            pause(settings.call_delay_ms).await;

            let Some(verdict) = verdict else {
                summary.unclassified += 1;
                continue;
            };
            if !verdict.accepts() {
                debug!(link = %entry.link, "entry judged irrelevant");
                summary.rejected += 1;
                continue;
            }

            let item = new_record(&feed.name, entry, &plain, verdict, settings.summary_chars);
            info!(item_id = %item.id, link = %item.source_identifier, "discovered");
            records.insert(item)?;
            summary.discovered += 1;
        }
    }

    if summary.discovered > 0 {
        ctx.store.save(&mut records)?;
    }

    ctx.progress.finished("Discovering");
    info!(%summary, "discovery complete");
    Ok(summary)
}

fn new_record(
    source_name: &str,
    entry: FeedEntry,
    plain: &str,
    verdict: RelevanceVerdict,
    summary_chars: usize,
) -> WorkItem {
    let subjects = verdict
        .subjects
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let classification = Classification {
        subjects,
        topic: verdict.topic.trim().to_string(),
    };

    let mut item = WorkItem::detected(source_name, entry.link, entry.title, classification);
    item.article_summary = truncate_chars(plain, summary_chars).to_string();
    item.article_image_url = entry.image_url;
    item
}

#[cfg(test)]
mod tests {
    use newsrelay_discovery::FeedOptions;
    use newsrelay_shared::{FeedSource, LifecycleState, NewsRelayError};
    use newsrelay_storage::RecordStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::progress::SilentProgress;
    use crate::testing::{ScriptedService, scripted_classifier, temp_dir, test_config};

    const ONE_ENTRY_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item>
    <title>Alice in the headlines</title>
    <link>https://example.com/a</link>
    <description><![CDATA[<p>Alice did a thing.</p><img src="https://cdn.example.com/a.jpg">]]></description>
  </item>
</channel></rss>"#;

    async fn feed_server(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn relevant(_: &ReasoningRequest) -> std::result::Result<String, newsrelay_classifier::ServiceError> {
        Ok(r#"{"is_relevant": true, "subjects": ["Alice"], "topic": "headlines"}"#.into())
    }

    #[tokio::test]
    async fn second_run_over_same_feed_adds_nothing() {
        let server = feed_server(ONE_ENTRY_FEED).await;
        let root = temp_dir();
        let config = test_config(
            &root,
            vec![FeedSource {
                name: "main".into(),
                url: format!("{}/feed.xml", server.uri()),
            }],
        );
        let store = RecordStore::new(&config.paths.store_file);
        let ctx = StageContext::new(&config, &store, &SilentProgress);
        let reader = FeedReader::new(&FeedOptions::default()).unwrap();
        let classifier = scripted_classifier(ScriptedService::new(relevant));

        let first = discover(&ctx, &reader, &classifier).await.unwrap();
        assert_eq!(first.discovered, 1);

        let records = store.load().unwrap();
        let item = &records.items()[0];
        assert_eq!(item.source_identifier, "https://example.com/a");
        assert_eq!(item.state(), LifecycleState::Detected);
        assert_eq!(item.classification.subjects, vec!["Alice".to_string()]);
        assert_eq!(item.article_image_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(item.article_summary, "Alice did a thing.");

        let before = std::fs::read(store.path()).unwrap();
        let second = discover(&ctx, &reader, &classifier).await.unwrap();
        assert_eq!(second.discovered, 0);
        assert_eq!(second.duplicates, 1);
        // Dedup happens before classification.
        assert_eq!(classifier.service().calls(), 1);
        assert_eq!(std::fs::read(store.path()).unwrap(), before);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn irrelevant_and_unclassified_entries_are_not_stored() {
        let server = feed_server(&std::fs::read_to_string("../../../fixtures/feeds/sample-rss.xml").unwrap()).await;
        let root = temp_dir();
        let config = test_config(
            &root,
            vec![FeedSource {
                name: "main".into(),
                url: format!("{}/feed.xml", server.uri()),
            }],
        );
        let store = RecordStore::new(&config.paths.store_file);
        let ctx = StageContext::new(&config, &store, &SilentProgress);
        let reader = FeedReader::new(&FeedOptions::default()).unwrap();

        let service = ScriptedService::new(|req| {
            if req.prompt.contains("Alice") {
                Ok(r#"{"is_relevant": true, "subjects": ["Alice"], "topic": "argument"}"#.into())
            } else if req.prompt.contains("Bob") {
                Ok(r#"{"is_relevant": true, "subjects": [], "topic": "music"}"#.into())
            } else {
                Ok("not json at all".into())
            }
        });
        let classifier = scripted_classifier(service);

        let summary = discover(&ctx, &reader, &classifier).await.unwrap();
        assert_eq!(summary.entries_seen, 3);
        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.unclassified, 1);
        // 1 + 1 + 3 attempts for the malformed answers
        assert_eq!(classifier.service().calls(), 5);

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records.contains_source("https://example.com/b"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn broken_feed_does_not_stop_the_run() {
        let good = feed_server(ONE_ENTRY_FEED).await;
        let bad = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"))
            .mount(&bad)
            .await;

        let root = temp_dir();
        let config = test_config(
            &root,
            vec![
                FeedSource {
                    name: "broken".into(),
                    url: format!("{}/feed.xml", bad.uri()),
                },
                FeedSource {
                    name: "main".into(),
                    url: format!("{}/feed.xml", good.uri()),
                },
            ],
        );
        let store = RecordStore::new(&config.paths.store_file);
        let ctx = StageContext::new(&config, &store, &SilentProgress);
        let reader = FeedReader::new(&FeedOptions::default()).unwrap();
        let classifier = scripted_classifier(ScriptedService::new(relevant));

        let summary = discover(&ctx, &reader, &classifier).await.unwrap();
        assert_eq!(summary.feeds_failed, 1);
        assert_eq!(summary.discovered, 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn no_feeds_is_fatal() {
        let root = temp_dir();
        let config = test_config(&root, Vec::new());
        let store = RecordStore::new(&config.paths.store_file);
        let ctx = StageContext::new(&config, &store, &SilentProgress);
        let reader = FeedReader::new(&FeedOptions::default()).unwrap();
        let classifier = scripted_classifier(ScriptedService::new(relevant));

        let err = discover(&ctx, &reader, &classifier).await.unwrap_err();
        assert!(matches!(err, NewsRelayError::Config { .. }));
        assert!(!store.path().exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
