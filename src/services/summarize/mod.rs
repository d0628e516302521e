use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::core::deadline::{with_deadline, TimedOut};
use crate::core::validation::SummaryRequest;
use crate::errors::SummarizeError;
use crate::models::summary::{SummaryRecord, SummaryRecordService};

pub mod traits;

use self::traits::{GenerationClient, SummarizeBoxFuture, SummaryStore};

pub const GENERATION_DEADLINE: Duration = Duration::from_secs(10);
pub const PERSIST_DEADLINE: Duration = Duration::from_secs(5);
pub const READ_DEADLINE: Duration = Duration::from_secs(8);

pub const TRUNCATION_LIMIT_CHARS: usize = 3000;
pub const TRUNCATION_MARKER: &str = "... [content truncated for optimal processing]";

const SUMMARY_PROMPT: &str = "Please provide a concise 2-3 paragraph summary of the following blog post. Focus on the main ideas, key points, and overall message.\n\nBlog Content:\n{{content}}\n\nSummary:";

#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    pub generation_deadline: Duration,
    pub persist_deadline: Duration,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            generation_deadline: GENERATION_DEADLINE,
            persist_deadline: PERSIST_DEADLINE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizeOutcome {
    pub summary_text: String,
    pub persisted: bool,
    pub persisted_id: Option<String>,
    pub original_length: usize,
    pub elapsed_ms: u128,
}

/// Builds the prompt sent to the generation service. Content over the
/// truncation limit is cut to its first characters with an explicit marker,
/// trading summary completeness for a latency/cost bound.
pub fn prepare_prompt(content: &str) -> (String, bool) {
    let truncated = content.chars().count() > TRUNCATION_LIMIT_CHARS;
    let prepared = if truncated {
        let head: String = content.chars().take(TRUNCATION_LIMIT_CHARS).collect();
        format!("{head}{TRUNCATION_MARKER}")
    } else {
        content.to_string()
    };
    (SUMMARY_PROMPT.replace("{{content}}", &prepared), truncated)
}

/// End-to-end summary flow: prepare prompt, call the generation service
/// under its deadline, then attempt persistence as a best-effort side
/// effect under a shorter deadline. A persistence failure never converts a
/// successful generation into a failed request; `persisted` reports the
/// real outcome either way. One attempt per dependency, no retries.
pub async fn summarize(
    generation: Arc<dyn GenerationClient>,
    store: Arc<dyn SummaryStore>,
    request: SummaryRequest,
    options: &SummarizeOptions,
) -> Result<SummarizeOutcome, SummarizeError> {
    let started = Instant::now();
    let original_length = request.content.chars().count();

    let (prompt, truncated) = prepare_prompt(&request.content);
    if truncated {
        info!(original_length, "content truncated for generation");
    }

    let generation_call = {
        let generation = generation.clone();
        async move { generation.generate(prompt).await }
    };
    let summary_text = match with_deadline(generation_call, options.generation_deadline).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            warn!(elapsed_ms = %started.elapsed().as_millis(), error = %err, "generation failed");
            return Err(err);
        }
        Err(TimedOut) => {
            warn!(elapsed_ms = %started.elapsed().as_millis(), "generation exceeded deadline");
            return Err(SummarizeError::GenerationTimeout);
        }
    };
    if summary_text.trim().is_empty() {
        warn!(elapsed_ms = %started.elapsed().as_millis(), "generation returned no usable text");
        return Err(SummarizeError::EmptyGeneration);
    }

    let record = SummaryRecord::new(
        &request.content,
        summary_text.clone(),
        request.source_url.clone(),
    );
    let persist_call = {
        let store = store.clone();
        async move { store.persist(record).await }
    };
    let (persisted, persisted_id) = match with_deadline(persist_call, options.persist_deadline).await
    {
        Ok(Ok(id)) => (true, Some(id)),
        Ok(Err(err)) => {
            warn!(error = %err, "summary persist failed (non-critical)");
            (false, None)
        }
        Err(TimedOut) => {
            warn!("summary persist timed out (non-critical)");
            (false, None)
        }
    };

    let elapsed_ms = started.elapsed().as_millis();
    info!(elapsed_ms = %elapsed_ms, persisted, original_length, "summary request completed");

    Ok(SummarizeOutcome {
        summary_text,
        persisted,
        persisted_id,
        original_length,
        elapsed_ms,
    })
}

/// Read side of the store, bounded by its own deadline so a hung read
/// cannot block the handler.
pub async fn recent_summaries(
    store: Arc<dyn SummaryStore>,
    limit: i64,
    deadline: Duration,
) -> Result<Vec<SummaryRecord>, String> {
    let read_call = {
        let store = store.clone();
        async move { store.list_recent(limit).await }
    };
    match with_deadline(read_call, deadline).await {
        Ok(result) => result,
        Err(TimedOut) => Err("Database timeout".to_string()),
    }
}

/// Store adapter backed by the shared MongoDB connection cache.
pub struct MongoSummaryStore;

impl SummaryStore for MongoSummaryStore {
    fn persist<'a>(
        &'a self,
        record: SummaryRecord,
    ) -> SummarizeBoxFuture<'a, Result<String, String>> {
        Box::pin(async move { SummaryRecordService::create(record).await })
    }

    fn list_recent<'a>(
        &'a self,
        limit: i64,
    ) -> SummarizeBoxFuture<'a, Result<Vec<SummaryRecord>, String>> {
        Box::pin(async move { SummaryRecordService::list_recent(limit).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::core::validation::SummaryRequest;
    use crate::errors::classify_generation_failure;

    struct MockGeneration {
        response: Result<String, u16>,
        delay: Duration,
        prompts: Mutex<Vec<String>>,
    }

    impl MockGeneration {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn slow(text: &str, delay: Duration) -> Self {
            Self {
                response: Ok(text.to_string()),
                delay,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl GenerationClient for MockGeneration {
        fn generate<'a>(
            &'a self,
            prompt: String,
        ) -> SummarizeBoxFuture<'a, Result<String, SummarizeError>> {
            Box::pin(async move {
                self.prompts.lock().unwrap().push(prompt);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                match &self.response {
                    Ok(text) => Ok(text.clone()),
                    Err(status) => Err(classify_generation_failure(Some(*status), "upstream error")),
                }
            })
        }
    }

    struct MockStore {
        fail: bool,
        delay: Duration,
        persist_calls: AtomicUsize,
    }

    impl MockStore {
        fn ok() -> Self {
            Self {
                fail: false,
                delay: Duration::ZERO,
                persist_calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                delay: Duration::ZERO,
                persist_calls: AtomicUsize::new(0),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                fail: false,
                delay,
                persist_calls: AtomicUsize::new(0),
            }
        }
    }

    impl SummaryStore for MockStore {
        fn persist<'a>(
            &'a self,
            record: SummaryRecord,
        ) -> SummarizeBoxFuture<'a, Result<String, String>> {
            Box::pin(async move {
                self.persist_calls.fetch_add(1, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                if self.fail {
                    Err("write refused".to_string())
                } else {
                    Ok(record.id)
                }
            })
        }

        fn list_recent<'a>(
            &'a self,
            _limit: i64,
        ) -> SummarizeBoxFuture<'a, Result<Vec<SummaryRecord>, String>> {
            Box::pin(async move {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                if self.fail {
                    Err("read refused".to_string())
                } else {
                    Ok(Vec::new())
                }
            })
        }
    }

    fn request(content: String) -> SummaryRequest {
        SummaryRequest {
            content,
            source_url: None,
        }
    }

    fn short_deadlines() -> SummarizeOptions {
        SummarizeOptions {
            generation_deadline: Duration::from_millis(50),
            persist_deadline: Duration::from_millis(50),
        }
    }

    #[test]
    fn truncates_only_over_the_limit() {
        let content = "A".repeat(60);
        let (prompt, truncated) = prepare_prompt(&content);
        assert!(!truncated);
        assert!(prompt.contains(&content));
        assert!(!prompt.contains(TRUNCATION_MARKER));

        let content = "A".repeat(3000);
        let (_, truncated) = prepare_prompt(&content);
        assert!(!truncated);

        let content = "A".repeat(3001);
        let (prompt, truncated) = prepare_prompt(&content);
        assert!(truncated);
        let expected = format!("{}{}", "A".repeat(3000), TRUNCATION_MARKER);
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"A".repeat(3001)));
    }

    #[tokio::test]
    async fn returns_summary_and_persists() {
        let generation = Arc::new(MockGeneration::ok("a fine summary"));
        let store = Arc::new(MockStore::ok());

        let outcome = summarize(
            generation.clone(),
            store.clone(),
            request("A".repeat(60)),
            &SummarizeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.summary_text, "a fine summary");
        assert!(outcome.persisted);
        assert!(outcome.persisted_id.is_some());
        assert_eq!(outcome.original_length, 60);
        assert_eq!(store.persist_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generation_timeout_is_not_a_hang() {
        let generation = Arc::new(MockGeneration::slow("late", Duration::from_secs(5)));
        let store = Arc::new(MockStore::ok());

        let started = Instant::now();
        let err = summarize(
            generation,
            store.clone(),
            request("A".repeat(60)),
            &short_deadlines(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SummarizeError::GenerationTimeout));
        assert!(started.elapsed() < Duration::from_secs(2));
        // No record may exist for a failed generation.
        assert_eq!(store.persist_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persistence_failure_never_fails_the_request() {
        let generation = Arc::new(MockGeneration::ok("a fine summary"));
        let store = Arc::new(MockStore::failing());

        let outcome = summarize(
            generation,
            store,
            request("A".repeat(60)),
            &SummarizeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.summary_text, "a fine summary");
        assert!(!outcome.persisted);
        assert_eq!(outcome.persisted_id, None);
    }

    #[tokio::test]
    async fn slow_persistence_is_reported_honestly() {
        let generation = Arc::new(MockGeneration::ok("a fine summary"));
        let store = Arc::new(MockStore::slow(Duration::from_secs(5)));

        let started = Instant::now();
        let outcome = summarize(
            generation,
            store,
            request("A".repeat(60)),
            &short_deadlines(),
        )
        .await
        .unwrap();

        assert!(!outcome.persisted);
        assert_eq!(outcome.summary_text, "a fine summary");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn rate_limit_is_surfaced_as_rate_limit() {
        let generation = Arc::new(MockGeneration::failing(429));
        let store = Arc::new(MockStore::ok());

        let err = summarize(
            generation,
            store,
            request("A".repeat(60)),
            &SummarizeOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SummarizeError::RateLimited));
    }

    #[tokio::test]
    async fn blank_generation_is_an_empty_result() {
        let generation = Arc::new(MockGeneration::ok("   "));
        let store = Arc::new(MockStore::ok());

        let err = summarize(
            generation,
            store.clone(),
            request("A".repeat(60)),
            &SummarizeOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SummarizeError::EmptyGeneration));
        assert_eq!(store.persist_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prompt_carries_the_template_and_content() {
        let generation = Arc::new(MockGeneration::ok("summary"));
        let store = Arc::new(MockStore::ok());

        summarize(
            generation.clone(),
            store,
            request("A".repeat(60)),
            &SummarizeOptions::default(),
        )
        .await
        .unwrap();

        let prompts = generation.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Please provide a concise 2-3 paragraph summary"));
        assert!(prompts[0].contains(&"A".repeat(60)));
    }

    #[tokio::test]
    async fn recent_summaries_times_out_cleanly() {
        let store = Arc::new(MockStore::slow(Duration::from_secs(5)));
        let err = recent_summaries(store, 20, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err, "Database timeout");

        let store = Arc::new(MockStore::ok());
        let records = recent_summaries(store, 20, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
