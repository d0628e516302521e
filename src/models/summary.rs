use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repositories::summaries as repo;

/// How much of the original content is kept for audit/preview. The full
/// text is never persisted.
pub const SNIPPET_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: String,
    pub original_snippet: String,
    pub original_length: i64,
    pub summary_text: String,
    pub source_url: Option<String>,
    pub created_at: String,
}

impl SummaryRecord {
    pub fn new(original_content: &str, summary_text: String, source_url: Option<String>) -> Self {
        SummaryRecord {
            id: Uuid::new_v4().to_string(),
            original_snippet: original_content.chars().take(SNIPPET_CHARS).collect(),
            original_length: original_content.chars().count() as i64,
            summary_text,
            source_url,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub struct SummaryRecordService;

impl SummaryRecordService {
    pub async fn create(record: SummaryRecord) -> Result<String, String> {
        repo::create_record(&record).await
    }

    pub async fn list_recent(limit: i64) -> Result<Vec<SummaryRecord>, String> {
        repo::list_recent_records(limit).await
    }
}
