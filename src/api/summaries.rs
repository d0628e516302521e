use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::Config;
use crate::core::validation::validate_summary_request;
use crate::errors::SummarizeError;
use crate::services::generation::GenerationHttpClient;
use crate::services::summarize::traits::{GenerationClient, SummaryStore};
use crate::services::summarize::{
    recent_summaries, summarize, MongoSummaryStore, SummarizeOptions, READ_DEADLINE,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    summary_text: String,
    persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    persisted_id: Option<String>,
    original_length: usize,
    elapsed_ms: u64,
}

pub fn router() -> Router {
    Router::new().route("/api/summary", get(list_summaries).post(create_summary))
}

fn error_body(err: &SummarizeError) -> (StatusCode, Json<Value>) {
    (err.status(), Json(json!({ "error": err.public_message() })))
}

async fn create_summary(body: Bytes) -> (StatusCode, Json<Value>) {
    let parsed: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    let request = match validate_summary_request(parsed.as_ref()) {
        Ok(request) => request,
        Err(err) => return error_body(&SummarizeError::from(err)),
    };
    info!(
        content_chars = request.content.chars().count(),
        "summary request accepted"
    );

    let generation = match GenerationHttpClient::from_config() {
        Ok(client) => Arc::new(client) as Arc<dyn GenerationClient>,
        Err(err) => {
            error!("generation client unavailable: {err}");
            return error_body(&err);
        }
    };
    let store = Arc::new(MongoSummaryStore) as Arc<dyn SummaryStore>;

    match summarize(generation, store, request, &SummarizeOptions::default()).await {
        Ok(outcome) => {
            let response = SummaryResponse {
                summary_text: outcome.summary_text,
                persisted: outcome.persisted,
                persisted_id: outcome.persisted_id,
                original_length: outcome.original_length,
                elapsed_ms: outcome.elapsed_ms as u64,
            };
            (
                StatusCode::OK,
                Json(serde_json::to_value(response).unwrap_or(Value::Null)),
            )
        }
        Err(err) => error_body(&err),
    }
}

async fn list_summaries() -> (StatusCode, Json<Value>) {
    let store = Arc::new(MongoSummaryStore) as Arc<dyn SummaryStore>;
    let limit = Config::get().recent_limit;

    match recent_summaries(store, limit, READ_DEADLINE).await {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::to_value(records).unwrap_or(Value::Null)),
        ),
        Err(err) => {
            error!("failed to fetch summaries: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch summaries" })),
            )
        }
    }
}
