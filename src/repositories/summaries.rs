use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;

use crate::models::summary::SummaryRecord;
use crate::repositories::db::ensure_database;

const COLLECTION: &str = "summaries";

fn normalize_from_doc(doc: &Document) -> Option<SummaryRecord> {
    let id = doc.get_str("id").ok()?.to_string();
    let original_snippet = doc.get_str("original_snippet").ok()?.to_string();
    let original_length = doc.get_i64("original_length").ok()?;
    let summary_text = doc.get_str("summary_text").ok()?.to_string();
    let source_url = doc.get_str("source_url").ok().map(|s| s.to_string());
    let created_at = doc.get_str("created_at").ok().unwrap_or("").to_string();
    Some(SummaryRecord {
        id,
        original_snippet,
        original_length,
        summary_text,
        source_url,
        created_at,
    })
}

pub async fn create_record(record: &SummaryRecord) -> Result<String, String> {
    let db = ensure_database().await?;
    let doc = doc! {
        "id": Bson::String(record.id.clone()),
        "original_snippet": Bson::String(record.original_snippet.clone()),
        "original_length": Bson::Int64(record.original_length),
        "summary_text": Bson::String(record.summary_text.clone()),
        "source_url": record.source_url.clone().map(Bson::String).unwrap_or(Bson::Null),
        "created_at": Bson::String(record.created_at.clone()),
    };
    db.collection::<Document>(COLLECTION)
        .insert_one(doc, None)
        .await
        .map_err(|e| e.to_string())?;
    Ok(record.id.clone())
}

pub async fn list_recent_records(limit: i64) -> Result<Vec<SummaryRecord>, String> {
    let db = ensure_database().await?;
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .build();
    let mut cursor = db
        .collection::<Document>(COLLECTION)
        .find(None, options)
        .await
        .map_err(|e| e.to_string())?;

    let mut records = Vec::new();
    while let Some(doc) = cursor.try_next().await.map_err(|e| e.to_string())? {
        if let Some(record) = normalize_from_doc(&doc) {
            records.push(record);
        }
    }
    Ok(records)
}
