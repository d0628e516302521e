use std::future::Future;
use std::pin::Pin;

use crate::errors::SummarizeError;
use crate::models::summary::SummaryRecord;

pub type SummarizeBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait GenerationClient: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: String,
    ) -> SummarizeBoxFuture<'a, Result<String, SummarizeError>>;
}

pub trait SummaryStore: Send + Sync {
    fn persist<'a>(
        &'a self,
        record: SummaryRecord,
    ) -> SummarizeBoxFuture<'a, Result<String, String>>;

    fn list_recent<'a>(
        &'a self,
        limit: i64,
    ) -> SummarizeBoxFuture<'a, Result<Vec<SummaryRecord>, String>>;
}
