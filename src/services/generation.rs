use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::config::Config;
use crate::errors::{classify_generation_failure, SummarizeError};
use crate::services::summarize::traits::{GenerationClient, SummarizeBoxFuture};

// Client-level timeout is a backstop; the orchestrator's deadline race is
// what actually bounds the call.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Chat-completions client with fixed decoding parameters. Parameters are
/// held constant for reproducibility of behavior, not of output.
pub struct GenerationHttpClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    top_p: f64,
    max_tokens: i64,
}

impl GenerationHttpClient {
    pub fn from_config() -> Result<Self, SummarizeError> {
        let cfg = Config::get();
        if !cfg.has_generation_credentials() {
            return Err(SummarizeError::Configuration);
        }
        Ok(Self {
            api_key: cfg.openai_api_key.clone(),
            base_url: cfg.openai_base_url.clone(),
            model: cfg.summary_model.clone(),
            temperature: cfg.summary_temperature,
            top_p: cfg.summary_top_p,
            max_tokens: cfg.summary_max_tokens,
        })
    }

    async fn complete(&self, prompt: String) -> Result<String, SummarizeError> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "top_p": self.top_p,
            "max_tokens": self.max_tokens,
        });
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = HTTP_CLIENT
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_generation_failure(Some(status.as_u16()), &body));
        }

        let value: Value = response.json().await?;
        let text = value
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(text)
    }
}

impl GenerationClient for GenerationHttpClient {
    fn generate<'a>(
        &'a self,
        prompt: String,
    ) -> SummarizeBoxFuture<'a, Result<String, SummarizeError>> {
        Box::pin(self.complete(prompt))
    }
}
