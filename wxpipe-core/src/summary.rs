//! Optional prose summary of a report via an OpenAI-compatible chat endpoint.
//!
//! Summaries are decoration: every failure is folded into the returned text
//! so weather acquisition and output never depend on this call.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::Deserialize;

use crate::http::truncate_body;

pub const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const MISSING_KEY_MESSAGE: &str = "Missing OPENAI_API_KEY environment variable";

const SYSTEM_PROMPT: &str =
    "You are a helpful and friendly weather forecaster writing short reports.";
const USER_PROMPT: &str = "Based on the following structured weather data, write a 3-5 sentence friendly and clear weather summary:\n\n";

#[derive(Debug, Clone)]
pub struct Summarizer {
    api_key: Option<String>,
    http: Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl Summarizer {
    /// A blank key is treated as no key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http: Client::new(),
            endpoint: OPENAI_CHAT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Summarize a forecast digest. Never fails.
    pub async fn summarize(&self, digest: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        match self.complete(api_key, digest).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Summary request failed: {e:#}");
                format!("OpenAI API error: {e:#}")
            }
        }
    }

    async fn complete(&self, api_key: &str, digest: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!("{USER_PROMPT}{digest}")}
            ]
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("status {}: {}", status, truncate_body(&text));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .context("failed to parse chat completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| anyhow!("response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_key_returns_placeholder() {
        let s = Summarizer::new(None);
        assert!(!s.has_credential());
        assert_eq!(s.summarize("anything").await, MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn blank_key_counts_as_missing() {
        let s = Summarizer::new(Some("  ".to_string()));
        assert_eq!(s.summarize("anything").await, MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-3.5-turbo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "  Sunny and warm.  "}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = Summarizer::new(Some("sk-test".to_string()))
            .with_endpoint(format!("{}/v1/chat/completions", server.uri()));

        assert_eq!(s.summarize("Location: Miami").await, "Sunny and warm.");
    }

    #[tokio::test]
    async fn prompt_embeds_digest() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": format!("{USER_PROMPT}Location: Boston")}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let s = Summarizer::new(Some("k".to_string())).with_endpoint(server.uri());
        assert_eq!(s.summarize("Location: Boston").await, "ok");
    }

    #[tokio::test]
    async fn upstream_failure_becomes_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let s = Summarizer::new(Some("k".to_string())).with_endpoint(server.uri());
        let text = s.summarize("digest").await;

        assert!(text.starts_with("OpenAI API error:"));
        assert!(text.contains("429"));
    }

    #[tokio::test]
    async fn empty_choices_becomes_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let s = Summarizer::new(Some("k".to_string()))
            .with_endpoint(server.uri());
        assert!(s.summarize("digest").await.contains("no choices"));
    }
}
