// src/digest/summarizer.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Turns a post corpus into a formatted HTML digest. Fallible as a whole:
/// callers treat any error as "no digest this round".
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, corpus: &str) -> Result<String>;
}

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

const SYSTEM_PERSONA: &str = "You are an elite intelligence analyst tracking the people who run \
Silicon Valley AI. You cut through noise and surface real industry shifts.";

const INSTRUCTION: &str = "Below is a batch of recent posts from a tracked watchlist, one per \
line in the form `author | link | text`. Write a briefing of the 3-5 most valuable items for a \
product-manager reader. For each item give the source, a short summary, and why it matters. \
Output polished HTML only.";

/// Gemini generateContent client with the search tool enabled.
pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("ai-daily-digest/0.1 (+github.com/insightdata-space/ai-daily-digest)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(90))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    tools: Vec<Tool>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Deserialize)]
struct Resp {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: RespContent,
}

#[derive(Deserialize)]
struct RespContent {
    parts: Option<Vec<RespPart>>,
}

#[derive(Deserialize)]
struct RespPart {
    text: Option<String>,
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, corpus: &str) -> Result<String> {
        let prompt = format!("{INSTRUCTION}\n\n{corpus}");
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SYSTEM_PERSONA,
                }],
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let resp = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .context("summarizer request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("summarizer returned status {status}");
        }
        let body: Resp = resp.json().await.context("summarizer response decode")?;

        let text = body
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content.parts)
            .and_then(|mut p| p.drain(..).next())
            .and_then(|p| p.text);
        let Some(text) = text else {
            bail!("summarizer response missing generated text");
        };

        let html = strip_code_fences(&text);
        if html.is_empty() {
            bail!("summarizer returned empty content");
        }
        Ok(html)
    }
}

/// Models often wrap HTML replies in markdown fences; unwrap them.
fn strip_code_fences(s: &str) -> String {
    s.replace("```html", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fence_wrapping() {
        let wrapped = "```html\n<h1>Digest</h1>\n```";
        assert_eq!(strip_code_fences(wrapped), "<h1>Digest</h1>");
    }

    #[test]
    fn plain_reply_passes_through() {
        assert_eq!(strip_code_fences("<p>ok</p>"), "<p>ok</p>");
    }
}
