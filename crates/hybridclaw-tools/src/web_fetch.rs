//! `web_fetch` — fetches a URL and extracts its content as markdown, text,
//! or pretty-printed JSON, guarded against SSRF and cached briefly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use hybridclaw_core::http::SafeDnsResolver;
use serde_json::Value;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

const DEFAULT_MAX_CHARS: usize = 50_000;
const MAX_MAX_CHARS: usize = 50_000;
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const MAX_REDIRECTS: usize = 5;
const CACHE_TTL: Duration = Duration::from_secs(15 * 60);
const CACHE_CAPACITY: usize = 100;

#[derive(Clone)]
struct CacheEntry {
    body: String,
    extractor: &'static str,
    stored_at: Instant,
}

/// A small TTL cache of fetched-and-extracted page bodies, keyed by
/// `url|extractMode|maxChars`, shared across every `web_fetch` call in the
/// container's lifetime.
#[derive(Clone)]
pub(crate) struct FetchCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl FetchCache {
    pub(crate) fn new() -> Self {
        Self { entries: Arc::new(DashMap::new()) }
    }

    fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() > CACHE_TTL {
            drop(entry);
            self.entries.remove(key);
            None
        } else {
            Some(entry.clone())
        }
    }

    fn put(&self, key: String, body: String, extractor: &'static str) {
        if self.entries.len() >= CACHE_CAPACITY && !self.entries.contains_key(&key) {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|e| e.stored_at)
                .map(|e| e.key().clone())
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, CacheEntry { body, extractor, stored_at: Instant::now() });
    }
}

pub(crate) fn validate_url(raw: &str) -> Result<url::Url, ToolError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("invalid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ToolError::InvalidArguments(format!("unsupported URL scheme: {other}"))),
    }
}

/// Built-in tool for fetching and extracting a URL's content.
pub struct WebFetchTool;

#[async_trait::async_trait]
impl BuiltinTool for WebFetchTool {
    fn name(&self) -> &'static str {
        "web_fetch"
    }

    fn description(&self) -> &'static str {
        "Fetches a URL and returns its content as markdown or text (HTML is converted, JSON is \
         pretty-printed). Blocks localhost and private-network addresses. Results are cached for \
         15 minutes. Maximum 50000 characters."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "http or https URL to fetch" },
                "extractMode": {
                    "type": "string",
                    "enum": ["markdown", "text"],
                    "description": "How to render HTML content (default markdown)"
                },
                "maxChars": {
                    "type": "integer",
                    "description": "Maximum characters to return (default 50000, max 50000)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let url_str = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("url is required".into()))?;
        let url = validate_url(url_str)?;

        let extract_mode = args.get("extractMode").and_then(Value::as_str).unwrap_or("markdown");
        if extract_mode != "markdown" && extract_mode != "text" {
            return Err(ToolError::InvalidArguments(format!("unknown extractMode: {extract_mode}")));
        }

        let max_chars = args
            .get("maxChars")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_MAX_CHARS, |n| (n as usize).min(MAX_MAX_CHARS));

        let cache_key = format!("{url}|{extract_mode}|{max_chars}");
        if let Some(cached) = ctx.fetch_cache.get(&cache_key) {
            return Ok(render(&cached.body, cached.extractor, max_chars, true));
        }

        let (extracted, extractor) = fetch_and_extract(url.clone(), extract_mode).await?;
        ctx.fetch_cache.put(cache_key, extracted.clone(), extractor);
        Ok(render(&extracted, extractor, max_chars, false))
    }
}

fn render(body: &str, extractor: &'static str, max_chars: usize, cached: bool) -> String {
    let (shown, truncated) = if body.chars().count() > max_chars {
        (crate::truncate_at_char_boundary(body, max_chars), true)
    } else {
        (body.to_string(), false)
    };

    let mut out = shown;
    let mut trailer = Vec::new();
    if truncated {
        trailer.push(format!("truncated at {max_chars} chars"));
    }
    trailer.push(format!("extractor: {extractor}"));
    if cached {
        trailer.push("cached".to_string());
    }
    out.push_str(&format!("\n\n[{}]", trailer.join(", ")));
    out
}

async fn fetch_and_extract(url: url::Url, extract_mode: &str) -> Result<(String, &'static str), ToolError> {
    let client = reqwest::Client::builder()
        .dns_resolver(Arc::new(SafeDnsResolver))
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .user_agent("hybridclaw-agent/0.1")
        .build()
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

    let mut current = url;
    for _ in 0..=MAX_REDIRECTS {
        let response = client
            .get(current.clone())
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("fetch failed: {e}")))?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ToolError::ExecutionFailed("redirect with no Location header".into()))?;
            current = current
                .join(location)
                .map_err(|e| ToolError::ExecutionFailed(format!("invalid redirect target: {e}")))?;
            validate_url(current.as_str())?;
            continue;
        }

        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed(format!("HTTP {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("reading body failed: {e}")))?;
        if bytes.len() > MAX_BODY_BYTES {
            return Err(ToolError::ExecutionFailed(format!(
                "response body exceeds {MAX_BODY_BYTES} bytes"
            )));
        }
        let body = String::from_utf8_lossy(&bytes).to_string();

        return Ok(extract(&body, &content_type, extract_mode));
    }

    Err(ToolError::ExecutionFailed(format!("too many redirects (max {MAX_REDIRECTS})")))
}

fn extract(body: &str, content_type: &str, extract_mode: &str) -> (String, &'static str) {
    if content_type.contains("json") {
        let pretty = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| body.to_string());
        return (pretty, "json");
    }

    if content_type.contains("html") {
        let width = if extract_mode == "text" { 10_000 } else { 100 };
        return (html2text::from_read(body.as_bytes(), width), "html2text");
    }

    (body.to_string(), "raw")
}
