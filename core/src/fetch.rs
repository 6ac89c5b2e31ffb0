//! Fetch stage: retrieve a document's full text.

use crate::config::FetchConfig;
use anyhow::{anyhow, bail, Result};
use reqwest::blocking::Client;
use reqwest::header;
use scraper::Html;

/// Retrieves the plain text behind a URL.
///
/// Any error means "no body"; the caller falls back to the document description.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Single-attempt HTTP fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()?;
        Ok(Self { client, max_body_bytes: config.max_body_bytes })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            bail!("{url} returned {status}");
        }
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        if let Some(ct) = content_type.as_deref() {
            if !ct.starts_with("text/") {
                bail!("{url} has non-text content type {ct}");
            }
        }
        if resp.content_length().is_some_and(|len| len as usize > self.max_body_bytes) {
            bail!("{url} body exceeds {} bytes", self.max_body_bytes);
        }
        let bytes = resp.bytes()?;
        if bytes.len() > self.max_body_bytes {
            return Err(anyhow!("{url} body exceeds {} bytes", self.max_body_bytes));
        }
        let text = String::from_utf8_lossy(&bytes);
        let is_html = content_type.as_deref().map_or(true, |ct| ct.starts_with("text/html"));
        Ok(if is_html { strip_tags(&text) } else { text.into_owned() })
    }
}

/// Reduce an HTML document to its visible text, one space between text nodes.
pub fn strip_tags(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"));
        let text = text.trim();
        if hidden || text.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(text);
    }
    out
}
