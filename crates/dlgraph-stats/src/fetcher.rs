//! HTTP client for the statistics endpoints.
//!
//! Follows `Link: <...>; rel="next"` pagination until exhausted and returns
//! the concatenated JSON document.

use dlgraph_common::{timestamped_path, DlGraphError, Result, SnapshotTimestamp};
use dlgraph_config::HttpConfig;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, Url};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Statistics client with an explicit request timeout.
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: Client,
}

impl DataFetcher {
    /// Creates a new data fetcher.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DlGraphError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client })
    }

    /// Fetches every page of `url` and returns the concatenated document.
    ///
    /// Any non-success status, on the first or a later page, fails with
    /// [`DlGraphError::Fetch`] carrying the response body.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Value> {
        let (mut content, mut next) = self.fetch_page(url).await?;
        let mut pages = 1usize;

        while let Some(next_url) = next {
            let (page, following) = self.fetch_page(next_url.as_str()).await?;
            content = concatenate(content, page)?;
            next = following;
            pages += 1;
        }

        info!(pages, "Fetched {}", url);
        Ok(content)
    }

    /// Fetches `url` like [`fetch`](Self::fetch) and, when `raw_base` is
    /// given, writes the document to `<raw_base stem>_<timestamp>.<ext>`.
    pub async fn fetch_and_save(
        &self,
        url: &str,
        raw_base: Option<&Path>,
        timestamp: SnapshotTimestamp,
    ) -> Result<Value> {
        let content = self.fetch(url).await?;

        if let Some(base) = raw_base {
            let path = save_raw(&content, base, timestamp)?;
            info!(path = %path.display(), "Saved raw document");
        }

        Ok(content)
    }

    async fn fetch_page(&self, url: &str) -> Result<(Value, Option<Url>)> {
        debug!("Requesting {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<failed to read response body: {e}>"),
            };
            error!(status = status.as_u16(), "Request to {} failed", url);
            return Err(DlGraphError::fetch(url, status.as_u16(), body));
        }

        let next = next_page_link(response.headers())
            .and_then(|link| response.url().join(&link).ok());
        if let Some(ref next) = next {
            debug!("Next page: {}", next);
        }

        let page = response.json::<Value>().await?;
        Ok((page, next))
    }
}

/// Extracts the `rel="next"` target from `Link` headers.
pub fn next_page_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|entry| {
            let mut parts = entry.split(';');
            let target = parts
                .next()?
                .trim()
                .strip_prefix('<')?
                .strip_suffix('>')?;

            let is_next = parts.any(|param| {
                let Some((key, value)) = param.split_once('=') else {
                    return false;
                };
                key.trim().eq_ignore_ascii_case("rel")
                    && value
                        .trim()
                        .trim_matches('"')
                        .split_whitespace()
                        .any(|rel| rel.eq_ignore_ascii_case("next"))
            });

            is_next.then(|| target.to_string())
        })
}

/// Appends one page to the accumulated document.
///
/// Arrays are extended, objects are merged key-wise.
pub fn concatenate(accumulated: Value, page: Value) -> Result<Value> {
    match (accumulated, page) {
        (Value::Array(mut items), Value::Array(more)) => {
            items.extend(more);
            Ok(Value::Array(items))
        }
        (Value::Object(mut entries), Value::Object(more)) => {
            entries.extend(more);
            Ok(Value::Object(entries))
        }
        (first, other) => Err(DlGraphError::format(format!(
            "cannot concatenate paginated {} with {}",
            kind(&first),
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Writes a raw document next to earlier ones without replacing any of them.
pub fn save_raw(content: &Value, base: &Path, timestamp: SnapshotTimestamp) -> Result<PathBuf> {
    let path = timestamped_path(base, timestamp);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => DlGraphError::SnapshotExists(path.clone()),
            _ => DlGraphError::Io(e),
        })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, content)?;
    writer.flush()?;
    Ok(path)
}
