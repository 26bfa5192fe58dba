//! HTTP download of remote sources.
//!
//! A [`Fetcher`] owns a blocking HTTP client built from an explicit [`FetchConfig`]. Downloads
//! are buffered in memory; archives are additionally spooled through a scratch file that is
//! removed before [`Fetcher::fetch_archive`] returns.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};
use crate::ingestion::archive::{read_archive_from_reader, ArchiveContents};
use crate::ingestion::observability::{ExtractContext, ExtractSeverity};
use crate::ingestion::scratch::ScratchFile;
use crate::ingestion::unified::{read_from_bytes, ExtractOptions, SourceFormat};
use crate::types::Table;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "PostmanRuntime/7.26.10";

/// HTTP client settings.
///
/// `Accept-Encoding` is not configured here: the client always offers gzip, deflate and brotli
/// and decodes the response transparently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Total request timeout in seconds. `None` keeps the HTTP client's default.
    pub timeout_secs: Option<u64>,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
            headers: BTreeMap::from([("Accept".to_string(), "*/*".to_string())]),
        }
    }
}

impl FetchConfig {
    /// Parse a config from JSON. Missing keys take their default values.
    ///
    /// ```
    /// use rust_table_extract::remote::FetchConfig;
    ///
    /// let cfg = FetchConfig::from_json_str(r#"{ "timeout_secs": 15 }"#).unwrap();
    /// assert_eq!(cfg.timeout_secs, Some(15));
    /// assert_eq!(cfg.user_agent, "PostmanRuntime/7.26.10");
    /// ```
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Downloads sources over HTTP GET.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Build a fetcher. Fails with [`ExtractError::RequestBuild`] on an invalid header name or
    /// value, or when the HTTP client cannot be initialized.
    pub fn new(config: FetchConfig) -> ExtractResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ExtractError::RequestBuild {
                    stage: "fetcher_new:001",
                    message: format!("invalid header name '{name}': {e}"),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ExtractError::RequestBuild {
                stage: "fetcher_new:002",
                message: format!("invalid value for header '{name}': {e}"),
            })?;
            headers.insert(header_name, header_value);
        }

        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ExtractError::RequestBuild {
            stage: "fetcher_new:003",
            message: e.to_string(),
        })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download `url` and return the whole response body.
    ///
    /// Non-2xx responses fail with [`ExtractError::UnexpectedStatus`] and their body is
    /// discarded.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn fetch(&self, url: &str) -> ExtractResult<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| ExtractError::RequestBuild {
            stage: "fetch:001",
            message: format!("invalid url '{url}': {e}"),
        })?;

        let resp = self
            .client
            .get(parsed)
            .send()
            .map_err(|source| ExtractError::Transport {
                stage: "fetch:002",
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractError::UnexpectedStatus {
                stage: "fetch:003",
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().map_err(|source| ExtractError::Transport {
            stage: "fetch:004",
            source,
        })?;
        tracing::debug!(bytes = body.len(), "downloaded");
        Ok(body.to_vec())
    }

    /// Download a single delimited or spreadsheet source and decode it as `format`.
    pub fn fetch_table(
        &self,
        url: &str,
        format: SourceFormat,
        options: &ExtractOptions,
    ) -> ExtractResult<Table> {
        let ctx = ExtractContext {
            source: url.to_string(),
            format: Some(format),
        };
        let result = self
            .fetch(url)
            .and_then(|bytes| read_from_bytes(&bytes, format, options));
        options.report(&ctx, &result);
        result
    }

    /// Download a ZIP archive and decode its entries.
    ///
    /// The body is written to a scratch file in [`ExtractOptions::scratch_dir`] named after
    /// `file_name` (directories stripped), read back from disk, and deleted before returning on
    /// both the success and the failure path.
    #[tracing::instrument(level = "info", skip(self, options))]
    pub fn fetch_archive(
        &self,
        url: &str,
        file_name: &str,
        options: &ExtractOptions,
    ) -> ExtractResult<ArchiveContents> {
        let ctx = ExtractContext {
            source: url.to_string(),
            format: None,
        };

        let result = self
            .fetch(url)
            .and_then(|bytes| spool_and_read(&bytes, file_name, options));
        options.report_with(
            &ctx,
            result
                .as_ref()
                .map(|c| c.tables.values().map(Table::row_count).sum()),
            ExtractSeverity::for_error,
        );
        if let Ok(contents) = &result {
            tracing::info!(
                tables = contents.len(),
                failures = contents.failures.len(),
                skipped = contents.skipped.len(),
                "archive fetched"
            );
        }
        result
    }
}

fn spool_and_read(
    bytes: &[u8],
    file_name: &str,
    options: &ExtractOptions,
) -> ExtractResult<ArchiveContents> {
    let scratch = ScratchFile::write(&options.scratch_dir, file_name, bytes)?;
    let read = scratch
        .reopen()
        .and_then(|file| read_archive_from_reader(file, options));
    let closed = scratch.close();

    // A read failure takes precedence over a cleanup failure.
    let contents = read?;
    closed?;
    Ok(contents)
}
