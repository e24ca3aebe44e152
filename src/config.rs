use std::fmt;

use url::Url;

use crate::error::{CatalogError, Result};

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_JSONBIN_BASE_URL: &str = "https://api.jsonbin.io/v3";
pub const DEFAULT_TMDB_LANGUAGE: &str = "pt-BR";
pub const DEFAULT_FETCH_CONCURRENCY: usize = 16;

pub const TMDB_API_KEY: &str = "TMDB_API_KEY";
pub const JSONBIN_API_KEY: &str = "JSONBIN_API_KEY";
pub const JSONBIN_MOVIES_ID: &str = "JSONBIN_MOVIES_ID";
pub const JSONBIN_SERIES_ID: &str = "JSONBIN_SERIES_ID";

/// Credentials and endpoints for both upstream services.
///
/// Missing credentials or document ids are kept as `None` so the process can
/// start; the operation that needs a value reports `CatalogError::Config`.
#[derive(Clone)]
pub struct CatalogConfig {
    pub tmdb: TmdbConfig,
    pub jsonbin: JsonBinConfig,
    pub fetch_concurrency: usize,
}

#[derive(Clone)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub language: String,
}

#[derive(Clone)]
pub struct JsonBinConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub movies_document: Option<String>,
    pub series_document: Option<String>,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tmdb = TmdbConfig {
            api_key: var(TMDB_API_KEY),
            base_url: parse_base_url(
                "TMDB_BASE_URL",
                &var("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
            )?,
            language: var("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_TMDB_LANGUAGE.to_string()),
        };
        let jsonbin = JsonBinConfig {
            api_key: var(JSONBIN_API_KEY),
            base_url: parse_base_url(
                "JSONBIN_BASE_URL",
                &var("JSONBIN_BASE_URL").unwrap_or_else(|| DEFAULT_JSONBIN_BASE_URL.to_string()),
            )?,
            movies_document: var(JSONBIN_MOVIES_ID),
            series_document: var(JSONBIN_SERIES_ID),
        };

        Ok(Self {
            tmdb,
            jsonbin,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        })
    }

    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }
}

fn parse_base_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|err| CatalogError::Config(format!("invalid {name}={raw:?}: {err}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CatalogError::Config(format!(
            "{name} must be http/https: {raw}"
        )));
    }
    Ok(url)
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() { "<set>" } else { "<unset>" }
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("tmdb", &self.tmdb)
            .field("jsonbin", &self.jsonbin)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish()
    }
}

impl fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url.as_str())
            .field("language", &self.language)
            .finish()
    }
}

impl fmt::Debug for JsonBinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBinConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url.as_str())
            .field("movies_document", &self.movies_document)
            .field("series_document", &self.series_document)
            .finish()
    }
}
