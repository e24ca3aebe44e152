//! TMDB metadata client.
//!
//! Stateless: every call goes to the API. Response shapes are normalized
//! here so callers never have to guess whether a record is a movie or a
//! series from which fields happen to be present.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{TMDB_API_KEY, TmdbConfig};
use crate::error::{CatalogError, Result};
use crate::formats::{CatalogId, MediaKind};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub season_number: u32,
    #[serde(default)]
    pub episode_count: u32,
    pub poster_path: Option<String>,
}

/// Detail record for one title, movie or series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub id: CatalogId,
    pub kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub vote_average: f64,
    pub release_date: String,
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetails {
    pub episode_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub still_path: Option<String>,
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetails {
    #[serde(default)]
    pub episodes: Vec<EpisodeDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieHit {
    pub id: CatalogId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesHit {
    pub id: CatalogId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_air_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<u32>,
}

/// One multi-search result, discriminated by the API's `media_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "media_type", rename_all = "snake_case")]
pub enum SearchHit {
    Movie(MovieHit),
    #[serde(rename = "tv")]
    Series(SeriesHit),
    #[serde(other)]
    Other,
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn details(&self, id: CatalogId, kind: MediaKind) -> Result<TitleDetails>;

    /// Best-effort IMDb id lookup for a movie. `Ok(None)` when the API knows
    /// the title but has no external id.
    async fn external_id(&self, id: CatalogId) -> Result<Option<String>>;

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    async fn season(&self, id: CatalogId, season_number: u32) -> Result<SeasonDetails>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    language: String,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    id: CatalogId,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    overview: Option<String>,
    vote_average: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    number_of_seasons: Option<u32>,
    #[serde(default)]
    seasons: Vec<SeasonSummary>,
}

impl RawDetails {
    fn into_details(self, kind: MediaKind) -> TitleDetails {
        let (title, release_date) = match kind {
            MediaKind::Movie => (self.title.or(self.name), self.release_date),
            MediaKind::Series => (self.name.or(self.title), self.first_air_date),
        };
        TitleDetails {
            id: self.id,
            kind,
            title: title.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            overview: self.overview.unwrap_or_default(),
            vote_average: self.vote_average.unwrap_or_default(),
            release_date: release_date.unwrap_or_default(),
            genres: self.genres,
            runtime: self.runtime,
            number_of_seasons: self.number_of_seasons,
            seasons: self.seasons,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

/// Hits are decoded one by one so a single malformed entry cannot sink the page.
#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl SearchPage {
    fn hits(self) -> Vec<SearchHit> {
        self.results
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<SearchHit>(raw) {
                Ok(hit) => Some(hit),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping undecodable search hit");
                    None
                }
            })
            .collect()
    }
}

/// TMDB sends explicit `null` for empty text fields; treat it like a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| CatalogError::Config(format!("build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CatalogError::missing_env(TMDB_API_KEY))?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CatalogError::Config(format!("invalid metadata api url: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        let path = url.path().to_owned();
        url.query_pairs_mut()
            .append_pair("api_key", api_key)
            .append_pair("language", &self.language)
            .extend_pairs(params);

        let response = self.client.get(url).send().await.map_err(|err| {
            CatalogError::MetadataUnavailable(format!("GET {path}: {}", err.without_url()))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::MetadataUnavailable(format!(
                "GET {path}: status {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| {
                CatalogError::MetadataUnavailable(format!("decode {path}: {}", err.without_url()))
            })
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn details(&self, id: CatalogId, kind: MediaKind) -> Result<TitleDetails> {
        tracing::debug!(id, %kind, "fetching title details");
        let id_segment = id.to_string();
        let collection = match kind {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        };
        let raw: RawDetails = self.get_json(&[collection, id_segment.as_str()], &[]).await?;
        Ok(raw.into_details(kind))
    }

    async fn external_id(&self, id: CatalogId) -> Result<Option<String>> {
        let id_segment = id.to_string();
        let ids: ExternalIds = self
            .get_json(&["movie", id_segment.as_str(), "external_ids"], &[])
            .await?;
        Ok(ids.imdb_id.filter(|v| !v.trim().is_empty()))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        tracing::debug!(query, "searching metadata api");
        let page: SearchPage = self
            .get_json(
                &["search", "multi"],
                &[("query", query), ("include_adult", "false")],
            )
            .await?;
        Ok(page
            .hits()
            .into_iter()
            .filter(|hit| !matches!(hit, SearchHit::Other))
            .collect())
    }

    async fn season(&self, id: CatalogId, season_number: u32) -> Result<SeasonDetails> {
        let id_segment = id.to_string();
        let season_segment = season_number.to_string();
        self.get_json(&["tv", id_segment.as_str(), "season", season_segment.as_str()], &[])
            .await
    }
}
