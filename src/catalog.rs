//! Joins remote-store presence data with metadata enrichment.
//!
//! The remote store decides which titles exist; the metadata API only
//! decorates them. A title missing from the store is never emitted, and a
//! title whose metadata cannot be fetched is dropped from listings without
//! failing the rest.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::cache::DocumentCache;
use crate::config::{
    CatalogConfig, DEFAULT_FETCH_CONCURRENCY, JSONBIN_MOVIES_ID, JSONBIN_SERIES_ID,
};
use crate::error::{CatalogError, Result};
use crate::formats::{
    CatalogId, CatalogItem, EpisodeListing, MediaKind, MovieUrlMap, OrderedMap, PlaybackTarget,
    SeasonListing, SeriesEpisodeMap, SeriesRecord,
};
use crate::metadata::{MetadataSource, SearchHit, TitleDetails, TmdbClient};
use crate::remote_store::{JsonBinClient, RemoteStore};

/// Queries shorter than this never reach the metadata API.
pub const MIN_SEARCH_CHARS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CatalogDocuments {
    pub movies: Option<String>,
    pub series: Option<String>,
}

pub struct Catalog {
    movies: DocumentCache<MovieUrlMap>,
    series: DocumentCache<SeriesEpisodeMap>,
    metadata: Arc<dyn MetadataSource>,
    fetch_concurrency: usize,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        metadata: Arc<dyn MetadataSource>,
        documents: CatalogDocuments,
    ) -> Self {
        Self {
            movies: DocumentCache::new(JSONBIN_MOVIES_ID, documents.movies, Arc::clone(&store)),
            series: DocumentCache::new(JSONBIN_SERIES_ID, documents.series, store),
            metadata,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let store = Arc::new(JsonBinClient::new(&config.jsonbin)?);
        let metadata = Arc::new(TmdbClient::new(&config.tmdb)?);
        let documents = CatalogDocuments {
            movies: config.jsonbin.movies_document.clone(),
            series: config.jsonbin.series_document.clone(),
        };
        Ok(Self::new(store, metadata, documents).with_fetch_concurrency(config.fetch_concurrency))
    }

    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.movies = self.movies.with_ttl(ttl);
        self.series = self.series.with_ttl(ttl);
        self
    }

    /// Every title present in the remote store, most recently added first.
    ///
    /// Movies precede series in store order before the whole sequence is
    /// reversed, so the last series added comes out first.
    pub async fn list_all(&self) -> Result<Vec<CatalogItem>> {
        let (movies, series) = tokio::try_join!(self.movies.get(), self.series.get())?;

        let mut targets: Vec<(CatalogId, MediaKind)> = document_ids(&movies)
            .into_iter()
            .map(|id| (id, MediaKind::Movie))
            .collect();
        targets.extend(
            document_ids(&series)
                .into_iter()
                .map(|id| (id, MediaKind::Series)),
        );

        let mut items = self.enrich_all(targets).await?;
        items.reverse();
        Ok(items)
    }

    /// The length threshold applies to the query as given; surrounding
    /// whitespace is only stripped before it is sent upstream.
    pub async fn search(&self, query: &str) -> Result<Vec<CatalogItem>> {
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let (movies, series, hits) = tokio::try_join!(
            self.movies.get(),
            self.series.get(),
            self.metadata.search(query)
        )?;
        let movie_ids: HashSet<CatalogId> = document_ids(&movies).into_iter().collect();
        let series_ids: HashSet<CatalogId> = document_ids(&series).into_iter().collect();

        let mut seen = HashSet::new();
        let items: Vec<CatalogItem> = hits
            .into_iter()
            .filter_map(|hit| match hit {
                SearchHit::Movie(hit) if movie_ids.contains(&hit.id) => Some(CatalogItem {
                    id: hit.id,
                    external_id: None,
                    title: hit.title,
                    poster_path: hit.poster_path,
                    backdrop_path: hit.backdrop_path,
                    overview: hit.overview,
                    rating: hit.vote_average,
                    release_date: hit.release_date,
                    kind: MediaKind::Movie,
                    genre_ids: hit.genre_ids,
                    has_playable_source: true,
                }),
                SearchHit::Series(hit) if series_ids.contains(&hit.id) => Some(CatalogItem {
                    id: hit.id,
                    external_id: None,
                    title: hit.name,
                    poster_path: hit.poster_path,
                    backdrop_path: hit.backdrop_path,
                    overview: hit.overview,
                    rating: hit.vote_average,
                    release_date: hit.first_air_date,
                    kind: MediaKind::Series,
                    genre_ids: hit.genre_ids,
                    has_playable_source: true,
                }),
                _ => None,
            })
            .filter(|item| seen.insert((item.id, item.kind)))
            .collect();

        tracing::debug!(query, results = items.len(), "catalog search");
        Ok(items)
    }

    pub async fn details(&self, id: CatalogId, kind: MediaKind) -> Result<TitleDetails> {
        self.metadata.details(id, kind).await
    }

    pub async fn series_episodes(&self, id: CatalogId) -> Result<SeriesRecord> {
        let series = self.series.get().await?;
        lookup(&series, id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("series {id}")))
    }

    pub async fn movie_url(&self, id: CatalogId) -> Result<String> {
        self.playable_url(id, PlaybackTarget::Movie).await
    }

    pub async fn playable_url(&self, id: CatalogId, target: PlaybackTarget) -> Result<String> {
        match target {
            PlaybackTarget::Movie => {
                let movies = self.movies.get().await?;
                lookup(&movies, id)
                    .cloned()
                    .ok_or_else(|| CatalogError::NotFound(format!("movie {id}")))
            }
            PlaybackTarget::Episode { season, episode } => {
                let series = self.series.get().await?;
                let record = lookup(&series, id)
                    .ok_or_else(|| CatalogError::NotFound(format!("series {id}")))?;
                record
                    .episode_url(season, episode)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        CatalogError::NotFound(format!(
                            "series {id} season {season} episode {episode}"
                        ))
                    })
            }
        }
    }

    /// Episode URLs for one season, decorated with episode metadata when the
    /// metadata API has it.
    pub async fn season_listing(&self, id: CatalogId, season: u32) -> Result<SeasonListing> {
        let series = self.series.get().await?;
        let record =
            lookup(&series, id).ok_or_else(|| CatalogError::NotFound(format!("series {id}")))?;
        let urls = record
            .seasons
            .get(&season.to_string())
            .ok_or_else(|| CatalogError::NotFound(format!("series {id} season {season}")))?;

        let episode_details = match self.metadata.season(id, season).await {
            Ok(details) => details.episodes,
            Err(err @ CatalogError::Config(_)) => return Err(err),
            Err(err) => {
                tracing::debug!(id, season, error = %err, "season metadata unavailable");
                Vec::new()
            }
        };

        let episodes = urls
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let episode_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
                let details = episode_details
                    .iter()
                    .find(|e| e.episode_number == episode_number);
                EpisodeListing {
                    episode_number,
                    url: url.clone(),
                    name: details.map(|e| e.name.clone()),
                    overview: details.map(|e| e.overview.clone()),
                    still_path: details.and_then(|e| e.still_path.clone()),
                    air_date: details.and_then(|e| e.air_date.clone()),
                }
            })
            .collect();

        Ok(SeasonListing {
            series_id: id,
            title: record.title.clone(),
            season_number: season,
            episodes,
        })
    }

    /// Per-title metadata failures drop that title; a configuration error
    /// fails the whole listing since every title would hit it.
    async fn enrich_all(
        &self,
        targets: Vec<(CatalogId, MediaKind)>,
    ) -> Result<Vec<CatalogItem>> {
        let total = targets.len();
        let concurrency = self.fetch_concurrency.max(1).min(total.max(1));

        let mut join_set = JoinSet::new();
        let mut next_idx = 0usize;
        let mut results: Vec<Option<CatalogItem>> = vec![None; total];
        let mut failed = 0usize;

        while next_idx < total || !join_set.is_empty() {
            while next_idx < total && join_set.len() < concurrency {
                let index = next_idx;
                let (id, kind) = targets[index];
                let metadata = Arc::clone(&self.metadata);
                join_set.spawn(async move {
                    let item = enrich(metadata.as_ref(), id, kind).await;
                    (index, id, kind, item)
                });
                next_idx += 1;
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok((index, _, _, Ok(item))) => results[index] = Some(item),
                Ok((_, _, _, Err(err @ CatalogError::Config(_)))) => {
                    join_set.abort_all();
                    return Err(err);
                }
                Ok((_, id, kind, Err(err))) => {
                    failed += 1;
                    tracing::warn!(id, %kind, error = %err, "skipping title: metadata fetch failed");
                }
                Err(err) => {
                    failed += 1;
                    tracing::error!(?err, "metadata task aborted");
                }
            }
        }

        if failed > 0 {
            tracing::warn!(failed, total, "catalog listing is partial");
        }
        Ok(results.into_iter().flatten().collect())
    }
}

async fn enrich(
    metadata: &dyn MetadataSource,
    id: CatalogId,
    kind: MediaKind,
) -> Result<CatalogItem> {
    let (details, external_id) = match kind {
        MediaKind::Movie => {
            let (details, external_id) =
                tokio::join!(metadata.details(id, kind), metadata.external_id(id));
            let external_id = external_id.unwrap_or_else(|err| {
                tracing::debug!(id, error = %err, "external id lookup failed");
                None
            });
            (details?, external_id)
        }
        MediaKind::Series => (metadata.details(id, kind).await?, None),
    };

    Ok(CatalogItem {
        id,
        external_id,
        genre_ids: details.genres.iter().map(|genre| genre.id).collect(),
        title: details.title,
        poster_path: details.poster_path,
        backdrop_path: details.backdrop_path,
        overview: details.overview,
        rating: details.vote_average,
        release_date: details.release_date,
        kind,
        has_playable_source: true,
    })
}

fn parse_id(key: &str) -> Option<CatalogId> {
    key.trim().parse().ok()
}

/// Parsed ids in document order; keys that are not ids are logged and skipped.
fn document_ids<V>(document: &OrderedMap<V>) -> Vec<CatalogId> {
    let mut seen = HashSet::new();
    document
        .keys()
        .filter_map(|key| {
            let id = parse_id(key);
            if id.is_none() {
                tracing::warn!(key, "ignoring remote document key that is not a catalog id");
            }
            id
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

fn lookup<V>(document: &OrderedMap<V>, id: CatalogId) -> Option<&V> {
    document
        .iter()
        .find(|(key, _)| parse_id(key) == Some(id))
        .map(|(_, value)| value)
}
