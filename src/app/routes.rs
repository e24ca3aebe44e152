use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

use crate::app::favorites::FavoritesStore;
use crate::app::model::{AddFavoriteRequest, PlayableUrl, SearchQuery};
use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::formats::{CatalogId, MediaKind, PlaybackTarget};
use crate::genres;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub favorites: Arc<dyn FavoritesStore>,
}

/// API routes. Static asset serving is layered on by the server binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/media/all", get(list_all))
        .route("/api/media/search", get(search))
        .route("/api/media/details/:id/:kind", get(details))
        .route("/api/media/series/:id", get(series_episodes))
        .route("/api/media/series/:id/season/:season", get(season_listing))
        .route(
            "/api/media/series/:id/season/:season/episode/:episode/url",
            get(episode_url),
        )
        .route("/api/media/movie/:id/url", get(movie_url))
        .route("/api/genres", get(list_genres))
        .route("/api/mylist", get(list_favorites).post(add_favorite))
        .route("/api/mylist/:id", delete(remove_favorite))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Client-facing failure. Only the coarse class leaks out; the underlying
/// error is logged when the response is built.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let (status, message) = match &err {
            CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, "not found".to_string()),
            CatalogError::Conflict(_) => (StatusCode::CONFLICT, "already in list".to_string()),
            CatalogError::InvalidInput(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            CatalogError::Config(_)
            | CatalogError::RemoteUnavailable(_)
            | CatalogError::MetadataUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream request failed".to_string(),
            ),
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(error = %err, "request rejected");
        }
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_catalog_id(raw: &str) -> ApiResult<CatalogId> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid catalog id: {raw}")))
}

fn parse_number(name: &str, raw: &str) -> ApiResult<u32> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid {name}: {raw}")))
}

async fn list_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items = state.catalog.list_all().await?;
    Ok(Json(items))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let items = state.catalog.search(&query.q).await?;
    Ok(Json(items))
}

async fn details(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_catalog_id(&id)?;
    let kind: MediaKind = kind.parse()?;
    let details = state.catalog.details(id, kind).await?;
    Ok(Json(details))
}

async fn series_episodes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_catalog_id(&id)?;
    let record = state.catalog.series_episodes(id).await?;
    Ok(Json(record))
}

async fn season_listing(
    State(state): State<AppState>,
    Path((id, season)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_catalog_id(&id)?;
    let season = parse_number("season", &season)?;
    let listing = state.catalog.season_listing(id, season).await?;
    Ok(Json(listing))
}

async fn episode_url(
    State(state): State<AppState>,
    Path((id, season, episode)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_catalog_id(&id)?;
    let target = PlaybackTarget::Episode {
        season: parse_number("season", &season)?,
        episode: parse_number("episode", &episode)?,
    };
    let url = state.catalog.playable_url(id, target).await?;
    Ok(Json(PlayableUrl { url }))
}

async fn movie_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_catalog_id(&id)?;
    let url = state.catalog.movie_url(id).await?;
    Ok(Json(PlayableUrl { url }))
}

async fn list_genres() -> impl IntoResponse {
    Json(genres::all())
}

async fn list_favorites(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let entries = state.favorites.list().await?;
    Ok(Json(entries))
}

async fn add_favorite(
    State(state): State<AppState>,
    request: Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = request.map_err(|rejection| {
        ApiError::bad_request(format!("invalid request body: {}", rejection.body_text()))
    })?;
    let entry = state
        .favorites
        .add(request.catalog_id, request.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_catalog_id(&id)?;
    state.favorites.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
