mod upstream_stub;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use binflix::app::favorites::{FavoritesStore, InMemoryFavorites};
use binflix::app::routes::{AppState, router};
use binflix::catalog::Catalog;
use binflix::config::CatalogConfig;
use http_body_util::BodyExt as _;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use upstream_stub::{UpstreamStub, UpstreamStubConfig};

fn app_for(stub: &UpstreamStub) -> anyhow::Result<Router> {
    let env: HashMap<&str, String> = HashMap::from([
        ("TMDB_API_KEY", "tmdb-test-key".to_owned()),
        ("TMDB_BASE_URL", stub.tmdb_url()),
        ("JSONBIN_API_KEY", "bin-test-key".to_owned()),
        ("JSONBIN_BASE_URL", stub.jsonbin_url()),
        ("JSONBIN_MOVIES_ID", "movies-doc".to_owned()),
        ("JSONBIN_SERIES_ID", "series-doc".to_owned()),
    ]);
    let config = CatalogConfig::from_lookup(|name| env.get(name).cloned())?;
    let catalog = Arc::new(Catalog::from_config(&config)?);
    let favorites: Arc<dyn FavoritesStore> = Arc::new(InMemoryFavorites::new());
    Ok(router(AppState { catalog, favorites }))
}

fn stub() -> UpstreamStub {
    UpstreamStub::spawn(
        UpstreamStubConfig::default()
            .bin("movies-doc", json!({"550": "https://cdn.example/550.mp4"}))
            .bin(
                "series-doc",
                json!({"1399": {"title": "Game of Thrones", "seasons": {"1": ["e1", "e2"]}}}),
            )
            .tmdb(
                "/search/multi",
                json!({"results": [
                    {"media_type": "movie", "id": 550, "title": "Fight Club"},
                    {"media_type": "movie", "id": 13, "title": "Forrest Gump"}
                ]}),
            ),
    )
}

async fn call(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::get(uri).body(Body::empty())?)
}

fn post_json(uri: &str, body: Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn favorites_lifecycle() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, created) = call(
        &app,
        post_json("/api/mylist", json!({"catalogId": 550, "kind": "movie"}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["catalogId"], 550);
    assert_eq!(created["kind"], "movie");

    let (status, _) = call(
        &app,
        post_json("/api/mylist", json!({"tmdbId": 1399, "mediaType": "tv"}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        post_json("/api/mylist", json!({"catalogId": 550, "kind": "movie"}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already in list");

    let (status, listed) = call(&app, get("/api/mylist")?).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = listed
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e["catalogId"].as_u64())
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(ids, vec![1399, 550]);

    let delete = Request::delete("/api/mylist/550").body(Body::empty())?;
    let (status, _) = call(&app, delete).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let delete = Request::delete("/api/mylist/550").body(Body::empty())?;
    let (status, body) = call(&app, delete).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
    Ok(())
}

#[tokio::test]
async fn search_returns_only_hosted_titles() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, body) = call(&app, get("/api/media/search?q=forr%20fight")?).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{
        "id": 550,
        "title": "Fight Club",
        "posterPath": null,
        "backdropPath": null,
        "overview": "",
        "rating": 0.0,
        "releaseDate": "",
        "kind": "movie",
        "genreIds": [],
        "hasPlayableSource": true
    }]));
    Ok(())
}

#[tokio::test]
async fn missing_search_query_is_empty() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, body) = call(&app, get("/api/media/search")?).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert!(stub.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn playable_urls_resolve_and_miss() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, body) = call(&app, get("/api/media/movie/550/url")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://cdn.example/550.mp4");

    let (status, body) = call(
        &app,
        get("/api/media/series/1399/season/1/episode/2/url")?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "e2");

    let (status, _) = call(
        &app,
        get("/api/media/series/1399/season/1/episode/3/url")?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, body) = call(&app, get("/api/media/movie/abc/url")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("abc"));

    let (status, _) = call(&app, get("/api/media/details/550/documentary")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn upstream_failures_are_opaque() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    // No /tmdb/movie/550 route: the stub answers 404.
    let (status, body) = call(&app, get("/api/media/details/550/movie")?).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "upstream request failed"}));
    Ok(())
}

#[tokio::test]
async fn genres_and_health_are_served() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, genres) = call(&app, get("/api/genres")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(
        genres
            .as_array()
            .is_some_and(|all| all.iter().any(|g| g["id"] == 28 && g["label"] == "Ação"))
    );

    let response = app.clone().oneshot(get("/healthz")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn series_record_is_served_as_stored() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, body) = call(&app, get("/api/media/series/1399")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"title": "Game of Thrones", "seasons": {"1": ["e1", "e2"]}})
    );

    let (status, _) = call(&app, get("/api/media/series/550")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_favorite_bodies_are_bad_requests() -> anyhow::Result<()> {
    let stub = stub();
    let app = app_for(&stub)?;

    let (status, body) = call(
        &app,
        post_json("/api/mylist", json!({"catalogId": "abc", "kind": "movie"}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|msg| msg.starts_with("invalid request body"))
    );

    let broken = Request::post("/api/mylist")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, _) = call(&app, broken).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listed) = call(&app, get("/api/mylist")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
    Ok(())
}
