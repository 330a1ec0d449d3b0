use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use temu_core::persist::{prepare_index_dir, save_index, IndexPaths};
use temu_core::{RawRecord, RecordBatch, SearchEngine};
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "rahasia";

fn build_tiny_index(dir: &Path) {
    let mut engine = SearchEngine::default();
    let corpus = engine
        .build(vec![RecordBatch::new(
            "berita",
            vec![
                RawRecord::new("Pemerintah umumkan kebijakan baru", "Kebijakan ini berlaku mulai 2024"),
                RawRecord::new("Kebijakan pajak", "Pajak kendaraan naik"),
                RawRecord::new("Cuaca cerah", "Hujan diperkirakan reda"),
            ],
        )])
        .unwrap();
    let paths = IndexPaths::new(dir);
    prepare_index_dir(&paths).unwrap();
    save_index(&paths, &corpus, "2024-01-01T00:00:00Z".into()).unwrap();
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = call(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn reload_request(token: Option<&str>) -> Request<Body> {
    let mut req = Request::post("/index/reload");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    req.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = temu_server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, json) = get(app.clone(), "/search?q=kebijakan%20pemerintah&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["normalized"], "kebijakan pemerintah");
    assert_eq!(json["status"], "matched");
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["id"], "berita_0");
    assert_eq!(arr[1]["id"], "berita_1");
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());

    let (status, json) = get(app.clone(), "/search?q=untuk%20di").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "empty_query");
    assert!(json["results"].as_array().unwrap().is_empty());

    let (status, json) = get(app, "/search?q=gempa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "no_matches");
}

#[tokio::test]
async fn documents_resolve_by_external_id() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = temu_server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, json) = get(app.clone(), "/doc/berita_2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Cuaca cerah");
    assert_eq!(json["source"], "berita");

    let (status, _) = get(app, "/doc/berita_9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_index_serves_unavailable_until_reload() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("indexdir");
    let (app, state) = temu_server::build_app_with_state(root.to_string_lossy().to_string(), Some(TOKEN.into())).unwrap();
    assert_eq!(temu_server::index_status(&state), None);

    let (status, _) = call(app.clone(), Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get(app.clone(), "/search?q=kebijakan").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("before any index"));

    // reloading before anything is written fails and leaves the engine as it was
    let (status, _) = call(app.clone(), reload_request(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    build_tiny_index(&root);
    let (status, _) = call(app.clone(), reload_request(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(app.clone(), reload_request(Some("salah"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(app.clone(), reload_request(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["num_docs"], 3);
    assert_eq!(temu_server::index_status(&state), Some(3));

    let (status, json) = get(app, "/search?q=kebijakan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}
