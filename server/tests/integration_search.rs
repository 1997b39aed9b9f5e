use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use engine::persist::{save_index, save_meta, IndexPaths, MetaFile};
use engine::{Analyzer, FieldPolicy, InvertedIndex, RecipeDoc};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let docs = vec![
        RecipeDoc {
            id: "doc1".into(),
            title: "chocolate chip cookies".into(),
            ingredients: "flour sugar chocolate chips".into(),
            directions: "mix and bake".into(),
            tags: None,
        },
        RecipeDoc {
            id: "doc2".into(),
            title: "vegan chocolate cake".into(),
            ingredients: "flour cocoa".into(),
            directions: "bake".into(),
            tags: None,
        },
        RecipeDoc {
            id: "doc3".into(),
            title: "grilled chicken salad".into(),
            ingredients: "chicken lettuce".into(),
            directions: "grill".into(),
            tags: None,
        },
    ];
    let index =
        InvertedIndex::build(&docs, &Analyzer::default(), FieldPolicy::default()).unwrap();
    let paths = IndexPaths::new(dir);
    save_index(&paths, &index).unwrap();
    save_meta(
        &paths,
        &MetaFile {
            num_docs: index.num_docs(),
            created_at: "2026-01-01T00:00:00Z".into(),
            version: 1,
        },
    )
    .unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_str().unwrap()).unwrap();

    let (status, json) = call(app, "/search?q=chocolate%20cookies&model=bm25&k=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["results"][0]["doc_id"], "doc1");
    assert_eq!(json["results"][1]["doc_id"], "doc2");
}

#[tokio::test]
async fn unknown_model_is_a_bad_request() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_str().unwrap()).unwrap();

    let response = app
        .oneshot(
            Request::get("/search?q=chocolate&model=colbert")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn doc_endpoint_returns_metadata() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_str().unwrap()).unwrap();

    let (status, json) = call(app, "/doc/doc2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "vegan chocolate cake");

    let dir2 = tempdir().unwrap();
    build_tiny_index(dir2.path());
    let app2 = server::build_app(dir2.path().to_str().unwrap()).unwrap();
    let response = app2
        .oneshot(Request::get("/doc/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_query_is_a_valid_empty_result() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = server::build_app(dir.path().to_str().unwrap()).unwrap();

    let (status, json) = call(app, "/search?q=the%20and%20of").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
}
