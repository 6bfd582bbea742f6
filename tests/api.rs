use flowdoc_storage::server::create_app;
use flowdoc_storage::store::SingletonStore;
use flowdoc_storage::{FlowStorage, HostSettings, MemoryDocumentClient, Resource};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve the app on an ephemeral port, returning its base URL
async fn serve() -> (Arc<MemoryDocumentClient>, String) {
    let settings: HostSettings =
        serde_json::from_value(json!({ "cloudantService": { "db": "api", "prefix": "ns" } })).unwrap();
    let client = Arc::new(MemoryDocumentClient::new());
    let storage = Arc::new(FlowStorage::initialize(&settings, client.clone()).await.unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(storage);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    (client, format!("http://{}", addr))
}

#[tokio::test]
async fn health_check_responds() {
    let (_, base) = serve().await;
    let body = reqwest::get(format!("{}/healthz", base)).await.unwrap().text().await.unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn flows_round_trip_over_http() {
    let (_, base) = serve().await;
    let http = reqwest::Client::new();

    let empty: Value = http.get(format!("{}/flows", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(empty, json!([]));

    let status = http
        .put(format!("{}/flows", base))
        .json(&json!([{ "id": "n1" }]))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let flows: Value = http.get(format!("{}/flows", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(flows, json!([{ "id": "n1" }]));

    let settings: Value = http.get(format!("{}/settings", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(settings, json!({}));
}

#[tokio::test]
async fn stale_write_maps_to_conflict() {
    let (client, base) = serve().await;
    let http = reqwest::Client::new();

    let status = http.put(format!("{}/sessions", base)).json(&json!({ "a": 1 })).send().await.unwrap().status();
    assert_eq!(status, StatusCode::NO_CONTENT);

    // another writer updates the document behind the server's back
    let other = SingletonStore::new(client, "api", "ns");
    other.get(Resource::Sessions).await.unwrap();
    other.put(Resource::Sessions, json!({ "b": 2 })).await.unwrap();

    let response = http.put(format!("{}/sessions", base)).json(&json!({ "a": 3 })).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("saveSessions failed"));

    // a read refreshes the revision and the retry succeeds
    let current: Value = http.get(format!("{}/sessions", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(current, json!({ "b": 2 }));
    let status = http.put(format!("{}/sessions", base)).json(&json!({ "a": 3 })).send().await.unwrap().status();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn library_entries_and_listings_over_http() {
    let (_, base) = serve().await;
    let http = reqwest::Client::new();

    let status = http
        .put(format!("{}/library/functions/util/math/add", base))
        .json(&json!({ "meta": { "outputs": 1 }, "body": "return a + b;" }))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let entry: Value = http
        .get(format!("{}/library/functions/util/math/add", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entry, json!({ "meta": { "outputs": 1 }, "body": "return a + b;" }));

    let root: Value = http.get(format!("{}/library/functions", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(root, json!(["util"]));

    let math: Value = http
        .get(format!("{}/library/functions/util/math", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(math, json!([{ "outputs": 1, "fn": "add" }]));
}
