//! End-to-end tests against a real listener on an ephemeral port.

use pretty_assertions::assert_eq;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

use dmiq_core_svc::api::create_router;
use dmiq_core_svc::{Server, ServerConfig};

struct TestServer {
    base: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<dmiq_core_svc::Result<()>>,
}

async fn spawn_server() -> TestServer {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    };
    let server = Server::new(config, create_router());
    let listener = server.bind().await.expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(listener, async move {
        rx.await.ok();
    }));

    TestServer {
        base: format!("http://{addr}"),
        shutdown,
        handle,
    }
}

fn expected_get(path: &str) -> Value {
    match path {
        "/" => json!({"service": "DMIQ Core Service", "version": "1.0.0", "status": "running"}),
        "/health" => json!({"status": "healthy", "service": "dmiqcoresvc"}),
        "/api/v1/status" => json!({"api_version": "v1", "status": "operational"}),
        "/api/v1/data" => json!({"data": [
            {"id": 1, "name": "Sample 1"},
            {"id": 2, "name": "Sample 2"},
        ]}),
        other => panic!("no fixture for {other}"),
    }
}

#[tokio::test]
async fn get_routes_return_fixtures() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    for path in ["/", "/health", "/api/v1/status", "/api/v1/data"] {
        let response = client
            .get(format!("{}{path}", server.base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json",
            "{path}"
        );
        assert_eq!(response.json::<Value>().await.unwrap(), expected_get(path));
    }

    drop(client);
    server.shutdown.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn post_round_trips_payload() {
    let server = spawn_server().await;
    let payload = json!({"name": "Example", "value": 123});

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/data", server.base))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"message": "Data received successfully", "received_data": payload})
    );
}

#[tokio::test]
async fn post_rejects_missing_or_malformed_body() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/data", server.base);

    let empty = client.post(&url).send().await.unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        empty.json::<Value>().await.unwrap(),
        json!({"error": "No data provided"})
    );

    let garbage = client
        .post(&url)
        .header(header::CONTENT_TYPE, "text/plain")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
    let body: Value = garbage.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_path_and_wrong_method() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/nope", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        missing.json::<Value>().await.unwrap(),
        json!({"error": "Resource not found"})
    );

    let wrong_verb = client
        .delete(format!("{}/health", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_verb.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(wrong_verb.headers().contains_key(header::ALLOW));
    assert_eq!(
        wrong_verb.json::<Value>().await.unwrap(),
        json!({"error": "Method not allowed"})
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_do_not_interfere() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let mut tasks = JoinSet::new();

    for i in 0..64u64 {
        let client = client.clone();
        let base = server.base.clone();
        tasks.spawn(async move {
            match i % 5 {
                4 => {
                    let payload = json!({"request": i});
                    let response = client
                        .post(format!("{base}/api/v1/data"))
                        .json(&payload)
                        .send()
                        .await
                        .unwrap();
                    assert_eq!(response.status(), StatusCode::OK);
                    let body: Value = response.json().await.unwrap();
                    assert_eq!(body["received_data"], payload);
                }
                n => {
                    let path = ["/", "/health", "/api/v1/status", "/api/v1/data"][n as usize];
                    let response = client.get(format!("{base}{path}")).send().await.unwrap();
                    assert_eq!(response.status(), StatusCode::OK);
                    assert_eq!(response.json::<Value>().await.unwrap(), expected_get(path));
                }
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }
}
