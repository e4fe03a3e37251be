//! The calculator over a real socket.

use std::net::SocketAddr;
use std::time::Duration;

use abacus::build_server;
use abacus_config::AbacusConfig;
use abacus_server::{ServerError, ShutdownSignal};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct RunningServer {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    async fn start() -> Self {
        let mut config = AbacusConfig::default();
        config.server.shutdown_timeout_secs = 2;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();

        let server = build_server(&config);
        let handle = tokio::spawn(server.run_with_listener(listener, shutdown.clone()));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop within the timeout")
            .expect("server task should not panic");
        assert!(result.is_ok());
    }
}

#[tokio::test]
async fn test_calculate_over_http() {
    let server = RunningServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/calculate"))
        .json(&json!({"a": 5, "b": 3, "operation": "add"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"result": 8, "operation": "add", "a": 5, "b": 3}));

    let response = client
        .post(server.url("/calculate"))
        .json(&json!({"a": 5, "b": 0, "operation": "divide"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Division by zero is not allowed"}));

    server.stop().await;
}

#[tokio::test]
async fn test_discovery_and_health_over_http() {
    let server = RunningServer::start().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["endpoints"], json!(["/calculate", "/health"]));

    let response = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "healthy"}));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests() {
    let server = RunningServer::start().await;
    let client = reqwest::Client::new();

    let requests = (0..5_i64).map(|i| {
        let client = client.clone();
        let url = server.url("/calculate");
        tokio::spawn(async move {
            let body: Value = client
                .post(url)
                .json(&json!({"a": i, "b": 10, "operation": "multiply"}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            (i, body)
        })
    });

    for request in requests.collect::<Vec<_>>() {
        let (i, body) = request.await.unwrap();
        assert_eq!(body["result"], json!(i * 10));
        assert_eq!(body["a"], json!(i));
    }

    server.stop().await;
}

#[tokio::test]
async fn test_repeated_requests() {
    let server = RunningServer::start().await;
    let client = reqwest::Client::new();
    let payload = json!({"a": 1, "b": 3, "operation": "divide"});

    let mut bodies = Vec::new();
    for _ in 0..5 {
        let body: Value = client
            .post(server.url("/calculate"))
            .json(&payload)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        bodies.push(body);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(bodies[0]["result"], json!(1.0 / 3.0));

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = RunningServer::start().await;
    let url = server.url("/health");

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    server.stop().await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(client.get(&url).send().await.is_err());
}
