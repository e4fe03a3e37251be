//! End-to-end API behavior, driven in memory.

use abacus::build_server;
use abacus_config::AbacusConfig;
use abacus_test::TestClient;
use http::{Method, StatusCode};
use serde_json::{json, Value};

fn client() -> TestClient {
    TestClient::new(build_server(&AbacusConfig::default()))
}

async fn calculate(client: &TestClient, body: &Value) -> abacus_test::TestResponse {
    client.post_json("/calculate", body).await
}

#[tokio::test]
async fn test_root_describes_service() {
    let response = client().get("/").send().await;

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "application/json")
        .assert_json_eq(&json!({
            "message": "Calculator API",
            "version": "1.0.0",
            "endpoints": ["/calculate", "/health"],
        }));
}

#[tokio::test]
async fn test_root_uses_configured_identity() {
    let mut config = AbacusConfig::default();
    config.service.name = "Ledger Calculator".to_string();
    config.service.version = "2.3.0".to_string();
    let client = TestClient::new(build_server(&config));

    client
        .get("/")
        .send()
        .await
        .assert_json_field("message", &json!("Ledger Calculator"))
        .assert_json_field("version", &json!("2.3.0"));
}

#[tokio::test]
async fn test_health() {
    client()
        .get("/health")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_ready() {
    client()
        .get("/ready")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("ready", &json!(true));
}

#[tokio::test]
async fn test_basic_operations() {
    let client = client();
    let cases = [
        (json!(5), json!(3), "add", json!(8)),
        (json!(20), json!(8), "subtract", json!(12)),
        (json!(6), json!(7), "multiply", json!(42)),
        (json!(100), json!(4), "divide", json!(25.0)),
    ];

    for (a, b, operation, expected) in cases {
        let body = json!({"a": a.clone(), "b": b.clone(), "operation": operation});
        calculate(&client, &body)
            .await
            .assert_status(StatusCode::OK)
            .assert_json_eq(&json!({
                "result": expected,
                "operation": operation,
                "a": a,
                "b": b,
            }));
    }
}

#[tokio::test]
async fn test_float_operands() {
    let client = client();

    let response = calculate(&client, &json!({"a": 2.5, "b": 0.5, "operation": "multiply"})).await;
    response
        .assert_status(StatusCode::OK)
        .assert_json_field("result", &json!(1.25))
        .assert_json_field("a", &json!(2.5));

    let response = calculate(&client, &json!({"a": -1, "b": 0.25, "operation": "add"})).await;
    response.assert_json_field("result", &json!(-0.75));
}

#[tokio::test]
async fn test_integer_division_does_not_truncate() {
    calculate(&client(), &json!({"a": 7, "b": 2, "operation": "divide"}))
        .await
        .assert_json_field("result", &json!(3.5));
}

#[tokio::test]
async fn test_tiny_divisor_is_not_zero() {
    let response = calculate(&client(), &json!({"a": 1, "b": 1e-300, "operation": "divide"})).await;
    response.assert_status(StatusCode::OK);

    let result = response.json_value().unwrap()["result"].as_f64().unwrap();
    assert!((result - 1e300).abs() / 1e300 < 1e-12);
}

#[tokio::test]
async fn test_division_by_zero() {
    let client = client();

    for b in [json!(0), json!(0.0), json!(-0.0)] {
        calculate(&client, &json!({"a": 5, "b": b, "operation": "divide"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_json_eq(&json!({"detail": "Division by zero is not allowed"}));
    }
}

#[tokio::test]
async fn test_unsupported_operation() {
    let client = client();

    for operation in ["power", "ADD", "", "add "] {
        calculate(&client, &json!({"a": 5, "b": 3, "operation": operation}))
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_json_eq(&json!({"detail": format!("Unsupported operation: {operation}")}));
    }
}

#[tokio::test]
async fn test_missing_fields() {
    let response = calculate(&client(), &json!({"a": 5})).await;

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_field("detail.0.type", &json!("missing"))
        .assert_json_field("detail.0.loc", &json!(["body", "b"]))
        .assert_json_field("detail.1.loc", &json!(["body", "operation"]));
}

#[tokio::test]
async fn test_wrong_types() {
    let client = client();

    calculate(&client, &json!({"a": "invalid", "b": 3, "operation": "add"}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_field("detail.0.type", &json!("number_type"))
        .assert_json_field("detail.0.loc.1", &json!("a"));

    calculate(&client, &json!({"a": [1], "b": null, "operation": "add"}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_field("detail.0.loc.1", &json!("a"))
        .assert_json_field("detail.1.loc.1", &json!("b"));

    calculate(&client, &json!({"a": 5, "b": 3, "operation": 1}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_field("detail.0.type", &json!("string_type"));
}

#[tokio::test]
async fn test_numeric_strings_and_booleans_are_coerced() {
    let client = client();

    calculate(&client, &json!({"a": "5", "b": 3, "operation": "add"}))
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!({"result": 8, "operation": "add", "a": 5, "b": 3}));

    calculate(&client, &json!({"a": true, "b": 3, "operation": "add"}))
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("result", &json!(4))
        .assert_json_field("a", &json!(1));

    calculate(&client, &json!({"a": "2.5", "b": false, "operation": "subtract"}))
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("result", &json!(2.5));
}

#[tokio::test]
async fn test_malformed_bodies() {
    let client = client();

    client
        .post("/calculate")
        .header("content-type", "application/json")
        .body("{\"a\": 5,")
        .send()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_field("detail.0.type", &json!("json_invalid"))
        .assert_json_field("detail.0.msg", &json!("JSON decode error"))
        .assert_json_field("detail.0.loc", &json!(["body"]));

    client
        .post("/calculate")
        .body("")
        .send()
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_eq(&json!({
            "detail": [{"type": "missing", "loc": ["body"], "msg": "Field required"}]
        }));

    calculate(&client, &json!([5, 3, "add"]))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_json_field("detail.0.type", &json!("model_attributes_type"));
}

#[tokio::test]
async fn test_non_finite_result_is_server_error() {
    let client = client();

    let response = calculate(&client, &json!({"a": 1e308, "b": 10, "operation": "multiply"})).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let detail = response.json_value().unwrap()["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("Internal server error"), "{detail}");

    calculate(&client, &json!({"a": "inf", "b": 1, "operation": "add"}))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    calculate(&client, &json!({"a": 1e308, "b": 10, "operation": "add"}))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_extra_fields_ignored() {
    calculate(
        &client(),
        &json!({"a": 1, "b": 2, "operation": "add", "precision": 4}),
    )
    .await
    .assert_status(StatusCode::OK)
    .assert_json_eq(&json!({"result": 3, "operation": "add", "a": 1, "b": 2}));
}

#[tokio::test]
async fn test_integer_overflow_promotes_to_float() {
    let response = calculate(
        &client(),
        &json!({"a": i64::MAX, "b": 1, "operation": "add"}),
    )
    .await;

    response
        .assert_status(StatusCode::OK)
        .assert_json_field("a", &json!(i64::MAX));
    assert!(response.json_value().unwrap()["result"].is_f64());
}

#[tokio::test]
async fn test_unknown_path_and_method() {
    let client = client();

    client
        .get("/calculator")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_json_eq(&json!({"detail": "Not Found"}));

    client
        .get("/calculate")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_header("allow", "POST")
        .assert_json_eq(&json!({"detail": "Method Not Allowed"}));

    client
        .request(Method::DELETE, "/")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_trailing_slash() {
    client()
        .post_json("/calculate/", &json!({"a": 1, "b": 1, "operation": "subtract"}))
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("result", &json!(0));
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = AbacusConfig::default();
    config.server.max_body_bytes = 32;
    let client = TestClient::new(build_server(&config));

    let padding = "x".repeat(64);
    client
        .post_json("/calculate", &json!({"a": 1, "b": 2, "operation": "add", "pad": padding}))
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_request_id_on_every_response() {
    let client = client();

    for response in [
        client.get("/").send().await,
        client.get("/missing").send().await,
        calculate(&client, &json!({"a": 1, "b": 0, "operation": "divide"})).await,
    ] {
        let id = response.header_str("x-request-id").unwrap();
        assert_eq!(id.len(), 36);
    }

    let id = "0190b5d4-7d6c-7b6e-8a4f-3c2d1e0f9a8b";
    client
        .get("/health")
        .header("x-request-id", id)
        .send()
        .await
        .assert_header("x-request-id", id);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let client = client();
    let body = json!({"a": 0.1, "b": 0.2, "operation": "add"});

    let first = calculate(&client, &body).await.json_value().unwrap();
    for _ in 0..10 {
        let next = calculate(&client, &body).await.json_value().unwrap();
        assert_eq!(next, first);
    }
}
