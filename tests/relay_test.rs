#![cfg(feature = "relay")]

use std::time::Duration;

use actix_web::{dev::ServiceResponse, http::StatusCode, test, web, App};
use serde_json::{json, Value};
use trip_agent_rs::relay::{self, RelayConfig, PROXY_PATH};

macro_rules! relay_app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .wrap(relay::cors_headers())
                .app_data(web::Data::new($config))
                .configure(relay::configure)
                .default_service(web::to(relay::not_found)),
        )
        .await
    };
}

fn allow_origin<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get("access-control-allow-origin")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[actix_web::test]
async fn test_missing_credentials_is_bad_request() {
    let app = relay_app!(RelayConfig::default());

    for body in [
        json!({"prompt": "hi", "endpoint": "https://api.example.com/v1"}),
        json!({"prompt": "hi", "apiKey": "  ", "endpoint": "https://api.example.com/v1"}),
        json!({"prompt": "hi", "apiKey": "sk-test"}),
    ] {
        let req = test::TestRequest::post().uri(PROXY_PATH).set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(allow_origin(&resp).as_deref(), Some("*"));

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[actix_web::test]
async fn test_preflight_is_permissive() {
    let app = relay_app!(RelayConfig::default());

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri(PROXY_PATH)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let methods = resp.headers().get("access-control-allow-methods").unwrap();
    assert!(methods.to_str().unwrap().contains("POST"));
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let app = relay_app!(RelayConfig::default());

    let req = test::TestRequest::get().uri("/api/nothing-here").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
}

#[actix_web::test]
async fn test_other_methods_on_proxy_path_are_not_found() {
    let app = relay_app!(RelayConfig::default());

    let req = test::TestRequest::get().uri(PROXY_PATH).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_endpoint_is_used_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/deployments/trip/chat/completions")
        .match_query(mockito::Matcher::UrlEncoded(
            "api-version".into(),
            "2024-06-01".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"{}"}}]}"#)
        .create_async()
        .await;

    let app = relay_app!(RelayConfig::default());
    let req = test::TestRequest::post()
        .uri(PROXY_PATH)
        .set_json(json!({
            "prompt": "hi",
            "apiKey": "sk-test",
            "endpoint": format!(
                "{}/openai/deployments/trip/chat/completions?api-version=2024-06-01",
                server.url()
            )
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    mock.assert_async().await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["choices"][0]["message"]["content"], "{}");
}

#[actix_web::test]
async fn test_upstream_status_and_body_pass_through() {
    let mut server = mockito::Server::new_async().await;
    let upstream = json!({"error": {"message": "quota exceeded", "type": "insufficient_quota"}});
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(402)
        .with_header("content-type", "application/json")
        .with_body(upstream.to_string())
        .create_async()
        .await;

    let app = relay_app!(RelayConfig::default());
    let req = test::TestRequest::post()
        .uri(PROXY_PATH)
        .set_json(json!({
            "prompt": "三天东京",
            "systemPrompt": "只输出 JSON",
            "apiKey": "sk-test",
            "endpoint": format!("{}/chat/completions", server.url()),
            "model": "openai/gpt-4.1-mini"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    mock.assert_async().await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(allow_origin(&resp).as_deref(), Some("*"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, upstream);
}

#[actix_web::test]
async fn test_unreachable_endpoint_is_server_error() {
    let app = relay_app!(RelayConfig::default().with_upstream_timeout(Duration::from_secs(5)));

    let req = test::TestRequest::post()
        .uri(PROXY_PATH)
        .set_json(json!({
            "prompt": "hi",
            "apiKey": "sk-test",
            "endpoint": "http://127.0.0.1:9"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "HTTP_ERROR");
}
