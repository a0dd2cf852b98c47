use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;
use trip_agent_rs::{
    resolve_coordinates,
    services::llm_client::ChatCompletionRequest,
    CompletionBackend, LlmClient, PlanRequest, PlannerError, Result, TripPlanner,
};

const SHANGHAI_TOKYO: &str = r#"```json
{
  "destination": "东京",
  "itinerary": [
    {
      "day": 1,
      "activities": [{"name": "东京塔", "type": "attraction", "coordinates": [139.7454, 35.6586]}],
      "transport": [{"from": "浦东机场", "to": "东京羽田机场", "mode": "flight", "price": 1800}]
    }
  ],
  "suggestions": "出发前换好日元。"
}
```"#;

/// Returns a fixed reply and remembers the last request it saw.
#[derive(Clone, Default)]
struct CannedBackend {
    reply: String,
    seen: Arc<Mutex<Option<ChatCompletionRequest>>>,
}

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn complete(&self, request: &ChatCompletionRequest, _timeout: Duration) -> Result<String> {
        *self.seen.lock().unwrap() = Some(request.clone());
        Ok(self.reply.clone())
    }
}

struct SlowBackend;

#[async_trait]
impl CompletionBackend for SlowBackend {
    async fn complete(&self, _request: &ChatCompletionRequest, _timeout: Duration) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("{}".to_string())
    }
}

fn tokyo_request() -> PlanRequest {
    PlanRequest::new("东京", "从上海坐飞机去东京玩一天，必须去东京塔和浅草寺")
        .with_days(1)
        .with_travelers(2)
        .with_budget(6000.0)
}

#[tokio::test]
async fn test_plan_reconciles_and_fills_hub_coordinates() {
    let backend = CannedBackend {
        reply: SHANGHAI_TOKYO.to_string(),
        ..CannedBackend::default()
    };
    let planner = TripPlanner::with_backend(backend.clone()).with_model("test/model");

    let result = planner.plan(&tokyo_request()).await.unwrap();
    assert_eq!(result.destination, "东京");
    assert_eq!(result.travelers, Some(2));
    assert_eq!(result.budget, Some(6000.0));
    assert_eq!(result.missing_entities, vec!["浅草寺"]);
    assert!(result.suggestions.starts_with("出发前换好日元。"));

    let leg = &result.itinerary[0].transport.as_ref().unwrap()[0];
    assert_eq!(leg.from_coordinates, resolve_coordinates("上海浦东国际机场"));
    assert_eq!(leg.to_coordinates, resolve_coordinates("HND"));

    let seen = backend.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.model(), "test/model");
    let body = seen.to_value();
    assert_eq!(body["response_format"]["type"], "json_object");
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("东京塔、浅草寺"));
    assert!(user.contains("transport 数组"));
}

#[tokio::test]
async fn test_slow_model_is_a_timeout_not_a_format_error() {
    let planner = TripPlanner::with_backend(SlowBackend).with_timeout(Duration::from_millis(50));

    let err = planner.plan(&tokyo_request()).await.unwrap_err();
    assert!(matches!(err, PlannerError::Timeout(_)), "{err:?}");
    assert!(err.is_retryable());
}

#[test]
fn test_unreadable_reply_is_a_format_error() {
    let backend = CannedBackend {
        reply: "I'm sorry, I can't help with that.".to_string(),
        ..CannedBackend::default()
    };
    let planner = TripPlanner::with_backend(backend);

    let err = tokio_test::block_on(planner.plan(&tokyo_request())).unwrap_err();
    assert_eq!(err.error_code(), "FORMAT_ERROR");
}

#[tokio::test]
async fn test_http_backend_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let completion = json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": SHANGHAI_TOKYO}}]
    });
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion.to_string())
        .create_async()
        .await;

    let client = LlmClient::new("sk-test").with_base_url(server.url());
    let planner = TripPlanner::with_backend(client);
    let result = planner.plan(&tokyo_request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.day_count(), 1);
    assert_eq!(result.itinerary[0].activities[0].name, "东京塔");
}

#[tokio::test]
async fn test_http_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "invalid api key"}}"#)
        .expect(1)
        .create_async()
        .await;

    let planner = TripPlanner::with_backend(LlmClient::new("bad").with_base_url(server.url()));
    let err = planner.plan(&tokyo_request()).await.unwrap_err();

    mock.assert_async().await;
    match err {
        PlannerError::Upstream { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid api key");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}
