use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use diary_cell::router::diary_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

const USER_ID: &str = "8e9f0a1b-2c3d-4e5f-8a9b-0c1d2e3f4a5b";

fn app(config: &TestConfig) -> Router {
    diary_routes(config.to_arc())
}

fn bearer(config: &TestConfig) -> String {
    JwtTestUtils::bearer(&TestUser::patient("anita@example.com").with_id(USER_ID), config)
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn upsert_request(config: &TestConfig, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upsert")
        .header("authorization", bearer(config))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn upsert_writes_every_column() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/rest/v1/diary_entries"))
        .and(query_param("on_conflict", "user_id,date"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::diary_row(USER_ID, "2025-03-10", "B", Some("calm"))
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app(&config)
        .oneshot(upsert_request(&config, json!({
            "userId": USER_ID,
            "date": "2025-03-10T18:30:00Z",
            "text": "B",
            "mood": "calm"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["entry"]["text"], "B");
    assert_eq!(body["entry"]["mood"], "calm");

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["date"], "2025-03-10");
    assert_eq!(sent["text"], "B");
    assert_eq!(sent["mood"], "calm");
    assert_eq!(sent["image_data"], "");
}

#[tokio::test]
async fn upsert_without_mood_clears_it() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/rest/v1/diary_entries"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::diary_row(USER_ID, "2025-03-10", "A", None)
        ])))
        .mount(&mock_server)
        .await;

    let response = app(&config)
        .oneshot(upsert_request(&config, json!({ "userId": USER_ID, "date": "2025-03-10", "text": "A", "mood": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["mood"], Value::Null);
    assert!(sent.as_object().unwrap().contains_key("mood"));
}

#[tokio::test]
async fn upsert_rejects_unknown_mood_and_bad_date() {
    let config = TestConfig::default();

    let response = app(&config)
        .oneshot(upsert_request(&config, json!({ "userId": USER_ID, "date": "2025-03-10", "mood": "anxious" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&config)
        .oneshot(upsert_request(&config, json!({ "userId": USER_ID, "date": "someday" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["message"], "Valid date required");
}

#[tokio::test]
async fn get_returns_entry_or_null() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/diary_entries"))
        .and(query_param("user_id", format!("eq.{}", USER_ID)))
        .and(query_param("date", "eq.2025-03-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::diary_row(USER_ID, "2025-03-10", "Felt kicks", Some("happy"))
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diary_entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let get = |date: &str| {
        Request::builder()
            .method("GET")
            .uri(format!("/?userId={}&date={}", USER_ID, date))
            .header("authorization", bearer(&config))
            .body(Body::empty())
            .unwrap()
    };

    let response = app(&config).oneshot(get("2025-03-10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["entry"]["text"], "Felt kicks");

    let response = app(&config).oneshot(get("2025-03-11")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["entry"], Value::Null);
}

#[tokio::test]
async fn reading_another_users_diary_is_forbidden() {
    let config = TestConfig::default();

    let request = Request::builder()
        .method("GET")
        .uri("/?userId=someone-else&date=2025-03-10")
        .header("authorization", bearer(&config))
        .body(Body::empty())
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
