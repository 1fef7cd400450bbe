use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use messaging_cell::router::messaging_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

const DOCTOR_ID: &str = "5b0d7c56-7a3e-4a4b-9f45-2b8e7f1c9a10";
const PATIENT_ID: &str = "8e9f0a1b-2c3d-4e5f-8a9b-0c1d2e3f4a5b";
const STRANGER_ID: &str = "c3d4e5f6-a7b8-4c9d-8e0f-1a2b3c4d5e6f";

fn app(config: &TestConfig) -> Router {
    messaging_routes(config.to_arc())
}

fn patient() -> TestUser {
    TestUser::patient("anita@example.com").with_id(PATIENT_ID)
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", token)
        .body(Body::empty())
        .unwrap()
}

fn send_request(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/send")
        .header("authorization", token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Patient row for PATIENT_ID, doctor row for DOCTOR_ID, nothing else.
async fn mount_identities(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", PATIENT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": PATIENT_ID, "name": "Anita Rao", "email": "anita@example.com" }
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", DOCTOR_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": DOCTOR_ID, "name": "Dr. Meera Iyer", "email": "meera@clinic.test", "role": "doctor", "specialty": "Obstetrics" }
        ])))
        .mount(mock_server)
        .await;

    for table in ["/rest/v1/patients", "/rest/v1/doctors"] {
        Mock::given(method("GET"))
            .and(path(table))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(10)
            .mount(mock_server)
            .await;
    }
}

#[tokio::test]
async fn patient_sends_trimmed_message_to_doctor() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    mount_identities(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::message_row(PATIENT_ID, DOCTOR_ID, "Feeling dizzy today", "2025-03-10T08:00:00Z", None)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app(&config)
        .oneshot(send_request(&JwtTestUtils::bearer(&patient(), &config), json!({
            "senderId": PATIENT_ID,
            "receiverId": DOCTOR_ID,
            "content": "  Feeling dizzy today  "
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["message"]["senderId"], PATIENT_ID);
    assert_eq!(body["message"]["readAt"], Value::Null);

    let requests = mock_server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let sent: Value = serde_json::from_slice(&insert.body).unwrap();
    assert_eq!(sent["content"], "Feeling dizzy today");
    assert_eq!(sent["read_at"], Value::Null);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let config = TestConfig::default();

    let response = app(&config)
        .oneshot(send_request(&JwtTestUtils::bearer(&patient(), &config), json!({
            "senderId": PATIENT_ID,
            "receiverId": DOCTOR_ID,
            "content": "   "
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["message"], "Message content is required");
}

#[tokio::test]
async fn cannot_send_as_someone_else() {
    let config = TestConfig::default();

    let response = app(&config)
        .oneshot(send_request(&JwtTestUtils::bearer(&patient(), &config), json!({
            "senderId": DOCTOR_ID,
            "receiverId": PATIENT_ID,
            "content": "hi"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_receiver_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    mount_identities(&mock_server).await;

    let response = app(&config)
        .oneshot(send_request(&JwtTestUtils::bearer(&patient(), &config), json!({
            "senderId": PATIENT_ID,
            "receiverId": STRANGER_ID,
            "content": "hello"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Past the first page every message query comes back empty.
async fn mount_last_message_page(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn opening_thread_marks_only_unread_incoming() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/messages"))
        .and(query_param("sender_id", format!("eq.{}", DOCTOR_ID)))
        .and(query_param("receiver_id", format!("eq.{}", PATIENT_ID)))
        .and(query_param("read_at", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "x" }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param("order", "created_at.asc,id.asc"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::message_row(PATIENT_ID, DOCTOR_ID, "Hello doctor", "2025-03-10T08:00:00Z", Some("2025-03-10T08:05:00Z")),
            MockSupabaseResponses::message_row(DOCTOR_ID, PATIENT_ID, "Hello Anita", "2025-03-10T08:10:00Z", Some("2025-03-10T09:00:00Z"))
        ])))
        .mount(&mock_server)
        .await;
    mount_last_message_page(&mock_server).await;

    let uri = format!("/thread?userId={}&peerId={}", PATIENT_ID, DOCTOR_ID);
    let response = app(&config)
        .oneshot(get_request(&uri, &JwtTestUtils::bearer(&patient(), &config)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Hello doctor");
    assert_eq!(messages[1]["content"], "Hello Anita");
}

#[tokio::test]
async fn conversations_report_unknown_peers() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param("order", "created_at.desc,id.desc"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::message_row(STRANGER_ID, PATIENT_ID, "who is this", "2025-03-10T10:00:00Z", None),
            MockSupabaseResponses::message_row(DOCTOR_ID, PATIENT_ID, "Take rest", "2025-03-10T09:00:00Z", None),
            MockSupabaseResponses::message_row(PATIENT_ID, DOCTOR_ID, "Thanks", "2025-03-09T09:00:00Z", None)
        ])))
        .mount(&mock_server)
        .await;
    mount_last_message_page(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": DOCTOR_ID, "name": "Dr. Meera Iyer", "email": "meera@clinic.test", "role": "doctor", "specialty": null }
        ])))
        .mount(&mock_server)
        .await;

    let response = app(&config)
        .oneshot(get_request(&format!("/conversations/{}", PATIENT_ID), &JwtTestUtils::bearer(&patient(), &config)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0]["peerName"], "Unknown");
    assert_eq!(conversations[0]["peerRole"], "unknown");
    assert_eq!(conversations[1]["peerName"], "Dr. Meera Iyer");
    assert_eq!(conversations[1]["lastMessage"], "Take rest");
    assert_eq!(conversations[1]["unreadCount"], 1);
}

#[tokio::test]
async fn unread_count_is_exact_beyond_the_row_cap() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/messages"))
        .and(query_param("receiver_id", format!("eq.{}", PATIENT_ID)))
        .and(query_param("read_at", "is.null"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(206).insert_header("Content-Range", "0-999/1200"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app(&config)
        .oneshot(get_request(&format!("/unread/{}", PATIENT_ID), &JwtTestUtils::bearer(&patient(), &config)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["totalUnread"], 1200);
}

#[tokio::test]
async fn unread_count_of_another_user_is_forbidden() {
    let config = TestConfig::default();

    let response = app(&config)
        .oneshot(get_request(&format!("/unread/{}", DOCTOR_ID), &JwtTestUtils::bearer(&patient(), &config)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
