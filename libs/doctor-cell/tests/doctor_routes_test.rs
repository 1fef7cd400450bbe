use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::doctor_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

const DOCTOR_ID: &str = "5b0d7c56-7a3e-4a4b-9f45-2b8e7f1c9a10";
const PATIENT_ID: &str = "8e9f0a1b-2c3d-4e5f-8a9b-0c1d2e3f4a5b";

fn app(config: &TestConfig) -> Router {
    doctor_routes(config.to_arc())
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn create_doctor_requires_admin() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("meera@clinic.test").with_id(DOCTOR_ID);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&doctor, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "name": "Dr. New",
            "email": "new@clinic.test",
            "password": "pw"
        }).to_string()))
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_doctor_rejects_taken_email() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let admin = TestUser::admin("admin@vnx.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("email", "eq.meera@clinic.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row(DOCTOR_ID)
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&admin, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "name": "Dr. Meera Iyer",
            "email": "meera@clinic.test",
            "password": "pw"
        }).to_string()))
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Email already in use");
}

#[tokio::test]
async fn create_doctor_stores_hash_and_hides_it() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let admin = TestUser::admin("admin@vnx.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::doctor_row(DOCTOR_ID)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&admin, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({
            "name": "Dr. Meera Iyer",
            "email": "meera@clinic.test",
            "password": "pw",
            "specialty": "Obstetrics"
        }).to_string()))
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["doctor"]["id"], DOCTOR_ID);
    assert!(body["doctor"].get("passwordHash").is_none());
    assert!(body["doctor"].get("password_hash").is_none());

    let requests = mock_server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let stored: Value = serde_json::from_slice(&insert.body).unwrap();
    assert!(stored["password_hash"].as_str().unwrap().starts_with("$argon2"));
}

#[tokio::test]
async fn list_doctors_attaches_patient_counts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let admin = TestUser::admin("admin@vnx.com");

    let mut row = MockSupabaseResponses::doctor_row(DOCTOR_ID);
    row["patients"] = json!([{ "count": 1500 }]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("role", "eq.doctor"))
        .and(query_param("select", "*,patients(count)"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&admin, &config))
        .body(Body::empty())
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["doctors"][0]["patientCount"], 1500);
    assert_eq!(body["doctors"][0]["name"], "Dr. Meera Iyer");
}

#[tokio::test]
async fn get_doctor_unknown_id_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let patient = TestUser::patient("anita@example.com").with_id(PATIENT_ID);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", DOCTOR_ID))
        .header("authorization", JwtTestUtils::bearer(&patient, &config))
        .body(Body::empty())
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_doctor_by_another_doctor_is_forbidden() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let other = TestUser::doctor("other@clinic.test");

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}", DOCTOR_ID))
        .header("authorization", JwtTestUtils::bearer(&other, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "hospital": "Elsewhere" }).to_string()))
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_doctor_trims_fields() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let doctor = TestUser::doctor("meera@clinic.test").with_id(DOCTOR_ID);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", DOCTOR_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row(DOCTOR_ID)
        ])))
        .mount(&mock_server)
        .await;

    let mut updated = MockSupabaseResponses::doctor_row(DOCTOR_ID);
    updated["hospital"] = json!("General Hospital");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}", DOCTOR_ID))
        .header("authorization", JwtTestUtils::bearer(&doctor, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "hospital": "  General Hospital  " }).to_string()))
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["doctor"]["hospital"], "General Hospital");

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests.iter().find(|r| r.method.as_str() == "PATCH").unwrap();
    let sent: Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(sent["hospital"], "General Hospital");
    assert!(sent.get("email").is_none());
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let config = TestConfig::default();

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
