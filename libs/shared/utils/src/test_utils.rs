use std::sync::Arc;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, DEFAULT_FETCH_TIMEOUT_MS};
use shared_models::auth::{Role, SessionUser};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub upstream_url: String,
    pub gemini_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            upstream_url: "http://localhost:54322".to_string(),
            gemini_api_key: String::new(),
        }
    }
}

impl TestConfig {
    /// Points the database at `uri` (usually a `MockServer`).
    pub fn with_supabase_url(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            ..Self::default()
        }
    }

    /// Points both the database and every outbound upstream at `uri`.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            upstream_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            port: 0,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            session_secret: self.jwt_secret.clone(),
            session_ttl_hours: 24,
            admin_email: "admin@vnx.com".to_string(),
            admin_password: "admin123".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
            cors_credentials: true,
            default_country: "IN".to_string(),
            geocoding_base_url: self.upstream_url.clone(),
            weather_base_url: self.upstream_url.clone(),
            health_press_url: format!("{}/press-releases", self.upstream_url),
            health_home_url: format!("{}/", self.upstream_url),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_model: None,
            gemini_base_url: self.upstream_url.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            name: "Test User".to_string(),
            role: Role::Patient,
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: "Test User".to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self {
            id: "admin".to_string(),
            ..Self::new(email, Role::Admin)
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn to_session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            name: Some(self.name.clone()),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "name": user.name,
            "role": user.role,
            "iat": now.timestamp().max(0),
            "exp": exp.timestamp().max(0)
        });

        encode(&Header::new(Algorithm::HS256), &payload, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("test token signs")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &TestConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.jwt_secret, None))
    }
}

/// Rows shaped the way PostgREST returns them for each table.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_row(doctor_id: &str) -> Value {
        json!({
            "id": doctor_id,
            "name": "Dr. Meera Iyer",
            "email": "meera@clinic.test",
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$LXEWQrcmsEQBYnyp+6wy9chTD7GQPMTbAiWHF5IaSIE",
            "role": "doctor",
            "specialty": "Obstetrics",
            "phone": "9000000001",
            "qualification": "MD",
            "experience": "12 years",
            "hospital": "City Hospital",
            "location": "Chennai",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn patient_row(patient_id: &str, doctor_id: &str) -> Value {
        json!({
            "id": patient_id,
            "name": "Anita Rao",
            "email": "anita@example.com",
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$LXEWQrcmsEQBYnyp+6wy9chTD7GQPMTbAiWHF5IaSIE",
            "age": 29,
            "pregnancy_start_date": "2025-01-01",
            "gestational_week": 12,
            "contact_phone": "9000000002",
            "husband_name": "Ravi Rao",
            "husband_phone": "9000000003",
            "medical_notes": "",
            "risk_status": "normal",
            "doctor_id": doctor_id,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(appointment_id: &str, patient_id: &str, doctor_id: &str, status: &str) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": "2025-03-10",
            "time": "10:30 AM",
            "notes": "",
            "status": status,
            "created_at": "2025-03-01T09:00:00Z",
            "updated_at": "2025-03-01T09:00:00Z",
            "patient": { "name": "Anita Rao", "email": "anita@example.com" },
            "doctor": { "name": "Dr. Meera Iyer", "email": "meera@clinic.test", "specialty": "Obstetrics" }
        })
    }

    pub fn message_row(sender_id: &str, receiver_id: &str, content: &str, created_at: &str, read_at: Option<&str>) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "sender_id": sender_id,
            "receiver_id": receiver_id,
            "content": content,
            "created_at": created_at,
            "read_at": read_at
        })
    }

    pub fn notification_row(user_id: &str, kind: &str, title: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "city": "Chennai",
            "type": kind,
            "title": title,
            "message": "",
            "severity": "info",
            "source": "open-meteo",
            "url": "",
            "fingerprint": format!("{}|Chennai|{}|{}|2025-03-10", user_id, kind, title),
            "read": false,
            "created_at": "2025-03-10T06:00:00Z"
        })
    }

    pub fn diary_row(user_id: &str, date: &str, text: &str, mood: Option<&str>) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "date": date,
            "text": text,
            "mood": mood,
            "image_data": "",
            "created_at": "2025-03-10T06:00:00Z",
            "updated_at": "2025-03-10T06:00:00Z"
        })
    }

    pub fn chat_session_row(session_id: &str, user_id: &str, title: &str) -> Value {
        json!({
            "id": session_id,
            "user_id": user_id,
            "title": title,
            "last_message": "",
            "last_at": "2025-03-10T06:00:00Z",
            "created_at": "2025-03-10T06:00:00Z",
            "updated_at": "2025-03-10T06:00:00Z"
        })
    }

    pub fn ai_message_row(session_id: &str, user_id: &str, role: &str, content: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "session_id": session_id,
            "role": role,
            "content": content,
            "created_at": "2025-03-10T06:00:00Z"
        })
    }

    pub fn unique_violation() -> Value {
        json!({
            "code": "23505",
            "details": null,
            "hint": null,
            "message": "duplicate key value violates unique constraint"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.session_secret.is_empty());
        assert!(app_config.validate_cors().is_ok());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, Role::Doctor);

        let session = user.to_session_user();
        assert_eq!(session.email, Some(user.email.clone()));
        assert!(session.is_doctor());
        assert_eq!(session.id, user.id);
    }

    #[test]
    fn test_jwt_token_is_accepted_by_validator() {
        let user = TestUser::patient("p@example.com");
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        let session = validate_token(&token, secret).unwrap();
        assert_eq!(session.id, user.id);
        assert!(session.is_patient());
    }
}
