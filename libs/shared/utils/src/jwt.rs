use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use shared_models::auth::{SessionClaims, SessionUser};

/// Issues an HS256 session token for `user`, valid for `ttl_hours`.
pub fn issue_token(user: &SessionUser, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    let claims = SessionClaims {
        sub: user.id.clone(),
        exp: Some(exp.timestamp().max(0) as u64),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        iat: Some(now.timestamp().max(0) as u64),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to sign token: {}", e))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<SessionUser, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!("Token rejected: {}", e);
        match e.kind() {
            ErrorKind::ExpiredSignature => "Token expired".to_string(),
            ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                "Invalid token format".to_string()
            }
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => "Invalid claims format".to_string(),
            _ => "Invalid token".to_string(),
        }
    })?;

    let claims = data.claims;
    let issued_at = claims.iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = SessionUser {
        id: claims.sub,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        issued_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::auth::Role;

    fn doctor() -> SessionUser {
        SessionUser {
            id: "5b0d7c56-7a3e-4a4b-9f45-2b8e7f1c9a10".to_string(),
            email: Some("doctor@example.com".to_string()),
            name: Some("Dr. Meera".to_string()),
            role: Role::Doctor,
            issued_at: None,
        }
    }

    #[test]
    fn test_issued_token_validates() {
        let token = issue_token(&doctor(), "secret", 1).unwrap();
        let user = validate_token(&token, "secret").unwrap();
        assert_eq!(user.id, doctor().id);
        assert_eq!(user.role, Role::Doctor);
        assert_eq!(user.name.as_deref(), Some("Dr. Meera"));
        assert!(user.issued_at.is_some());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(&doctor(), "secret", 1).unwrap();
        assert_eq!(validate_token(&token, "other").unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issue_token(&doctor(), "secret", -1).unwrap();
        assert_eq!(validate_token(&token, "secret").unwrap_err(), "Token expired");
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert_eq!(validate_token("not-a-jwt", "secret").unwrap_err(), "Invalid token format");
        assert!(validate_token("invalid.token.format", "secret").is_err());
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let claims = SessionClaims {
            sub: "u1".to_string(),
            exp: Some((Utc::now().timestamp() + 3600) as u64),
            email: None,
            name: None,
            role: Role::Patient,
            iat: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn test_missing_secret_refuses_to_issue() {
        assert!(issue_token(&doctor(), "", 1).is_err());
    }
}
