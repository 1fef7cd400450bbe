use std::sync::Arc;

use axum::extract::{Json, State};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::{LoginRequest, LoginResponse};
use crate::services::LoginService;

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = LoginService::new(&config);
    let response = service.login(request).await?;

    Ok(Json(response))
}

/// Reports who a bearer token belongs to.
#[axum::debug_handler]
pub async fn verify_session(
    State(config): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Verifying session token");

    let TypedHeader(auth) = auth
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let user = validate_token(auth.token(), &config.session_secret)
        .map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}
