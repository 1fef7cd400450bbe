use http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use shared_config::AppConfig;

const MODEL_HEADER: HeaderName = HeaderName::from_static("x-gemini-model");

/// Listed origins only, or any origin when credentials are off and no
/// list is given. Credentials without a list is a startup error.
pub fn cors_layer(config: &AppConfig) -> Result<CorsLayer, String> {
    config.validate_cors()?;

    if config.cors_origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([MODEL_HEADER]));
    }

    let origins: Vec<HeaderValue> = config.cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(config.cors_credentials)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([MODEL_HEADER]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::TestConfig;

    #[test]
    fn test_credentials_need_origins() {
        let mut config = TestConfig::default().to_app_config();
        config.cors_origins.clear();
        assert!(cors_layer(&config).is_err());

        config.cors_credentials = false;
        assert!(cors_layer(&config).is_ok());
    }

    #[test]
    fn test_listed_origins() {
        let config = TestConfig::default().to_app_config();
        assert!(cors_layer(&config).is_ok());
    }
}
