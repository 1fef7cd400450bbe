use std::env;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub admin_email: String,
    pub admin_password: String,
    pub cors_origins: Vec<String>,
    pub cors_credentials: bool,
    pub default_country: String,
    pub geocoding_base_url: String,
    pub weather_base_url: String,
    pub health_press_url: String,
    pub health_home_url: String,
    pub fetch_timeout_ms: u64,
    pub gemini_api_key: String,
    pub gemini_model: Option<String>,
    pub gemini_base_url: String,
}

fn var_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

fn var_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using default", key);
        default.to_string()
    })
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Splits a comma separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            port: parse_or_default("PORT", DEFAULT_PORT),
            supabase_url: var_or_empty("SUPABASE_URL"),
            supabase_anon_key: var_or_empty("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_service_key: var_or_empty("SUPABASE_SERVICE_ROLE_KEY"),
            session_secret: var_or_empty("SESSION_SECRET"),
            session_ttl_hours: parse_or_default("SESSION_TTL_HOURS", 24),
            admin_email: var_or_default("ADMIN_EMAIL", "admin@vnx.com"),
            admin_password: var_or_default("ADMIN_PASSWORD", "admin123"),
            cors_origins: parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default()),
            cors_credentials: env::var("CORS_CREDENTIALS")
                .map(|raw| raw.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            default_country: var_or_default("OPENWEATHER_COUNTRY", "IN"),
            geocoding_base_url: var_or_default(
                "GEOCODING_BASE_URL",
                "https://geocoding-api.open-meteo.com",
            ),
            weather_base_url: var_or_default("WEATHER_BASE_URL", "https://api.open-meteo.com"),
            health_press_url: var_or_default("MOHFW_PRESS_URL", "https://mohfw.gov.in/press-releases"),
            health_home_url: var_or_default("MOHFW_HOME_URL", "https://mohfw.gov.in/"),
            fetch_timeout_ms: parse_or_default("FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS),
            gemini_api_key: var_or_empty("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL").ok().filter(|m| !m.trim().is_empty()),
            gemini_base_url: var_or_default(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.session_secret.is_empty()
    }

    pub fn is_ai_configured(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }

    /// Credentialed CORS needs an explicit origin list.
    pub fn validate_cors(&self) -> Result<(), String> {
        if self.cors_credentials && self.cors_origins.is_empty() {
            return Err(
                "CORS_ORIGINS must be set when CORS_CREDENTIALS=true. Use comma-separated allowed origins."
                    .to_string(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_drops_blanks() {
        let origins = parse_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_credentialed_cors_requires_origins() {
        let mut config = AppConfig {
            port: DEFAULT_PORT,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: String::new(),
            session_secret: String::new(),
            session_ttl_hours: 24,
            admin_email: "admin@vnx.com".to_string(),
            admin_password: "admin123".to_string(),
            cors_origins: vec![],
            cors_credentials: true,
            default_country: "IN".to_string(),
            geocoding_base_url: String::new(),
            weather_base_url: String::new(),
            health_press_url: String::new(),
            health_home_url: String::new(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            gemini_api_key: String::new(),
            gemini_model: None,
            gemini_base_url: String::new(),
        };
        assert!(config.validate_cors().is_err());

        config.cors_credentials = false;
        assert!(config.validate_cors().is_ok());

        config.cors_credentials = true;
        config.cors_origins = vec!["http://localhost:5173".to_string()];
        assert!(config.validate_cors().is_ok());
    }
}
