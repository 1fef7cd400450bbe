use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Sunny,
    Rain,
    Winter,
    Heat,
    Health,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Sunny => "sunny",
            NotificationKind::Rain => "rain",
            NotificationKind::Winter => "winter",
            NotificationKind::Heat => "heat",
            NotificationKind::Health => "health",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// Weather condition bucket derived from a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    Clear,
    Clouds,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Clouds => "Clouds",
            Condition::Fog => "Fog",
            Condition::Drizzle => "Drizzle",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
        }
    }

    pub fn is_wet(&self) -> bool {
        matches!(self, Condition::Rain | Condition::Drizzle | Condition::Thunderstorm)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the `notifications` table.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub city: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    pub fingerprint: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    pub fn to_public(&self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id.clone(),
            city: self.city.clone(),
            kind: self.kind,
            title: self.title.clone(),
            message: self.message.clone(),
            severity: self.severity,
            source: self.source.clone(),
            url: self.url.clone(),
            read: self.read,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub city: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub source: String,
    pub url: String,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// A notification about to be recorded, keyed by its fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherSummary {
    pub temp: i64,
    pub condition: Condition,
    pub description: String,
    pub humidity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub city: String,
    pub summary: Option<WeatherSummary>,
    pub notifications: Vec<Notification>,
    /// Rows this refresh actually wrote; repeats of a fingerprint count zero.
    #[serde(skip)]
    pub created: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub url: String,
    pub source: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub user_id: String,
    pub city: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("User ID required")]
    MissingUserId,

    #[error("City required")]
    MissingCity,

    #[error("Notification service unavailable: {0}")]
    Setup(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::MissingUserId | NotificationError::MissingCity => {
                AppError::BadRequest(err.to_string())
            }
            NotificationError::Setup(_) => AppError::Internal(err.to_string()),
            NotificationError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}
