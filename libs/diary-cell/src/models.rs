use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Tired,
    Sad,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Tired => "tired",
            Mood::Sad => "sad",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "calm" => Ok(Mood::Calm),
            "tired" => Ok(Mood::Tired),
            "sad" => Ok(Mood::Sad),
            _ => Err(DiaryError::InvalidMood),
        }
    }
}

/// Row of the `diary_entries` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DiaryRecord {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub text: String,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub image_data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiaryRecord {
    pub fn to_public(&self) -> DiaryEntry {
        DiaryEntry {
            id: self.id,
            user_id: self.user_id.clone(),
            date: self.date.format("%Y-%m-%d").to_string(),
            text: self.text.clone(),
            mood: self.mood,
            image_data: self.image_data.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: String,
    pub date: String,
    pub text: String,
    pub mood: Option<Mood>,
    pub image_data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDiaryRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub date: String,
    pub text: Option<String>,
    pub mood: Option<String>,
    pub image_data: Option<String>,
}

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("User ID required")]
    MissingUserId,

    #[error("Valid date required")]
    InvalidDate,

    #[error("Mood must be one of happy, calm, tired or sad")]
    InvalidMood,

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<DiaryError> for AppError {
    fn from(err: DiaryError) -> Self {
        match err {
            DiaryError::MissingUserId | DiaryError::InvalidDate | DiaryError::InvalidMood => {
                AppError::ValidationError(err.to_string())
            }
            DiaryError::Database(_) => AppError::Database(err.to_string()),
        }
    }
}
