use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{rest_path, SupabaseClient};
use shared_utils::dates::{format_date, normalize_date};

use crate::models::{DiaryEntry, DiaryError, DiaryRecord, Mood, UpsertDiaryRequest};

const UNIQUE_KEY: &str = "user_id,date";

pub struct DiaryService {
    supabase: SupabaseClient,
}

impl DiaryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_entry(&self, user_id: &str, date: &str) -> Result<Option<DiaryEntry>, DiaryError> {
        let user_id = required_user(user_id)?;
        let date = normalize_date(date).ok_or(DiaryError::InvalidDate)?;
        debug!("Fetching diary entry of {} for {}", user_id, date);

        let record: Option<DiaryRecord> = self.supabase
            .select_one(&rest_path(
                "diary_entries",
                &format!("user_id=eq.{}&date=eq.{}", urlencoding::encode(user_id), format_date(date)),
            ))
            .await?;

        Ok(record.map(|r| r.to_public()))
    }

    /// Writes the whole entry for (user, date). Fields missing from the
    /// request are stored as their defaults, never kept from before.
    pub async fn upsert_entry(&self, request: UpsertDiaryRequest) -> Result<DiaryEntry, DiaryError> {
        let user_id = required_user(&request.user_id)?;
        let date = normalize_date(&request.date).ok_or(DiaryError::InvalidDate)?;

        let mood = match request.mood.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(raw) => Some(raw.parse::<Mood>()?),
            None => None,
        };

        let now = Utc::now().to_rfc3339();
        let record: DiaryRecord = self.supabase
            .upsert("diary_entries", UNIQUE_KEY, json!({
                "user_id": user_id,
                "date": format_date(date),
                "text": request.text.unwrap_or_default(),
                "mood": mood,
                "image_data": request.image_data.unwrap_or_default(),
                "updated_at": now
            }))
            .await?;
        info!("Diary entry {} saved for {}", record.date, user_id);

        Ok(record.to_public())
    }
}

fn required_user(raw: &str) -> Result<&str, DiaryError> {
    let user_id = raw.trim();
    if user_id.is_empty() {
        Err(DiaryError::MissingUserId)
    } else {
        Ok(user_id)
    }
}
