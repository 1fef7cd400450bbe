use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{rest_path, DbError, SupabaseClient};
use shared_utils::limits::DEFAULT_PAGE_LIMIT;

use crate::models::{
    Advisory, Notification, NotificationError, NotificationRecord, RefreshResponse, Resource,
    WeatherSummary,
};
use crate::services::health_feed::{fetch_health_links, LinkExtractor, HEALTH_CITY, HEALTH_SOURCE};
use crate::services::resources::{annotate_resources, curated_resources};
use crate::services::upstream::UpstreamClient;
use crate::services::weather::{
    derive_advisories, max_precipitation, summarize, weather_fingerprint, Place, WeatherService,
};

const WEATHER_SOURCE: &str = "open-meteo";

pub struct NotificationService {
    supabase: SupabaseClient,
    upstream: UpstreamClient,
    extractor: &'static LinkExtractor,
    geocoding_base_url: String,
    weather_base_url: String,
    country: String,
    health_press_url: String,
    health_home_url: String,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        let upstream = UpstreamClient::new(config.fetch_timeout_ms)
            .map_err(|e| NotificationError::Setup(e.to_string()))?;
        let extractor = LinkExtractor::shared().map_err(|e| NotificationError::Setup(e.to_string()))?;

        Ok(Self {
            supabase: SupabaseClient::new(config),
            upstream,
            extractor,
            geocoding_base_url: config.geocoding_base_url.clone(),
            weather_base_url: config.weather_base_url.clone(),
            country: config.default_country.clone(),
            health_press_url: config.health_press_url.clone(),
            health_home_url: config.health_home_url.clone(),
        })
    }

    fn weather(&self) -> WeatherService<'_> {
        WeatherService::new(&self.upstream, &self.geocoding_base_url, &self.weather_base_url, &self.country)
    }

    /// Records today's weather advisories and the latest health updates
    /// for `user_id`, then returns the newest notifications. Upstream
    /// failures only shrink what gets recorded.
    pub async fn refresh(&self, user_id: &str, city: &str) -> Result<RefreshResponse, NotificationError> {
        let user_id = user_id.trim();
        let city = city.trim();
        if user_id.is_empty() {
            return Err(NotificationError::MissingUserId);
        }
        if city.is_empty() {
            return Err(NotificationError::MissingCity);
        }
        debug!("Refreshing notifications for {} in {}", user_id, city);

        let mut resolved_city = city.to_string();
        let mut summary = None;
        let mut created = 0;

        match self.weather().geocode(city).await {
            Ok(place) => {
                resolved_city = place.name.clone();
                match self.record_weather(user_id, &place).await {
                    Ok((current, written)) => {
                        summary = Some(current);
                        created += written;
                    }
                    Err(e) => warn!("Weather refresh for {} failed: {}", place.name, e),
                }
            }
            Err(e) => warn!("Geocoding {} failed: {}", city, e),
        }

        created += self.record_health_updates(user_id).await?;

        let notifications = self.list(user_id, None, DEFAULT_PAGE_LIMIT).await?;
        Ok(RefreshResponse {
            city: resolved_city,
            summary,
            notifications,
            created,
        })
    }

    async fn record_weather(&self, user_id: &str, place: &Place) -> anyhow::Result<(WeatherSummary, usize)> {
        let forecast = self.weather().forecast(place).await?;
        let now = Utc::now();
        let summary = summarize(&forecast, now);
        let advisories = derive_advisories(&summary, max_precipitation(&forecast), &place.name);

        let mut created = 0;
        for advisory in &advisories {
            let fingerprint = weather_fingerprint(user_id, &place.name, advisory, now.date_naive());
            if self.record(user_id, &place.name, advisory, WEATHER_SOURCE, "", &fingerprint).await? {
                created += 1;
            }
        }
        info!("{} new weather notifications for {} in {}", created, user_id, place.name);

        Ok((summary, created))
    }

    async fn record_health_updates(&self, user_id: &str) -> Result<usize, NotificationError> {
        let links = fetch_health_links(
            &self.upstream,
            self.extractor,
            &self.health_press_url,
            &self.health_home_url,
        )
        .await;

        let mut created = 0;
        for link in &links {
            let advisory = self.extractor.advisory_for(link);
            let fingerprint = link.fingerprint(user_id);
            if self.record(user_id, HEALTH_CITY, &advisory, HEALTH_SOURCE, &link.url, &fingerprint).await? {
                created += 1;
            }
        }
        if created > 0 {
            info!("{} new health updates for {}", created, user_id);
        }

        Ok(created)
    }

    /// Inserts unless the fingerprint was already recorded; true when a
    /// new row was written.
    async fn record(
        &self,
        user_id: &str,
        city: &str,
        advisory: &Advisory,
        source: &str,
        url: &str,
        fingerprint: &str,
    ) -> Result<bool, DbError> {
        let inserted: Option<Value> = self.supabase
            .insert_if_absent("notifications", "fingerprint", json!({
                "user_id": user_id,
                "city": city,
                "type": advisory.kind,
                "title": advisory.title,
                "message": advisory.message,
                "severity": advisory.severity,
                "source": source,
                "url": url,
                "fingerprint": fingerprint,
                "read": false,
                "created_at": Utc::now().to_rfc3339()
            }))
            .await?;

        Ok(inserted.is_some())
    }

    pub async fn list(
        &self,
        user_id: &str,
        city: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(NotificationError::MissingUserId);
        }

        let mut query = format!("user_id=eq.{}", urlencoding::encode(user_id));
        if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
            query.push_str(&format!("&city=eq.{}", urlencoding::encode(city)));
        }
        query.push_str(&format!("&order=created_at.desc&limit={}", limit));

        let records: Vec<NotificationRecord> = self.supabase
            .select(&rest_path("notifications", &query))
            .await?;

        Ok(records.iter().map(NotificationRecord::to_public).collect())
    }

    pub async fn resources(&self) -> Vec<Resource> {
        self.resources_from(curated_resources()).await
    }

    pub async fn resources_from(&self, resources: Vec<Resource>) -> Vec<Resource> {
        annotate_resources(&self.upstream, resources).await
    }
}
