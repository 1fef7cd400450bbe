use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::models::{Advisory, Condition, NotificationKind, Severity, WeatherSummary};
use crate::services::upstream::UpstreamClient;

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub current: Option<CurrentWeather>,
    #[serde(default)]
    pub hourly: HourlySeries,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub weather_code: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
}

pub struct WeatherService<'a> {
    client: &'a UpstreamClient,
    geocoding_base_url: String,
    weather_base_url: String,
    country: String,
}

impl<'a> WeatherService<'a> {
    pub fn new(client: &'a UpstreamClient, geocoding_base_url: &str, weather_base_url: &str, country: &str) -> Self {
        Self {
            client,
            geocoding_base_url: geocoding_base_url.trim_end_matches('/').to_string(),
            weather_base_url: weather_base_url.trim_end_matches('/').to_string(),
            country: country.trim().to_string(),
        }
    }

    /// Looks the city up within the default country first, then anywhere.
    pub async fn geocode(&self, city: &str) -> Result<Place> {
        let city = city.trim();
        if city.is_empty() {
            return Err(anyhow!("City not found"));
        }

        let base = format!(
            "{}/v1/search?name={}&count=1&language=en&format=json",
            self.geocoding_base_url,
            urlencoding::encode(city),
        );

        if !self.country.is_empty() {
            let scoped: GeocodingResponse = self.client
                .fetch_json(&format!("{}&countryCode={}", base, urlencoding::encode(&self.country)))
                .await?;
            if let Some(found) = scoped.results.into_iter().next() {
                return Ok(found.into());
            }
        }

        let anywhere: GeocodingResponse = self.client.fetch_json(&base).await?;
        anywhere.results
            .into_iter()
            .next()
            .map(Place::from)
            .ok_or_else(|| anyhow!("City not found: {}", city))
    }

    pub async fn forecast(&self, place: &Place) -> Result<Forecast> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,weather_code\
             &hourly=precipitation_probability,temperature_2m&forecast_days=1&timezone=auto&temperature_unit=celsius",
            self.weather_base_url, place.latitude, place.longitude,
        );
        self.client.fetch_json(&url).await
    }
}

impl From<GeocodingResult> for Place {
    fn from(result: GeocodingResult) -> Self {
        Self {
            name: result.name,
            latitude: result.latitude,
            longitude: result.longitude,
        }
    }
}

pub fn classify_condition(code: i64) -> Condition {
    match code {
        0 => Condition::Clear,
        1..=3 => Condition::Clouds,
        45 | 48 => Condition::Fog,
        51 | 53 | 55 | 56 | 57 => Condition::Drizzle,
        61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => Condition::Rain,
        71 | 73 | 75 | 77 | 85 | 86 => Condition::Snow,
        95 | 96 | 99 => Condition::Thunderstorm,
        _ => Condition::Clear,
    }
}

/// Current temperature, else the hourly reading closest to `now`, else 0.
pub fn best_temperature(forecast: &Forecast, now: DateTime<Utc>) -> f64 {
    if let Some(temp) = forecast.current.as_ref().and_then(|c| c.temperature_2m) {
        return temp;
    }

    let offset = Duration::seconds(forecast.utc_offset_seconds);
    forecast.hourly.time
        .iter()
        .zip(&forecast.hourly.temperature_2m)
        .filter_map(|(time, temp)| {
            // Hourly times are local to the forecast location.
            let local = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M").ok()?;
            let instant = local.and_utc() - offset;
            Some(((instant - now).num_seconds().abs(), temp.unwrap_or(0.0)))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, temp)| temp)
        .unwrap_or(0.0)
}

/// Highest hourly precipitation probability as a fraction.
pub fn max_precipitation(forecast: &Forecast) -> f64 {
    forecast.hourly.precipitation_probability
        .iter()
        .flatten()
        .copied()
        .fold(0.0, f64::max)
        / 100.0
}

pub fn summarize(forecast: &Forecast, now: DateTime<Utc>) -> WeatherSummary {
    let current = forecast.current.clone().unwrap_or_default();
    let condition = classify_condition(current.weather_code.unwrap_or(0));

    WeatherSummary {
        temp: best_temperature(forecast, now).round() as i64,
        condition,
        description: condition.as_str().to_lowercase(),
        humidity: current.relative_humidity_2m.unwrap_or(0.0),
    }
}

/// Rule-derived advisories; each rule fires independently.
pub fn derive_advisories(summary: &WeatherSummary, precipitation: f64, city: &str) -> Vec<Advisory> {
    let temp = summary.temp;
    let mut advisories = Vec::new();

    if summary.condition == Condition::Clear && temp >= 30 {
        advisories.push(Advisory {
            kind: NotificationKind::Sunny,
            title: format!("Sunny in {}", city),
            message: format!("It is sunny and {} C in {}. Use sunscreen, hydrate, and wear a hat.", temp, city),
            severity: Severity::Info,
        });
    }

    if summary.condition.is_wet() || precipitation >= 0.6 {
        advisories.push(Advisory {
            kind: NotificationKind::Rain,
            title: format!("Rain expected in {}", city),
            message: format!(
                "Rain is likely today ({}% chance). Carry an umbrella and wear non-slip shoes.",
                (precipitation * 100.0).round() as i64
            ),
            severity: Severity::Warning,
        });
    }

    if temp <= 15 {
        advisories.push(Advisory {
            kind: NotificationKind::Winter,
            title: format!("Cool weather in {}", city),
            message: format!("Temperature is {} C. Stay warm and avoid long exposure to cold.", temp),
            severity: Severity::Info,
        });
    }

    if temp >= 35 || (temp >= 32 && summary.humidity >= 70.0) {
        advisories.push(Advisory {
            kind: NotificationKind::Heat,
            title: format!("Heat caution in {}", city),
            message: format!("It is hot ({} C). Rest often, drink fluids, and avoid peak sun hours.", temp),
            severity: Severity::Warning,
        });
    }

    advisories
}

/// One weather notification per user, city, type and UTC day.
pub fn weather_fingerprint(user_id: &str, city: &str, advisory: &Advisory, day: NaiveDate) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        user_id,
        city,
        advisory.kind,
        advisory.title,
        day.format("%Y-%m-%d")
    )
}
