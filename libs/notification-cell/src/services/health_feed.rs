use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html};
use tracing::warn;

use crate::models::{Advisory, NotificationKind, Severity};
use crate::services::upstream::UpstreamClient;

pub const MAX_HEALTH_LINKS: usize = 10;
pub const HEALTH_CITY: &str = "India";
pub const HEALTH_SOURCE: &str = "mohfw";
const HEALTH_MESSAGE: &str = "Official MoHFW update. Open to read details.";
/// Below this many press-page links the home page is scraped too.
const MIN_PRESS_LINKS: usize = 3;

static SHARED_EXTRACTOR: LazyLock<Result<LinkExtractor, String>> =
    LazyLock::new(|| LinkExtractor::new().map_err(|e| format!("{:#}", e)));

#[derive(Debug, Clone, PartialEq)]
pub struct HealthLink {
    pub title: String,
    pub url: String,
}

impl HealthLink {
    pub fn fingerprint(&self, user_id: &str) -> String {
        format!("{}|{}|{}", user_id, HEALTH_SOURCE, self.url)
    }
}

/// Pulls ministry announcements out of raw HTML pages.
pub struct LinkExtractor {
    whitespace: Regex,
    keywords: Regex,
    alert_words: Regex,
}

impl LinkExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            whitespace: Regex::new(r"\s+").context("whitespace pattern")?,
            keywords: Regex::new(r"(?i)press|release|advisory|guideline|covid").context("keyword pattern")?,
            alert_words: Regex::new(r"(?i)alert|emergency|outbreak|epidemic|pandemic").context("alert pattern")?,
        })
    }

    /// Process-wide instance, compiled on first use.
    pub fn shared() -> Result<&'static LinkExtractor> {
        SHARED_EXTRACTOR
            .as_ref()
            .map_err(|e| anyhow!("link extractor unavailable: {}", e))
    }

    /// Announcement links in document order, relative hrefs resolved
    /// against `base_url`.
    pub fn extract(&self, html: &str, base_url: &str) -> Vec<HealthLink> {
        let base = Url::parse(base_url).ok();
        let document = Html::parse_document(html);

        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().name() == "a")
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                let text = self.text_of(anchor);
                if href.is_empty() || text.is_empty() {
                    return None;
                }
                if !self.keywords.is_match(&text) && !self.keywords.is_match(href) {
                    return None;
                }

                let url = if href.starts_with("http") {
                    href.to_string()
                } else {
                    base.as_ref()?.join(href).ok()?.to_string()
                };
                Some(HealthLink { title: text, url })
            })
            .collect()
    }

    fn text_of(&self, anchor: ElementRef<'_>) -> String {
        let raw: String = anchor.text().collect();
        self.whitespace.replace_all(&raw, " ").trim().to_string()
    }

    pub fn severity_for(&self, title: &str) -> Severity {
        if self.alert_words.is_match(title) {
            Severity::Danger
        } else {
            Severity::Info
        }
    }

    pub fn advisory_for(&self, link: &HealthLink) -> Advisory {
        Advisory {
            kind: NotificationKind::Health,
            title: format!("MoHFW: {}", link.title),
            message: HEALTH_MESSAGE.to_string(),
            severity: self.severity_for(&link.title),
        }
    }
}

/// First occurrence of each URL wins; at most `MAX_HEALTH_LINKS`.
pub fn dedup_links(links: Vec<HealthLink>) -> Vec<HealthLink> {
    let mut unique: Vec<HealthLink> = Vec::new();
    for link in links {
        if !unique.iter().any(|seen| seen.url == link.url) {
            unique.push(link);
        }
        if unique.len() == MAX_HEALTH_LINKS {
            break;
        }
    }
    unique
}

/// Scrapes the press page, adding the home page when it yields too few
/// links. A failed page contributes nothing.
pub async fn fetch_health_links(
    client: &UpstreamClient,
    extractor: &LinkExtractor,
    press_url: &str,
    home_url: &str,
) -> Vec<HealthLink> {
    let mut links = match client.fetch_text(press_url).await {
        Ok(html) => extractor.extract(&html, press_url),
        Err(e) => {
            warn!("Press release page fetch failed: {}", e);
            Vec::new()
        }
    };

    if links.len() < MIN_PRESS_LINKS {
        match client.fetch_text(home_url).await {
            Ok(html) => links.extend(extractor.extract(&html, home_url)),
            Err(e) => warn!("Home page fetch failed: {}", e),
        }
    }

    dedup_links(links)
}
