//! JSON EPG API reader

use chrono::{DateTime, FixedOffset, NaiveDate};
use log::info;
use serde::Deserialize;

use super::EpgSource;
use crate::config::AppConfig;
use crate::epg::time::{from_unix_secs, parse_iso_time};
use crate::error::{EpgError, Result};
use crate::models::{Channel, Programme, SourceChannel, SourceListing};
use crate::net::HttpClient;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    channels: Vec<ApiChannel>,
    programmes: Vec<ApiProgramme>,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: ApiId,
    name: String,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiProgramme {
    channel: ApiId,
    start: ApiTime,
    stop: ApiTime,
    title: String,
    #[serde(default)]
    desc: Option<String>,
}

/// Identifiers arrive as strings or plain numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Text(String),
    Number(i64),
}

impl ApiId {
    fn into_string(self) -> String {
        match self {
            ApiId::Text(s) => s,
            ApiId::Number(n) => n.to_string(),
        }
    }
}

/// ISO 8601 string or Unix seconds
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiTime {
    Text(String),
    Unix(i64),
}

impl ApiTime {
    fn resolve(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            ApiTime::Text(s) => parse_iso_time(s),
            ApiTime::Unix(secs) => from_unix_secs(*secs),
        }
    }
}

impl std::fmt::Display for ApiTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiTime::Text(s) => write!(f, "{}", s),
            ApiTime::Unix(secs) => write!(f, "{}", secs),
        }
    }
}

/// Reads one day of listings from `{base}/api/epg?country={cc}&date=YYYY-MM-DD`
pub struct ApiSource {
    client: HttpClient,
    base_url: String,
    country: String,
    date: NaiveDate,
}

impl ApiSource {
    pub fn new(client: HttpClient, base_url: &str, country: &str, date: NaiveDate) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
            date,
        }
    }

    /// Source for today's local date
    pub fn from_config(config: &AppConfig) -> Self {
        let today = chrono::Local::now().date_naive();
        Self::new(
            HttpClient::from_config(config),
            &config.api_base_url,
            &config.api_country,
            today,
        )
    }

    pub fn query_url(&self) -> String {
        format!(
            "{}/api/epg?country={}&date={}",
            self.base_url,
            self.country,
            self.date.format("%Y-%m-%d")
        )
    }
}

impl EpgSource for ApiSource {
    fn name(&self) -> &str {
        "api"
    }

    fn fetch(&self) -> Result<SourceListing> {
        let url = self.query_url();
        info!("Fetching EPG API: {}", url);
        let body = self.client.get_bytes(&url)?;
        listing_from_json(&body)
    }
}

/// Validate an API response and map it onto the listing model.
///
/// Any missing field or unreadable timestamp is a [`EpgError::Schema`] error.
pub(crate) fn listing_from_json(body: &[u8]) -> Result<SourceListing> {
    let response: ApiResponse =
        serde_json::from_slice(body).map_err(|e| EpgError::Schema(format!("API response: {}", e)))?;

    let channels = response
        .channels
        .into_iter()
        .map(channel_from_api)
        .collect::<Result<Vec<_>>>()?;

    let programmes = response
        .programmes
        .into_iter()
        .map(programme_from_api)
        .collect::<Result<Vec<_>>>()?;

    Ok(SourceListing {
        channels,
        programmes,
        ..SourceListing::default()
    })
}

/// Trimmed text, or `None` when nothing is left
fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn channel_from_api(c: ApiChannel) -> Result<SourceChannel> {
    let id = c.id.into_string();
    let display_name = clean(Some(c.name))
        .ok_or_else(|| EpgError::Schema(format!("channel '{}' has a blank name", id)))?;

    Ok(SourceChannel::new(Channel {
        id,
        display_name,
        icon: clean(c.icon),
    }))
}

fn programme_from_api(p: ApiProgramme) -> Result<Programme> {
    let channel_id = p.channel.into_string();
    let title = clean(Some(p.title)).ok_or_else(|| {
        EpgError::Schema(format!("programme on channel '{}' has a blank title", channel_id))
    })?;

    let unreadable = |field: &str, value: &ApiTime| {
        EpgError::Schema(format!(
            "programme '{}' has unreadable {} time '{}'",
            title, field, value
        ))
    };
    let start = p.start.resolve().ok_or_else(|| unreadable("start", &p.start))?;
    let stop = p.stop.resolve().ok_or_else(|| unreadable("stop", &p.stop))?;

    Ok(Programme {
        channel_id,
        start,
        stop,
        title,
        description: clean(p.desc),
        category: None,
    })
}
