//! Compressed XMLTV feed reader

use log::info;

use super::EpgSource;
use crate::config::AppConfig;
use crate::epg::{ChannelFilter, EpgParser};
use crate::error::Result;
use crate::models::SourceListing;
use crate::net::HttpClient;

/// Downloads a (usually gzip-compressed) XMLTV feed and keeps the channels
/// matching the configured locale
pub struct FeedSource {
    client: HttpClient,
    url: String,
    filter: ChannelFilter,
}

impl FeedSource {
    pub fn new(client: HttpClient, url: &str, filter: ChannelFilter) -> Self {
        Self {
            client,
            url: url.to_string(),
            filter,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(HttpClient::from_config(config), &config.feed_url, config.feed_filter())
    }
}

impl EpgSource for FeedSource {
    fn name(&self) -> &str {
        "feed"
    }

    fn fetch(&self) -> Result<SourceListing> {
        info!("Downloading XMLTV feed: {}", self.url);
        let body = self.client.get_bytes(&self.url)?;
        info!("Feed downloaded ({} bytes)", body.len());

        let listing = EpgParser::parse_bytes(&body)?;
        info!(
            "Feed has {} channels and {} programmes",
            listing.channels.len(),
            listing.programmes.len()
        );
        Ok(listing)
    }

    fn filter(&self) -> ChannelFilter {
        self.filter.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epg::{normalize, to_xmltv};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tv>
  <channel lang="tr" country="tr" id="trt1"><display-name>TRT 1</display-name></channel>
  <channel lang="en" country="uk" id="bbc1"><display-name>BBC One</display-name></channel>
  <programme channel="trt1" start="20240101100000 +0300" stop="20240101110000 +0300"><title>Haberler</title></programme>
  <programme channel="bbc1" start="20240101100000 +0000" stop="20240101110000 +0000"><title>News</title></programme>
</tv>"#;

    fn gzip(text: &str) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_locale_filter_on_gzip_feed() {
        let listing = EpgParser::parse_bytes(&gzip(FEED)).unwrap();
        let (doc, stats) = normalize(listing, &ChannelFilter::locale("tr")).unwrap();

        assert_eq!(doc.channels.len(), 1);
        assert_eq!(doc.channels[0].id, "trt1");
        assert_eq!(doc.programmes.len(), 1);
        assert_eq!(doc.programmes[0].channel_id, "trt1");
        assert_eq!(stats.orphan_programmes, 1);

        let xml = to_xmltv(&doc).unwrap();
        assert!(xml.contains(r#"<channel id="trt1">"#));
        assert!(!xml.contains("bbc1"));
    }

    #[test]
    fn test_default_config_filter() {
        let source = FeedSource::from_config(&AppConfig::default());
        assert_eq!(source.filter(), ChannelFilter::locale("tr"));
        assert_eq!(source.name(), "feed");
    }
}
