//! Channel listing scraper
//!
//! Reads the channel list from a listing page, then every channel page in a
//! bounded worker pool. Results are put back into listing order before they
//! leave this module.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use log::{debug, info, warn};
use scraper::{ElementRef, Html};
use url::Url;

use super::browser::{selector, HttpPageDriver, PageDriver};
use super::EpgSource;
use crate::config::AppConfig;
use crate::epg::time::parse_iso_time;
use crate::error::{EpgError, Result};
use crate::models::{Channel, Programme, SourceChannel, SourceListing};
use crate::net::HttpClient;

const LISTING_SELECTOR: &str = "li.amr-tvgrid-ceil-left a[title][href]";
const ROW_SELECTOR: &str = "tr[itemprop=publication]";
const START_SELECTOR: &str = "h5[itemprop=startDate][content]";
const TITLE_SELECTOR: &str = "h6[itemprop=name] a";
const DESC_SELECTOR: &str = "span[itemprop=description] .description-text";

/// A channel entry on the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLink {
    pub name: String,
    pub url: String,
}

/// Programmes read from one channel page, plus the rows that were unusable
#[derive(Debug, Default)]
struct ChannelPage {
    programmes: Vec<Programme>,
    skipped: usize,
}

/// Scraper over any [`PageDriver`]; `new_driver` builds one driver per worker
pub struct ScrapeSource<F> {
    listing_url: String,
    workers: usize,
    wait_timeout: Duration,
    assumed_duration: chrono::Duration,
    new_driver: F,
}

impl<F, D> ScrapeSource<F>
where
    F: Fn() -> D + Sync,
    D: PageDriver,
{
    pub fn new(
        listing_url: &str,
        workers: usize,
        wait_timeout: Duration,
        assumed_duration: chrono::Duration,
        new_driver: F,
    ) -> Self {
        Self {
            listing_url: listing_url.to_string(),
            workers: workers.max(1),
            wait_timeout,
            assumed_duration,
            new_driver,
        }
    }

    fn read_listing(&self) -> Result<Vec<ChannelLink>> {
        let mut driver = (self.new_driver)();
        driver.open(&self.listing_url)?;
        driver.wait_for(LISTING_SELECTOR, self.wait_timeout)?;
        extract_channel_links(&driver.content()?, &self.listing_url)
    }

    fn read_channel(&self, driver: &mut D, link: &ChannelLink, channel_id: &str) -> Result<ChannelPage> {
        driver.open(&link.url)?;
        driver.wait_for(ROW_SELECTOR, self.wait_timeout)?;
        extract_programmes(&driver.content()?, channel_id, self.assumed_duration)
    }

    /// Threads actually spawned for `channels` pages
    fn worker_count(&self, channels: usize) -> usize {
        self.workers.min(channels).max(1)
    }

    /// Visit every channel page with at most `workers` threads.
    ///
    /// The returned vector is in the same order as `links`.
    fn read_channels(&self, links: &[ChannelLink], channels: &[Channel]) -> Vec<Result<ChannelPage>> {
        let workers = self.worker_count(links.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || {
                    let mut driver = (self.new_driver)();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= links.len() {
                            break;
                        }
                        let result = self.read_channel(&mut driver, &links[i], &channels[i].id);
                        if tx.send((i, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut results: Vec<(usize, Result<ChannelPage>)> = rx.into_iter().collect();
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}

impl ScrapeSource<Box<dyn Fn() -> HttpPageDriver + Sync>> {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = HttpClient::from_config(config);
        let poll_interval = config.poll_interval();
        let new_driver: Box<dyn Fn() -> HttpPageDriver + Sync> =
            Box::new(move || HttpPageDriver::new(client.clone(), poll_interval));

        Self::new(
            &config.scrape_listing_url,
            config.scrape_workers,
            config.wait_timeout(),
            config.assumed_duration(),
            new_driver,
        )
    }
}

impl<F, D> EpgSource for ScrapeSource<F>
where
    F: Fn() -> D + Sync,
    D: PageDriver,
{
    fn name(&self) -> &str {
        "scrape"
    }

    fn fetch(&self) -> Result<SourceListing> {
        info!("Reading channel listing: {}", self.listing_url);
        let links = self.read_listing()?;
        let channels = assign_channel_ids(&links);
        info!(
            "Found {} channels, scraping with {} workers",
            channels.len(),
            self.worker_count(links.len())
        );

        let pages = self.read_channels(&links, &channels);

        let mut listing = SourceListing::default();
        for ((link, channel), page) in links.iter().zip(channels).zip(pages) {
            match page {
                Ok(page) => {
                    info!("{}: {} programmes", link.name, page.programmes.len());
                    listing.programmes.extend(page.programmes);
                    listing.skipped += page.skipped;
                }
                Err(e) => {
                    warn!("{}: channel page failed, continuing: {}", link.name, e);
                    listing.failed_channels.push(link.name.clone());
                }
            }
            listing.channels.push(SourceChannel::new(channel));
        }
        Ok(listing)
    }
}

/// Pull `{name, url}` entries from the listing page, resolving relative links
pub fn extract_channel_links(html: &str, base_url: &str) -> Result<Vec<ChannelLink>> {
    let base = Url::parse(base_url).map_err(|e| EpgError::navigation(base_url, e))?;
    let anchors = selector(LISTING_SELECTOR)?;
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    for a in document.select(&anchors) {
        let name = a.value().attr("title").map(normalize_ws).unwrap_or_default();
        let href = a.value().attr("href").unwrap_or_default().trim();
        if name.is_empty() || href.is_empty() {
            continue;
        }
        match base.join(href) {
            Ok(url) => links.push(ChannelLink {
                name,
                url: url.to_string(),
            }),
            Err(e) => debug!("Skipping channel '{}' with bad link '{}': {}", name, href, e),
        }
    }
    Ok(links)
}

/// Channel id from a display name: all whitespace removed
pub fn derive_channel_id(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Build channels in listing order.
///
/// Names that collapse to an id already taken get `-2`, `-3`, ... appended.
fn assign_channel_ids(links: &[ChannelLink]) -> Vec<Channel> {
    let mut taken: HashSet<String> = HashSet::with_capacity(links.len());
    links
        .iter()
        .map(|link| {
            let base = derive_channel_id(&link.name);
            let mut id = base.clone();
            let mut n = 2;
            while taken.contains(&id) {
                id = format!("{}-{}", base, n);
                n += 1;
            }
            if id != base {
                warn!("Channel id '{}' already used, '{}' becomes '{}'", base, link.name, id);
            }
            taken.insert(id.clone());
            Channel {
                id,
                display_name: link.name.clone(),
                icon: None,
            }
        })
        .collect()
}

/// Read programme rows from a channel page.
///
/// Rows without a readable start time or a title are skipped. The page has no
/// stop times, so `stop = start + assumed_duration`.
fn extract_programmes(html: &str, channel_id: &str, assumed_duration: chrono::Duration) -> Result<ChannelPage> {
    let rows = selector(ROW_SELECTOR)?;
    let start_sel = selector(START_SELECTOR)?;
    let title_sel = selector(TITLE_SELECTOR)?;
    let desc_sel = selector(DESC_SELECTOR)?;
    let document = Html::parse_document(html);

    let mut page = ChannelPage::default();
    for row in document.select(&rows) {
        let start: Option<DateTime<FixedOffset>> = row
            .select(&start_sel)
            .next()
            .and_then(|h5| h5.value().attr("content"))
            .and_then(parse_iso_time);
        let title = first_text(row, &title_sel);

        let (Some(start), Some(title)) = (start, title) else {
            debug!("{}: skipping row without start time or title", channel_id);
            page.skipped += 1;
            continue;
        };

        page.programmes.push(Programme {
            channel_id: channel_id.to_string(),
            start,
            stop: start + assumed_duration,
            title,
            description: first_text(row, &desc_sel),
            category: None,
        });
    }
    Ok(page)
}

fn first_text(row: ElementRef<'_>, sel: &scraper::Selector) -> Option<String> {
    let text = normalize_ws(&row.select(sel).next()?.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Collapse whitespace runs into single spaces and trim
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
