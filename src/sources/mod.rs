//! Source adapters: each one turns an external EPG source into a [`SourceListing`]

mod api;
mod browser;
mod feed;
mod scrape;

pub use api::ApiSource;
pub use browser::{HttpPageDriver, PageDriver};
pub use feed::FeedSource;
pub use scrape::{ChannelLink, ScrapeSource};

use crate::epg::ChannelFilter;
use crate::error::Result;
use crate::models::SourceListing;

/// One EPG source feeding the pipeline
pub trait EpgSource {
    /// Short label for logs and the run summary
    fn name(&self) -> &str;

    /// Fetch everything the source offers for this run
    fn fetch(&self) -> Result<SourceListing>;

    /// Channels to keep; everything by default
    fn filter(&self) -> ChannelFilter {
        ChannelFilter::all()
    }
}
