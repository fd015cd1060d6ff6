//! Data models for EPG listings

use chrono::{DateTime, FixedOffset};

/// Channel as written to XMLTV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Stable identifier, the join key for programmes
    pub id: String,
    pub display_name: String,
    /// Channel logo URL (optional)
    pub icon: Option<String>,
}

/// Channel as read from a source, with the attributes locale filtering looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChannel {
    pub channel: Channel,
    pub lang: Option<String>,
    pub country: Option<String>,
}

impl SourceChannel {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            lang: None,
            country: None,
        }
    }
}

/// A single TV programme
#[derive(Debug, Clone, PartialEq)]
pub struct Programme {
    /// Channel ID this programme belongs to
    pub channel_id: String,
    pub start: DateTime<FixedOffset>,
    pub stop: DateTime<FixedOffset>,
    pub title: String,
    /// Programme description (optional)
    pub description: Option<String>,
    /// Category/genre (optional)
    pub category: Option<String>,
}

/// Everything one source adapter produced, before filtering
#[derive(Debug, Clone, Default)]
pub struct SourceListing {
    pub channels: Vec<SourceChannel>,
    pub programmes: Vec<Programme>,
    /// Records the adapter could not read and dropped
    pub skipped: usize,
    /// Channels whose programme page could not be loaded
    pub failed_channels: Vec<String>,
}

/// Normalized document ready for serialization.
///
/// Every programme references a channel in `channels`, and every programme
/// has `start < stop`. Both lists keep source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpgDocument {
    pub channels: Vec<Channel>,
    pub programmes: Vec<Programme>,
}
