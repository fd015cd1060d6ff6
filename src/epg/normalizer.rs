//! Turns a raw source listing into an [`EpgDocument`]
//!
//! Pure functions only. Source order is kept for channels and programmes.

use std::collections::HashSet;

use log::warn;

use crate::error::{EpgError, Result};
use crate::models::{EpgDocument, SourceChannel, SourceListing};

/// Which channels survive normalization.
///
/// Criteria are OR-ed. A filter with no criteria keeps every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    /// Keep channels whose `lang` or `country` equals this code (ASCII case-insensitive)
    pub locale: Option<String>,
    /// Keep channels whose id ends with this suffix, e.g. ".tr"
    pub id_suffix: Option<String>,
}

impl ChannelFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn locale(code: impl Into<String>) -> Self {
        Self {
            locale: Some(code.into()),
            id_suffix: None,
        }
    }

    pub fn matches(&self, chan: &SourceChannel) -> bool {
        if self.locale.is_none() && self.id_suffix.is_none() {
            return true;
        }

        let locale_match = self.locale.as_deref().is_some_and(|code| {
            [&chan.lang, &chan.country]
                .into_iter()
                .flatten()
                .any(|v| v.eq_ignore_ascii_case(code))
        });
        let suffix_match = self
            .id_suffix
            .as_deref()
            .is_some_and(|sfx| chan.channel.id.ends_with(sfx));

        locale_match || suffix_match
    }
}

/// What normalization removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub source_channels: usize,
    pub duplicate_channels: usize,
    pub orphan_programmes: usize,
    pub invalid_ranges: usize,
}

/// Filter channels, then drop orphan programmes and programmes with `start >= stop`.
///
/// An empty channel id is a [`EpgError::Schema`] error. Duplicate ids keep
/// the first occurrence.
pub fn normalize(listing: SourceListing, filter: &ChannelFilter) -> Result<(EpgDocument, NormalizeStats)> {
    let mut stats = NormalizeStats {
        source_channels: listing.channels.len(),
        ..NormalizeStats::default()
    };

    let mut seen: HashSet<String> = HashSet::with_capacity(listing.channels.len());
    let mut kept: HashSet<String> = HashSet::new();
    let mut doc = EpgDocument::default();

    for chan in listing.channels {
        if chan.channel.id.is_empty() {
            return Err(EpgError::Schema(format!(
                "channel '{}' has an empty id",
                chan.channel.display_name
            )));
        }
        if !seen.insert(chan.channel.id.clone()) {
            warn!("Duplicate channel id '{}', keeping the first one", chan.channel.id);
            stats.duplicate_channels += 1;
            continue;
        }
        if filter.matches(&chan) {
            kept.insert(chan.channel.id.clone());
            doc.channels.push(chan.channel);
        }
    }

    for prog in listing.programmes {
        if !kept.contains(&prog.channel_id) {
            stats.orphan_programmes += 1;
        } else if prog.start >= prog.stop {
            stats.invalid_ranges += 1;
        } else {
            doc.programmes.push(prog);
        }
    }

    Ok((doc, stats))
}
