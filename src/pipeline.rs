//! Fetch -> normalize -> serialize -> write, once per run

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::info;

use crate::epg::{normalize, to_xmltv};
use crate::error::Result;
use crate::output::write_atomic;
use crate::sources::EpgSource;

/// What one run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub source: String,
    pub output: PathBuf,
    pub source_channels: usize,
    pub channels: usize,
    pub programmes: usize,
    /// Records the source adapter could not read
    pub skipped: usize,
    pub orphan_programmes: usize,
    pub invalid_ranges: usize,
    pub duplicate_channels: usize,
    pub failed_channels: Vec<String>,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} written ({} source)", self.output.display(), self.source)?;
        writeln!(f, "  channels:   {}/{}", self.channels, self.source_channels)?;
        writeln!(f, "  programmes: {}", self.programmes)?;
        writeln!(
            f,
            "  dropped:    {} unreadable, {} orphan, {} bad time range, {} duplicate channel",
            self.skipped, self.orphan_programmes, self.invalid_ranges, self.duplicate_channels
        )?;
        if !self.failed_channels.is_empty() {
            writeln!(f, "  failed:     {}", self.failed_channels.join(", "))?;
        }
        write!(f, "  took {:.2}s", self.elapsed.as_secs_f64())
    }
}

/// Run one source through the whole pipeline and write `output`.
///
/// Any error aborts before the writer runs, so a failed run leaves the
/// previous output file untouched.
pub fn run(source: &dyn EpgSource, output: &Path) -> Result<RunSummary> {
    let started = Instant::now();

    info!("Fetching from {} source", source.name());
    let listing = source.fetch()?;
    let skipped = listing.skipped;
    let failed_channels = listing.failed_channels.clone();

    let (doc, stats) = normalize(listing, &source.filter())?;
    info!(
        "Kept {}/{} channels and {} programmes",
        doc.channels.len(),
        stats.source_channels,
        doc.programmes.len()
    );

    let xml = to_xmltv(&doc)?;
    write_atomic(output, xml.as_bytes())?;
    info!("{} written ({} bytes)", output.display(), xml.len());

    Ok(RunSummary {
        source: source.name().to_string(),
        output: output.to_path_buf(),
        source_channels: stats.source_channels,
        channels: doc.channels.len(),
        programmes: doc.programmes.len(),
        skipped,
        orphan_programmes: stats.orphan_programmes,
        invalid_ranges: stats.invalid_ranges,
        duplicate_channels: stats.duplicate_channels,
        failed_channels,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epg::{parse_xmltv_time, ChannelFilter, EpgParser};
    use crate::error::EpgError;
    use crate::models::{Channel, Programme, SourceChannel, SourceListing};
    use std::fs;

    struct FixedSource {
        listing: Option<SourceListing>,
        filter: ChannelFilter,
    }

    impl EpgSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self) -> Result<SourceListing> {
            self.listing
                .clone()
                .ok_or_else(|| EpgError::fetch("http://example.com/feed.xml.gz", "HTTP error: 503"))
        }

        fn filter(&self) -> ChannelFilter {
            self.filter.clone()
        }
    }

    fn channel(id: &str, lang: &str) -> SourceChannel {
        SourceChannel {
            channel: Channel {
                id: id.into(),
                display_name: id.to_uppercase(),
                icon: None,
            },
            lang: Some(lang.into()),
            country: None,
        }
    }

    fn programme(channel: &str, start: &str, stop: &str) -> Programme {
        Programme {
            channel_id: channel.into(),
            start: parse_xmltv_time(start).unwrap(),
            stop: parse_xmltv_time(stop).unwrap(),
            title: "Show".into(),
            description: None,
            category: None,
        }
    }

    fn listing() -> SourceListing {
        SourceListing {
            channels: vec![channel("trt1", "tr"), channel("bbc1", "en")],
            programmes: vec![
                programme("trt1", "20240101100000 +0300", "20240101110000 +0300"),
                programme("bbc1", "20240101100000 +0000", "20240101110000 +0000"),
                programme("trt1", "20240101120000 +0300", "20240101113000 +0300"),
            ],
            skipped: 2,
            failed_channels: vec![],
        }
    }

    #[test]
    fn test_run_writes_filtered_document() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tr-epg.xml");
        let source = FixedSource {
            listing: Some(listing()),
            filter: ChannelFilter::locale("tr"),
        };

        let summary = run(&source, &output).unwrap();
        assert_eq!(summary.source_channels, 2);
        assert_eq!(summary.channels, 1);
        assert_eq!(summary.programmes, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.orphan_programmes, 1);
        assert_eq!(summary.invalid_ranges, 1);

        let written = EpgParser::parse(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.channels.len(), 1);
        assert_eq!(written.channels[0].channel.id, "trt1");
        assert!(written.programmes.iter().all(|p| p.channel_id == "trt1"));

        let text = summary.to_string();
        assert!(text.contains("channels:   1/2"));
    }

    #[test]
    fn test_failed_fetch_leaves_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("epg.xml");
        fs::write(&output, "previous").unwrap();

        let source = FixedSource {
            listing: None,
            filter: ChannelFilter::all(),
        };
        assert!(matches!(run(&source, &output), Err(EpgError::Fetch { .. })));
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_unwritable_output_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("epg.xml");
        let source = FixedSource {
            listing: Some(listing()),
            filter: ChannelFilter::all(),
        };
        assert!(matches!(run(&source, &output), Err(EpgError::Io { .. })));
        assert!(!output.exists());
    }
}
