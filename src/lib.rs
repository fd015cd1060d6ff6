//! epg_grab: EPG listings from XMLTV feeds, JSON APIs and web pages, written as XMLTV
//!
//! Every binary runs the same pipeline: a source adapter builds a
//! [`models::SourceListing`], [`epg::normalize`] turns it into an
//! [`models::EpgDocument`], [`epg::to_xmltv`] serializes it and
//! [`output::write_atomic`] puts it on disk.

pub mod cli;
pub mod config;
pub mod epg;
pub mod error;
pub mod logging;
pub mod models;
pub mod net;
pub mod output;
pub mod pipeline;
pub mod sources;

pub use error::{EpgError, Result};
