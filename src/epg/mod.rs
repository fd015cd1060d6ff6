//! EPG (Electronic Program Guide) module
//!
//! XMLTV reading and writing, timestamp handling and normalization.

mod normalizer;
mod parser;
pub mod time;
mod writer;

#[cfg(test)]
mod xmltv_tests;

// Re-export public types
pub use normalizer::{normalize, ChannelFilter, NormalizeStats};
pub use parser::EpgParser;
pub use time::{format_xmltv_time, parse_xmltv_time};
pub use writer::to_xmltv;
