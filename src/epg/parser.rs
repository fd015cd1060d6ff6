//! XMLTV reader
//! Streaming quick-xml parser for XMLTV documents.
//! Supports both plain XML and gzip-compressed (.xml.gz) bodies

use std::io::{BufRead, Read};

use chrono::{DateTime, FixedOffset};
use flate2::read::GzDecoder;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::time::parse_xmltv_time;
use crate::error::{EpgError, Result};
use crate::models::{Channel, Programme, SourceChannel, SourceListing};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    Root,
    Channel,
    Programme,
    Title,
    Desc,
    Category,
    DisplayName,
}

/// Programme under construction; fields are checked when the element closes
#[derive(Debug, Default)]
struct PendingProgramme {
    channel_id: String,
    start: Option<DateTime<FixedOffset>>,
    stop: Option<DateTime<FixedOffset>>,
    title: String,
    description: Option<String>,
    category: Option<String>,
}

impl PendingProgramme {
    fn from_element(e: &BytesStart) -> Self {
        Self {
            channel_id: get_attribute(e, b"channel").unwrap_or_default(),
            start: get_attribute(e, b"start").and_then(|s| parse_xmltv_time(&s)),
            stop: get_attribute(e, b"stop").and_then(|s| parse_xmltv_time(&s)),
            ..Self::default()
        }
    }

    fn finish(self) -> Option<Programme> {
        if self.channel_id.is_empty() || self.title.is_empty() {
            return None;
        }
        Some(Programme {
            channel_id: self.channel_id,
            start: self.start?,
            stop: self.stop?,
            title: self.title,
            description: self.description,
            category: self.category,
        })
    }
}

/// Parser for XMLTV format
pub struct EpgParser;

impl EpgParser {
    /// Parse XMLTV from a string
    pub fn parse(xml: &str) -> Result<SourceListing> {
        Self::parse_reader(xml.as_bytes())
    }

    /// Parse a downloaded body, gunzipping it first when it carries the gzip magic
    pub fn parse_bytes(body: &[u8]) -> Result<SourceListing> {
        if body.starts_with(&GZIP_MAGIC) {
            let xml = gunzip(body)?;
            Self::parse_reader(xml.as_slice())
        } else {
            Self::parse_reader(body)
        }
    }

    /// Parse XMLTV from a reader.
    ///
    /// Malformed XML aborts with [`EpgError::Parse`]. Well-formed records that
    /// cannot be used (no channel id, bad timestamps, no title) are dropped
    /// and counted in [`SourceListing::skipped`].
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<SourceListing> {
        let mut xml_reader = Reader::from_reader(reader);
        // Text is trimmed per element instead; trimming per event would eat the
        // spaces around entity references.
        xml_reader.config_mut().trim_text(false);

        let mut listing = SourceListing::default();
        let mut buf = Vec::with_capacity(8192);

        let mut state = ParserState::Root;
        let mut seen_root = false;
        let mut current_channel: Option<SourceChannel> = None;
        let mut current_program: Option<PendingProgramme> = None;
        let mut text_buf = String::new();

        loop {
            let position = xml_reader.buffer_position();
            let event = xml_reader
                .read_event_into(&mut buf)
                .map_err(|e| EpgError::Parse(format!("XML error at byte {}: {}", position, e)));

            match event? {
                Event::Start(ref e) => {
                    match e.name().as_ref() {
                        b"tv" => seen_root = true,
                        b"channel" if state == ParserState::Root => {
                            state = ParserState::Channel;
                            current_channel = Some(channel_from_element(e));
                        }
                        b"programme" if state == ParserState::Root => {
                            state = ParserState::Programme;
                            current_program = Some(PendingProgramme::from_element(e));
                        }
                        b"title" if state == ParserState::Programme => {
                            state = ParserState::Title;
                            text_buf.clear();
                        }
                        b"desc" if state == ParserState::Programme => {
                            state = ParserState::Desc;
                            text_buf.clear();
                        }
                        b"category" if state == ParserState::Programme => {
                            state = ParserState::Category;
                            text_buf.clear();
                        }
                        b"display-name" if state == ParserState::Channel => {
                            state = ParserState::DisplayName;
                            text_buf.clear();
                        }
                        b"icon" => set_channel_icon(state, &mut current_channel, e),
                        _ => {}
                    }
                }
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"tv" => seen_root = true,
                    b"channel" if state == ParserState::Root => {
                        push_channel(&mut listing, channel_from_element(e));
                    }
                    b"programme" if state == ParserState::Root => {
                        push_programme(&mut listing, PendingProgramme::from_element(e));
                    }
                    b"icon" => set_channel_icon(state, &mut current_channel, e),
                    _ => {}
                },
                Event::Text(ref e) => {
                    if is_text_state(state) {
                        text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Event::CData(ref e) => {
                    if is_text_state(state) {
                        text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Event::GeneralRef(ref e) => {
                    if is_text_state(state) {
                        let name = String::from_utf8_lossy(e.as_ref());
                        text_buf.push_str(&resolve_entity(&name));
                    }
                }
                Event::End(ref e) => {
                    match e.name().as_ref() {
                        b"channel" if state == ParserState::Channel => {
                            if let Some(channel) = current_channel.take() {
                                push_channel(&mut listing, channel);
                            }
                            state = ParserState::Root;
                        }
                        b"programme" if state == ParserState::Programme => {
                            if let Some(program) = current_program.take() {
                                push_programme(&mut listing, program);
                            }
                            state = ParserState::Root;
                        }
                        b"title" if state == ParserState::Title => {
                            if let Some(ref mut prog) = current_program {
                                prog.title = text_buf.trim().to_string();
                            }
                            state = ParserState::Programme;
                        }
                        b"desc" if state == ParserState::Desc => {
                            if let Some(ref mut prog) = current_program {
                                prog.description = non_empty(&text_buf);
                            }
                            state = ParserState::Programme;
                        }
                        b"category" if state == ParserState::Category => {
                            if let Some(ref mut prog) = current_program {
                                if prog.category.is_none() {
                                    prog.category = non_empty(&text_buf);
                                }
                            }
                            state = ParserState::Programme;
                        }
                        b"display-name" if state == ParserState::DisplayName => {
                            if let Some(ref mut chan) = current_channel {
                                if chan.channel.display_name.is_empty() {
                                    chan.channel.display_name = text_buf.trim().to_string();
                                }
                            }
                            state = ParserState::Channel;
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(EpgError::Parse("missing <tv> root element".to_string()));
        }
        if current_channel.is_some() || current_program.is_some() {
            return Err(EpgError::Parse("document ends inside an element".to_string()));
        }

        Ok(listing)
    }
}

fn gunzip(body: &[u8]) -> Result<Vec<u8>> {
    let mut xml = Vec::with_capacity(body.len() * 8);
    GzDecoder::new(body)
        .read_to_end(&mut xml)
        .map_err(|e| EpgError::Decompression(e.to_string()))?;
    Ok(xml)
}

fn is_text_state(state: ParserState) -> bool {
    matches!(
        state,
        ParserState::Title | ParserState::Desc | ParserState::Category | ParserState::DisplayName
    )
}

fn channel_from_element(e: &BytesStart) -> SourceChannel {
    SourceChannel {
        channel: Channel {
            id: get_attribute(e, b"id").unwrap_or_default(),
            display_name: String::new(),
            icon: None,
        },
        lang: get_attribute(e, b"lang"),
        country: get_attribute(e, b"country"),
    }
}

fn set_channel_icon(state: ParserState, channel: &mut Option<SourceChannel>, e: &BytesStart) {
    if state != ParserState::Channel {
        return;
    }
    if let (Some(chan), Some(src)) = (channel.as_mut(), get_attribute(e, b"src")) {
        if !src.is_empty() {
            chan.channel.icon = Some(src);
        }
    }
}

fn push_channel(listing: &mut SourceListing, mut chan: SourceChannel) {
    if chan.channel.id.is_empty() {
        debug!("Skipping channel without id");
        listing.skipped += 1;
        return;
    }
    if chan.channel.display_name.is_empty() {
        chan.channel.display_name = chan.channel.id.clone();
    }
    listing.channels.push(chan);
}

fn push_programme(listing: &mut SourceListing, pending: PendingProgramme) {
    let channel_id = pending.channel_id.clone();
    match pending.finish() {
        Some(programme) => listing.programmes.push(programme),
        None => {
            debug!("Skipping unreadable programme on channel '{}'", channel_id);
            listing.skipped += 1;
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Resolve the name of an `&name;` reference
fn resolve_entity(name: &str) -> String {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(decode_char_ref),
    };
    match resolved {
        Some(c) => c.to_string(),
        None => format!("&{};", name),
    }
}

/// "x41" or "65" -> 'A'
fn decode_char_ref(num: &str) -> Option<char> {
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

/// Decode XML entities in an attribute value
fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(end) if end <= 10 => {
                result.push_str(&resolve_entity(&after[..end]));
                rest = &after[end + 1..];
            }
            _ => {
                result.push('&');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

/// Get attribute value from XML element
fn get_attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let raw = String::from_utf8(attr.value.as_ref().to_vec()).ok()?;
            return Some(decode_xml_entities(&raw));
        }
    }
    None
}
