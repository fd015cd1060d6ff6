//! XMLTV serializer

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::time::format_xmltv_time;
use crate::error::{EpgError, Result};
use crate::models::{Channel, EpgDocument, Programme};

const GENERATOR_NAME: &str = "epg_grab";

/// Serialize a document to an XMLTV string.
///
/// Channels come first, then programmes, both in document order. Text and
/// attribute values are escaped by the writer.
pub fn to_xmltv(doc: &EpgDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::with_capacity(64 * 1024), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("tv").with_attributes([("generator-info-name", GENERATOR_NAME)])),
    )?;

    for channel in &doc.channels {
        write_channel(&mut writer, channel)?;
    }
    for programme in &doc.programmes {
        write_programme(&mut writer, programme)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("tv")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| EpgError::Serialize(e.to_string()))
}

fn write_channel<W: Write>(writer: &mut Writer<W>, channel: &Channel) -> Result<()> {
    emit(
        writer,
        Event::Start(BytesStart::new("channel").with_attributes([("id", channel.id.as_str())])),
    )?;
    write_text_element(writer, "display-name", &channel.display_name)?;
    if let Some(icon) = &channel.icon {
        emit(
            writer,
            Event::Empty(BytesStart::new("icon").with_attributes([("src", icon.as_str())])),
        )?;
    }
    emit(writer, Event::End(BytesEnd::new("channel")))
}

fn write_programme<W: Write>(writer: &mut Writer<W>, programme: &Programme) -> Result<()> {
    let start = format_xmltv_time(&programme.start);
    let stop = format_xmltv_time(&programme.stop);
    let element = BytesStart::new("programme").with_attributes([
        ("start", start.as_str()),
        ("stop", stop.as_str()),
        ("channel", programme.channel_id.as_str()),
    ]);

    emit(writer, Event::Start(element))?;
    write_text_element(writer, "title", &programme.title)?;
    if let Some(desc) = &programme.description {
        write_text_element(writer, "desc", desc)?;
    }
    if let Some(category) = &programme.category {
        write_text_element(writer, "category", category)?;
    }
    emit(writer, Event::End(BytesEnd::new("programme")))
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| EpgError::Serialize(e.to_string()))
}
