use chrono::{DateTime, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

const SOURCE_INFO_NAME: &str = "distrotv";
const GENERATOR_INFO_NAME: &str = "vlc-bridge";

/// XMLTV time format. Upstream times are taken as UTC.
const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

#[derive(Debug, Error)]
pub enum XmltvError {
    #[error("Failed to write XMLTV: {0}")]
    Write(#[from] std::io::Error),
    #[error("Generated XMLTV contains invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A guide `<channel>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideChannel {
    pub id: String,
    pub display_name: String,
}

/// One scheduled programme for a guide channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSlot {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub icon_url: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Formats a time as XMLTV's `YYYYMMDDHHMMSS +0000`.
pub fn format_xmltv_time(time: &DateTime<Utc>) -> String {
    time.format(XMLTV_TIME_FORMAT).to_string()
}

/// An XMLTV guide document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmltvDocument {
    pub channels: Vec<GuideChannel>,
    pub programmes: Vec<ProgramSlot>,
}

impl XmltvDocument {
    /// True when there is nothing worth writing.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.programmes.is_empty()
    }

    /// Serializes the document: indented, UTF-8, no XML declaration.
    ///
    /// An empty document yields an empty string.
    pub fn to_xml(&self) -> Result<String, XmltvError> {
        if self.is_empty() {
            return Ok(String::new());
        }

        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        let mut tv = BytesStart::new("tv");
        tv.push_attribute(("source-info-name", SOURCE_INFO_NAME));
        tv.push_attribute(("generator-info-name", GENERATOR_INFO_NAME));
        writer.write_event(Event::Start(tv))?;

        for channel in &self.channels {
            let mut start = BytesStart::new("channel");
            start.push_attribute(("id", channel.id.as_str()));
            writer.write_event(Event::Start(start))?;
            write_text_element(&mut writer, "display-name", &channel.display_name)?;
            writer.write_event(Event::End(BytesEnd::new("channel")))?;
        }

        for programme in &self.programmes {
            let start_time = format_xmltv_time(&programme.start);
            let stop_time = format_xmltv_time(&programme.end);

            let mut start = BytesStart::new("programme");
            start.push_attribute(("start", start_time.as_str()));
            start.push_attribute(("stop", stop_time.as_str()));
            start.push_attribute(("channel", programme.channel_id.as_str()));
            writer.write_event(Event::Start(start))?;

            write_text_element(&mut writer, "title", &programme.title)?;
            if !programme.description.is_empty() {
                write_text_element(&mut writer, "desc", &programme.description)?;
            }
            if !programme.icon_url.is_empty() {
                let mut icon = BytesStart::new("icon");
                icon.push_attribute(("src", programme.icon_url.as_str()));
                writer.write_event(Event::Empty(icon))?;
            }

            writer.write_event(Event::End(BytesEnd::new("programme")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("tv")))?;

        let mut xml = String::from_utf8(writer.into_inner().into_inner())?;
        xml.push('\n');
        Ok(xml)
    }
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), XmltvError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
