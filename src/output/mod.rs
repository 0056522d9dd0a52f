//! Rendering of the two produced formats.
//!
//! - [`m3u`] - Extended M3U playlist of playable stations
//! - [`xmltv`] - XMLTV programme guide

mod m3u;
mod xmltv;

pub use m3u::Playlist;
pub use xmltv::{format_xmltv_time, GuideChannel, ProgramSlot, XmltvDocument, XmltvError};
