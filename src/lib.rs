//! Converts the DistroTV live catalog into an M3U playlist and an XMLTV guide.
//!
//! - [`feed`] - Catalog fetching and the single cached snapshot
//! - [`projector`] - Stations and programme guide derived from the snapshot
//! - [`output`] - M3U and XMLTV rendering
//! - [`config`] - Optional TOML configuration
//! - [`util`] - Atomic file writes

pub mod config;
pub mod feed;
pub mod output;
pub mod projector;
pub mod util;
