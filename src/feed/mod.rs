//! Live catalog acquisition and caching.
//!
//! - [`types`] - Upstream catalog records (`Show`, `Topic`) and [`FeedSnapshot`]
//! - [`client`] - Single-attempt JSON fetching with timeout and size limits
//! - [`store`] - [`FeedStore`], the one cached snapshot with its 12h freshness window
//!
//! # Example
//!
//! ```ignore
//! use distrotv_bridge::feed::{build_client, FeedStore, FEED_URL};
//!
//! let store = FeedStore::new(build_client()?, FEED_URL);
//! let snapshot = store.snapshot().await?;
//! println!("{} live shows", snapshot.shows.len());
//! ```

mod client;
mod store;
mod types;

pub use client::{build_client, get_json, FetchError, USER_AGENT};
pub use store::{Clock, FeedError, FeedStore, SystemClock, FEED_URL, FRESHNESS_WINDOW};
pub use types::{Episode, EpisodeContent, EpisodeId, FeedSnapshot, Season, Show, Topic, LIVE};
