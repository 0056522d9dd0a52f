//! Projection of the live catalog into playable stations and an XMLTV guide.
//!
//! Both operations read the catalog through [`FeedStore`], so whichever
//! runs second is served from the cached snapshot.

mod guide;
mod station;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::feed::{get_json, FeedError, FeedSnapshot, FeedStore, FetchError};
use crate::output::XmltvDocument;

use guide::EpgResponse;

pub use station::{IncompleteRecord, Station};

/// Default EPG query endpoint.
pub const EPG_URL: &str = "https://tv.jsrdn.com/epg/query.php";

const EPG_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Projector {
    store: Arc<FeedStore>,
    client: reqwest::Client,
    epg_url: String,
}

impl Projector {
    pub fn new(store: Arc<FeedStore>, client: reqwest::Client, epg_url: impl Into<String>) -> Self {
        Self {
            store,
            client,
            epg_url: epg_url.into(),
        }
    }

    /// Lists every fully valid, playable station in catalog order.
    ///
    /// Shows with missing fields are skipped and logged.
    ///
    /// # Errors
    ///
    /// [`FeedError`] when the catalog cannot be loaded; no partial list is returned.
    pub async fn list_channels(&self) -> Result<Vec<Station>, FeedError> {
        let snapshot = self.store.snapshot().await?;
        Ok(stations(&snapshot))
    }

    /// Builds the XMLTV guide for every show that has EPG data.
    ///
    /// The EPG query is best-effort: if it fails, an empty document is
    /// returned. When no show has an EPG id the query is not issued at all.
    ///
    /// # Errors
    ///
    /// [`FeedError`] when the catalog itself cannot be loaded.
    pub async fn build_epg(&self) -> Result<XmltvDocument, FeedError> {
        let snapshot = self.store.snapshot().await?;

        let (channels, lookups) = guide::guide_channels(&snapshot);
        if lookups.is_empty() {
            tracing::info!("No shows carry EPG ids, guide is empty");
            return Ok(XmltvDocument::default());
        }

        let ids: Vec<&str> = lookups.iter().map(|(id, _)| id.as_str()).collect();
        let response = match self.query_epg(&ids).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %self.epg_url, error = %e, "EPG query failed, guide is empty");
                return Ok(XmltvDocument::default());
            }
        };

        let programmes = guide::programmes(&response, &lookups);
        tracing::info!(
            channels = channels.len(),
            programmes = programmes.len(),
            "Built programme guide"
        );

        Ok(XmltvDocument {
            channels,
            programmes,
        })
    }

    async fn query_epg(&self, ids: &[&str]) -> Result<EpgResponse, FetchError> {
        let url = epg_query_url(&self.epg_url, ids)?;
        tracing::info!(ids = ids.len(), "Querying EPG");
        get_json(&self.client, url.as_str(), EPG_TIMEOUT).await
    }
}

/// Projects every usable show of a snapshot into a [`Station`].
pub fn stations(snapshot: &FeedSnapshot) -> Vec<Station> {
    snapshot
        .shows
        .iter()
        .filter_map(|(key, show)| match Station::from_show(show) {
            Ok(station) => Some(station),
            Err(reason) => {
                tracing::warn!(
                    show = %key,
                    title = show.title.as_deref().unwrap_or("unknown"),
                    reason = %reason,
                    "Skipping incomplete channel"
                );
                None
            }
        })
        .collect()
}

/// `<endpoint>?id=a,b,c`, commas left unescaped.
fn epg_query_url(endpoint: &str, ids: &[&str]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    url.set_query(Some(&format!("id={}", ids.join(","))));
    Ok(url)
}
