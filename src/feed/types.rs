use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Upstream `type` value for live content.
pub const LIVE: &str = "live";

/// Raw catalog document as returned by `getfeed.php`.
///
/// `shows` is kept as an untyped JSON object so that one malformed show can
/// be dropped without failing the whole catalog.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCatalog {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub topics: Vec<Option<Topic>>,
    #[serde(default)]
    pub shows: serde_json::Map<String, serde_json::Value>,
}

/// Reads an optional field, treating a value of the wrong type as absent.
///
/// Use with `#[serde(default, deserialize_with = "lenient")]`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Reads a list element by element; unreadable elements become `None`
/// and a non-list value reads as empty.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// A catalog topic (a rail of shows in the upstream app).
///
/// Only `type` is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct Topic {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    /// Remaining upstream fields, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Topic {
    pub fn is_live(&self) -> bool {
        self.kind.as_deref() == Some(LIVE)
    }
}

/// A show record from the catalog.
///
/// Every field is optional and a field of the wrong type reads as absent.
/// Usability is decided later by [`crate::projector::Station::from_show`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Show {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub img_logo: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub keywords: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub seasons: Vec<Option<Season>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Season {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub episodes: Vec<Option<Episode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Episode {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<EpisodeId>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<EpisodeContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeContent {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

/// Episode identifier; upstream sends it as either a string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EpisodeId {
    Text(String),
    Number(serde_json::Number),
}

impl EpisodeId {
    /// Query-string form of the id, or `None` for empty strings and zero.
    pub fn as_key(&self) -> Option<String> {
        match self {
            EpisodeId::Text(s) if s.is_empty() => None,
            EpisodeId::Text(s) => Some(s.clone()),
            EpisodeId::Number(n) if n.as_f64() == Some(0.0) => None,
            EpisodeId::Number(n) => Some(n.to_string()),
        }
    }
}

impl Show {
    pub fn is_live(&self) -> bool {
        self.kind.as_deref() == Some(LIVE)
    }

    fn first_episode(&self) -> Option<&Episode> {
        self.seasons.first()?.as_ref()?.episodes.first()?.as_ref()
    }

    /// Stream URL of the first episode, if present and non-empty.
    pub fn stream_url(&self) -> Option<&str> {
        self.first_episode()?
            .content
            .as_ref()?
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
    }

    /// EPG lookup key taken from the first episode id.
    pub fn epg_id(&self) -> Option<String> {
        self.first_episode()?.id.as_ref()?.as_key()
    }
}

/// One complete capture of the live catalog.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    /// Live topics in upstream order.
    pub topics: Vec<Topic>,
    /// Live shows keyed by their upstream key, in upstream order.
    pub shows: Vec<(String, Show)>,
    pub fetched_at: DateTime<Utc>,
}

impl FeedSnapshot {
    /// Builds a snapshot from a decoded catalog, keeping live entries only.
    ///
    /// Live shows that do not deserialize as [`Show`] are dropped with a warning.
    pub(crate) fn from_catalog(catalog: RawCatalog, fetched_at: DateTime<Utc>) -> Self {
        let topics = catalog
            .topics
            .into_iter()
            .flatten()
            .filter(Topic::is_live)
            .collect();

        let shows = catalog
            .shows
            .into_iter()
            .filter(|(_, value)| value.get("type").and_then(|t| t.as_str()) == Some(LIVE))
            .filter_map(|(key, value)| match serde_json::from_value::<Show>(value) {
                Ok(show) => Some((key, show)),
                Err(e) => {
                    tracing::warn!(show = %key, error = %e, "Dropping unreadable show record");
                    None
                }
            })
            .collect();

        Self {
            topics,
            shows,
            fetched_at,
        }
    }
}
