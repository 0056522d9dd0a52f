use thiserror::Error;

use crate::feed::Show;

/// Group used when a show carries neither genre nor keywords.
const DEFAULT_GROUP: &str = "Others";

/// Why a show cannot become a [`Station`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncompleteRecord {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("missing stream URL")]
    MissingStreamUrl,
}

/// A playable channel, ready for playlist output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    pub guide_id: String,
    pub logo: String,
    pub genre: String,
    pub keywords: String,
    pub description: String,
    pub name: String,
    /// Stream URL without its query string.
    pub url: String,
}

impl Station {
    /// Validates a show and projects it into a station.
    ///
    /// `name`, `img_logo`, `description` and `title` must be present, and the
    /// first episode of the first season must carry a non-empty stream URL.
    pub fn from_show(show: &Show) -> Result<Self, IncompleteRecord> {
        let name = required(&show.name, "name")?;
        let logo = required(&show.img_logo, "img_logo")?;
        let description = required(&show.description, "description")?;
        let title = required(&show.title, "title")?;
        let url = show.stream_url().ok_or(IncompleteRecord::MissingStreamUrl)?;

        Ok(Self {
            id: name.to_string(),
            guide_id: name.to_string(),
            logo: logo.to_string(),
            genre: show.genre.clone().unwrap_or_default(),
            keywords: show.keywords.clone().unwrap_or_default(),
            description: description.trim().to_string(),
            name: title.trim().to_string(),
            url: strip_query(url).to_string(),
        })
    }

    /// Playlist group: first genre token, else first keyword, else `Others`.
    pub fn group_title(&self) -> &str {
        if !self.genre.is_empty() {
            first_token(&self.genre)
        } else if !self.keywords.is_empty() {
            first_token(&self.keywords)
        } else {
            DEFAULT_GROUP
        }
    }
}

fn required<'a>(
    field: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, IncompleteRecord> {
    field
        .as_deref()
        .ok_or(IncompleteRecord::MissingField(name))
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

fn first_token(list: &str) -> &str {
    list.split(',').next().unwrap_or_default().trim()
}
