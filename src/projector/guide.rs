use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::feed::FeedSnapshot;
use crate::output::{GuideChannel, ProgramSlot};

/// Timestamp format used by the EPG query endpoint.
const UPSTREAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why one EPG slot was left out of the guide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum MalformedSlot {
    #[error("missing `{0}` time")]
    MissingTime(&'static str),
    #[error("unparsable `{field}` time {value:?}")]
    BadTimestamp { field: &'static str, value: String },
    #[error("unreadable slot: {0}")]
    Unreadable(String),
}

/// Response of `epg/query.php`.
///
/// `epg` stays untyped because upstream sends `[]` instead of `{}` when it
/// has nothing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EpgResponse {
    #[serde(default)]
    epg: serde_json::Value,
}

impl EpgResponse {
    fn slots(&self, epg_id: &str) -> Option<&[serde_json::Value]> {
        self.epg
            .get(epg_id)?
            .get("slots")?
            .as_array()
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    img_thumbh: Option<String>,
}

/// Guide channels plus the `(epg id, channel id)` lookups to query for them.
///
/// Shows without a first-episode id have no guide data and are left out.
pub(crate) fn guide_channels(
    snapshot: &FeedSnapshot,
) -> (Vec<GuideChannel>, Vec<(String, String)>) {
    let mut channels = Vec::new();
    let mut lookups: Vec<(String, String)> = Vec::new();

    for (key, show) in &snapshot.shows {
        let (Some(epg_id), Some(name)) = (show.epg_id(), show.name.as_deref()) else {
            tracing::debug!(show = %key, "No EPG id, leaving show out of the guide");
            continue;
        };

        // Last show wins when two share an episode id
        match lookups.iter_mut().find(|(id, _)| *id == epg_id) {
            Some(entry) => entry.1 = name.to_string(),
            None => lookups.push((epg_id, name.to_string())),
        }

        channels.push(GuideChannel {
            id: name.to_string(),
            display_name: show.title.as_deref().unwrap_or_default().trim().to_string(),
        });
    }

    (channels, lookups)
}

/// Collects programme slots for each lookup, in lookup order.
pub(crate) fn programmes(
    response: &EpgResponse,
    lookups: &[(String, String)],
) -> Vec<ProgramSlot> {
    let mut programmes = Vec::new();

    for (epg_id, channel_id) in lookups {
        let Some(slots) = response.slots(epg_id) else {
            continue;
        };

        for raw in slots {
            match program_slot(channel_id, raw) {
                Ok(slot) => programmes.push(slot),
                Err(e) => {
                    tracing::warn!(
                        channel = %channel_id,
                        title = raw.get("title").and_then(|t| t.as_str()).unwrap_or("unknown"),
                        reason = %e,
                        "Skipping EPG slot"
                    );
                }
            }
        }
    }

    programmes
}

fn program_slot(
    channel_id: &str,
    raw: &serde_json::Value,
) -> Result<ProgramSlot, MalformedSlot> {
    let slot = RawSlot::deserialize(raw).map_err(|e| MalformedSlot::Unreadable(e.to_string()))?;

    let start = slot.start.as_deref().ok_or(MalformedSlot::MissingTime("start"))?;
    let end = slot.end.as_deref().ok_or(MalformedSlot::MissingTime("end"))?;

    Ok(ProgramSlot {
        channel_id: channel_id.to_string(),
        title: slot.title.as_deref().unwrap_or_default().trim().to_string(),
        description: slot.description.as_deref().unwrap_or_default().trim().to_string(),
        icon_url: slot.img_thumbh.unwrap_or_default(),
        start: parse_upstream_time("start", start)?,
        end: parse_upstream_time("end", end)?,
    })
}

/// Parses an upstream `YYYY-MM-DD HH:MM:SS` time. The API gives no zone; it is taken as UTC.
fn parse_upstream_time(
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, MalformedSlot> {
    NaiveDateTime::parse_from_str(value, UPSTREAM_TIME_FORMAT)
        .map(|time| time.and_utc())
        .map_err(|_| MalformedSlot::BadTimestamp {
            field,
            value: value.to_string(),
        })
}
