use std::fmt::Write;

use crate::projector::Station;

/// Extended M3U playlist for a list of stations.
pub struct Playlist<'a> {
    stations: &'a [Station],
    guide_url: Option<&'a str>,
}

impl<'a> Playlist<'a> {
    pub fn new(stations: &'a [Station]) -> Self {
        Self {
            stations,
            guide_url: None,
        }
    }

    /// Advertises an XMLTV guide through the header's `url-tvg` attribute.
    pub fn with_guide_url(mut self, guide_url: Option<&'a str>) -> Self {
        self.guide_url = guide_url.filter(|url| !url.is_empty());
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = match self.guide_url {
            Some(url) => writeln!(out, "#EXTM3U url-tvg=\"{}\"", url),
            None => writeln!(out, "#EXTM3U"),
        };

        for station in self.stations {
            let _ = writeln!(
                out,
                "#EXTINF:-1 channel-id=\"{id}\" tvg-id=\"{id}\" tvg-logo=\"{logo}\" tvg-description=\"{description}\" group-title=\"{group}\",{name}",
                id = station.id,
                logo = station.logo,
                description = station.description,
                group = station.group_title(),
                name = station.name,
            );
            let _ = writeln!(out, "{}", station.url);
        }

        out
    }
}
