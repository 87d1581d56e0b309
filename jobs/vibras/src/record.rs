use geo::Polygon;
use serde::Deserialize;
use std::io::BufRead;
use tracing::debug;

/// One line of the raw feed. Models the slice of the record the jobs care
/// about; unknown fields are ignored at parse time.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub place: Option<Place>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub country_code: Option<String>,
    /// Part of the feed's place object; no current job reads it.
    #[serde(default)]
    #[allow(dead_code)]
    pub place_type: Option<String>,
    #[serde(default)]
    pub bounding_box: Option<geojson::Geometry>,
}

impl Tweet {
    /// Record filter for the sentiment jobs: a Spanish place, text present,
    /// and a bounding box that converts to a polygon. Any miss drops the
    /// record silently. Empty text passes the filter and scores zero, so
    /// its region still shows up in the totals.
    pub fn geo_text(&self) -> Option<(Polygon<f64>, &str)> {
        let place = self.place.as_ref()?;
        if place.country_code.as_deref() != Some("ES") {
            return None;
        }
        let text = self.text.as_deref()?;
        let bounding_box = place.bounding_polygon()?;
        Some((bounding_box, text))
    }

    /// Record filter for the trending job: Spanish place and language plus
    /// text present.
    pub fn trending_text(&self) -> Option<&str> {
        let place = self.place.as_ref()?;
        if place.country_code.as_deref() != Some("ES") {
            return None;
        }
        if self.lang.as_deref() != Some("es") {
            return None;
        }
        self.text.as_deref()
    }
}

impl Place {
    /// The bounding box as a closed polygon. Feed boxes arrive as open
    /// rings; the conversion closes them. A missing or non-polygonal box
    /// yields `None`, a skippable condition rather than an error.
    fn bounding_polygon(&self) -> Option<Polygon<f64>> {
        let geometry = self.bounding_box.as_ref()?;
        geometry.value.clone().try_into().ok()
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub struct ParseStats {
    pub lines: u64,
    pub malformed: u64,
}

/// Reads newline-delimited JSON records. A line that fails to parse is
/// counted and skipped, never fatal: one bad record must not sink a batch.
pub fn parse_records(reader: impl BufRead, stats: &mut ParseStats) -> anyhow::Result<Vec<Tweet>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        stats.lines += 1;
        match serde_json::from_str::<Tweet>(&line) {
            Ok(tweet) => records.push(tweet),
            Err(error) => {
                stats.malformed += 1;
                debug!(%error, "skipping malformed record");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet(json: &str) -> Tweet {
        serde_json::from_str(json).unwrap()
    }

    fn spanish_tweet() -> Tweet {
        tweet(
            "{\"text\": \"hola\", \"lang\": \"es\", \"place\": {\"country_code\": \"ES\", \
             \"place_type\": \"city\", \"bounding_box\": {\"type\": \"Polygon\", \"coordinates\": \
             [[[-3.8, 40.3], [-3.6, 40.3], [-3.6, 40.5], [-3.8, 40.5]]]}}}",
        )
    }

    #[test]
    fn geo_text_extracts_box_and_text() {
        let tweet = spanish_tweet();
        let (bounding_box, text) = tweet.geo_text().expect("record should pass the filter");
        assert_eq!(text, "hola");
        // the open four-point ring comes back closed
        assert_eq!(bounding_box.exterior().0.len(), 5);
    }

    #[test]
    fn geo_text_requires_spanish_place() {
        let t = tweet(
            "{\"text\": \"hola\", \"place\": {\"country_code\": \"FR\", \"bounding_box\": \
             {\"type\": \"Polygon\", \"coordinates\": [[[0, 0], [1, 0], [1, 1], [0, 1]]]}}}",
        );
        assert!(t.geo_text().is_none());
        let t = tweet("{\"text\": \"hola\"}");
        assert!(t.geo_text().is_none());
    }

    #[test]
    fn geo_text_passes_empty_text() {
        let t = tweet(
            "{\"text\": \"\", \"place\": {\"country_code\": \"ES\", \"bounding_box\": \
             {\"type\": \"Polygon\", \"coordinates\": [[[0, 0], [1, 0], [1, 1], [0, 1]]]}}}",
        );
        let (_, text) = t.geo_text().expect("empty text is still present text");
        assert_eq!(text, "");
    }

    #[test]
    fn geo_text_requires_text_field() {
        let t = tweet(
            "{\"place\": {\"country_code\": \"ES\", \"bounding_box\": \
             {\"type\": \"Polygon\", \"coordinates\": [[[0, 0], [1, 0], [1, 1], [0, 1]]]}}}",
        );
        assert!(t.geo_text().is_none());
    }

    #[test]
    fn missing_bounding_box_drops_record() {
        let t = tweet("{\"text\": \"hola\", \"place\": {\"country_code\": \"ES\"}}");
        assert!(t.geo_text().is_none());
    }

    #[test]
    fn point_bounding_box_drops_record() {
        let t = tweet(
            "{\"text\": \"hola\", \"place\": {\"country_code\": \"ES\", \"bounding_box\": \
             {\"type\": \"Point\", \"coordinates\": [1.0, 2.0]}}}",
        );
        assert!(t.geo_text().is_none());
    }

    #[test]
    fn trending_text_requires_spanish_language() {
        let mut t = spanish_tweet();
        assert_eq!(t.trending_text(), Some("hola"));
        t.lang = Some("en".to_string());
        assert!(t.trending_text().is_none());
        t.lang = None;
        assert!(t.trending_text().is_none());
    }

    #[test]
    fn parse_counts_malformed_lines() {
        let data = "{\"text\": \"a\"}\nnot json\n{\"text\": \"b\"}\n";
        let mut stats = ParseStats::default();
        let records = parse_records(data.as_bytes(), &mut stats).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.malformed, 1);
    }
}
