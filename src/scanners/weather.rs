// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Bureau of Meteorology observation feed

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Fetcher, ScanJob};
use crate::error::{ParseError, ReadError, ScanError};

pub const DEFAULT_WEATHER_URL: &str = "http://www.bom.gov.au/fwo/IDV60901/IDV60901.95867.json";

const SCANNER_NAME: &str = "weather";

/// Latest observation from the feed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub air_temp: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    /// Degrees clockwise from north
    pub wind_direction: f64,
}

const COMPASS: [(&str, f64); 17] = [
    ("CALM", 0.0),
    ("N", 0.0),
    ("NNE", 22.5),
    ("NE", 45.0),
    ("ENE", 67.5),
    ("E", 90.0),
    ("ESE", 112.5),
    ("SE", 135.0),
    ("SSE", 157.5),
    ("S", 180.0),
    ("SSW", 202.5),
    ("SW", 225.0),
    ("WSW", 247.5),
    ("W", 270.0),
    ("WNW", 292.5),
    ("NW", 315.0),
    ("NNW", 337.5),
];

/// Compass point text to degrees. Unknown text maps to 0 with a warning.
pub fn compass_to_degrees(direction: &str) -> f64 {
    let direction = direction.trim();
    match COMPASS.iter().find(|(point, _)| point.eq_ignore_ascii_case(direction)) {
        Some((_, degrees)) => *degrees,
        None => {
            warn!("Unknown wind direction: {:?}", direction);
            0.0
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    observations: Observations,
}

#[derive(Debug, Deserialize)]
struct Observations {
    #[serde(default)]
    data: Vec<ObservationRow>,
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    air_temp: Option<f64>,
    wind_spd_kmh: Option<f64>,
    gust_kmh: Option<f64>,
    wind_dir: Option<String>,
}

/// Parse a feed document, taking the most recent row
pub fn parse_observation(body: &str) -> Result<WeatherObservation, ParseError> {
    let document: FeedDocument =
        serde_json::from_str(body).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let row = document.observations.data.into_iter().next().ok_or(ParseError::Empty)?;
    let air_temp = row
        .air_temp
        .ok_or_else(|| ParseError::Malformed("observation has no air_temp".to_string()))?;

    Ok(WeatherObservation {
        air_temp,
        wind_speed: row.wind_spd_kmh.unwrap_or(0.0),
        wind_gust: row.gust_kmh.unwrap_or(0.0),
        wind_direction: row.wind_dir.as_deref().map(compass_to_degrees).unwrap_or(0.0),
    })
}

pub struct WeatherJob {
    fetcher: Arc<dyn Fetcher>,
    url: String,
}

impl WeatherJob {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: &str) -> Self {
        Self {
            fetcher,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ScanJob for WeatherJob {
    type Output = WeatherObservation;

    fn name(&self) -> &str {
        SCANNER_NAME
    }

    async fn scan(&self) -> Result<WeatherObservation, ScanError> {
        let body = self
            .fetcher
            .fetch(&self.url)
            .await
            .map_err(|e| ReadError::new(SCANNER_NAME, e))?;

        parse_observation(&body).map_err(|e| ScanError::parse(SCANNER_NAME, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanners::canned::CannedFetcher;

    const FEED: &str = r#"{
        "observations": {
            "notice": [],
            "header": [{"name": "Melbourne (Olympic Park)"}],
            "data": [
                {"sort_order": 0, "air_temp": 17.4, "wind_spd_kmh": 13, "gust_kmh": 22, "wind_dir": "ssw"},
                {"sort_order": 1, "air_temp": 16.9, "wind_spd_kmh": 9, "gust_kmh": 15, "wind_dir": "S"}
            ]
        }
    }"#;

    #[test]
    fn test_compass_table() {
        assert_eq!(compass_to_degrees("N"), 0.0);
        assert_eq!(compass_to_degrees("CALM"), 0.0);
        assert_eq!(compass_to_degrees("ene"), 67.5);
        assert_eq!(compass_to_degrees("NNW"), 337.5);
        assert_eq!(compass_to_degrees("sideways"), 0.0);
    }

    #[test]
    fn test_parse_uses_first_row() {
        let obs = parse_observation(FEED).unwrap();
        assert_eq!(obs.air_temp, 17.4);
        assert_eq!(obs.wind_speed, 13.0);
        assert_eq!(obs.wind_gust, 22.0);
        assert_eq!(obs.wind_direction, 202.5);
    }

    #[test]
    fn test_parse_failures() {
        let empty = r#"{"observations": {"data": []}}"#;
        assert_eq!(parse_observation(empty), Err(ParseError::Empty));

        let no_temp = r#"{"observations": {"data": [{"air_temp": null, "wind_dir": "N"}]}}"#;
        assert!(matches!(parse_observation(no_temp), Err(ParseError::Malformed(_))));

        assert!(matches!(parse_observation("<html>"), Err(ParseError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_scan_through_fetcher() {
        let fetcher = Arc::new(CannedFetcher::new());
        fetcher.respond(DEFAULT_WEATHER_URL, FEED);

        let job = WeatherJob::new(fetcher, DEFAULT_WEATHER_URL);
        assert_eq!(job.scan().await.unwrap().air_temp, 17.4);
    }
}
