//! Chicago community-area safety adapter.
//!
//! Crime counts come from the City of Chicago's Socrata Open Data API,
//! aggregated per community area in a single grouped query.
//! Dataset: <https://data.cityofchicago.org/resource/ijzp-q8t2>

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use geojson::FeatureCollection;
use serde::Deserialize;
use stay_score_safety_models::{CrimeStats, FallbackScore, ScoreResult};
use stay_score_scoring::Grade;

use crate::boundary::{AreaIdSource, BoundaryFields, BoundarySet};
use crate::cache::StatsCache;
use crate::{AreaProvider, SafetyError, StatsFetcher, enrich};

/// Socrata API endpoint for Chicago crime data.
const CHICAGO_API_URL: &str = "https://data.cityofchicago.org/resource/ijzp-q8t2.json";

/// Count crimes reported on or after this date.
const CRIME_SINCE: &str = "2024-01-01T00:00:00";

/// Grouped counts stay fresh for an hour; the query is cheap to re-run.
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Result for points outside every known community area.
const FALLBACK: FallbackScore = FallbackScore {
    score: 60,
    grade: Grade::C,
};

/// Community-area boundary files name their properties inconsistently
/// across dataset vintages; try the known variants in order.
const FIELDS: BoundaryFields = BoundaryFields {
    id: AreaIdSource::Property(&["area_numbe", "area_number", "area_num", "community_area"]),
    name: &["community", "community_name", "name"],
};

/// Chicago safety adapter.
pub struct ChicagoSafety {
    boundaries: BoundarySet,
    cache: StatsCache,
    fetcher: Box<dyn StatsFetcher>,
}

impl ChicagoSafety {
    /// Builds the adapter with the production Socrata fetcher, loading
    /// boundaries from `<data_dir>/chicago/community_areas.geojson`.
    #[must_use]
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let path = data_dir.join("chicago").join("community_areas.geojson");
        let boundaries = BoundarySet::load_file(&path, &FIELDS, "Chicago");
        Self::new(boundaries, Box::new(GroupedCountFetcher::from_env()))
    }

    /// Builds the adapter from pre-loaded boundaries and a fetcher.
    #[must_use]
    pub fn new(boundaries: BoundarySet, fetcher: Box<dyn StatsFetcher>) -> Self {
        Self {
            boundaries,
            cache: StatsCache::new(CACHE_TTL),
            fetcher,
        }
    }

    async fn stats(&self) -> Arc<CrimeStats> {
        self.cache
            .get_or_refresh("Chicago", || self.fetcher.fetch_stats(&self.boundaries))
            .await
    }
}

#[async_trait]
impl AreaProvider for ChicagoSafety {
    fn city_key(&self) -> &'static str {
        "chicago"
    }

    fn display_name(&self) -> &'static str {
        "Chicago"
    }

    async fn area_features(&self) -> FeatureCollection {
        let stats = self.stats().await;
        enrich::annotate_features(self.display_name(), &self.boundaries, &stats)
    }

    async fn point_score(&self, lat: f64, lng: f64) -> Result<ScoreResult, SafetyError> {
        let Some(boundary) = self.boundaries.locate(lng, lat) else {
            return Ok(ScoreResult::fallback(self.display_name(), FALLBACK));
        };

        let stats = self.stats().await;
        Ok(enrich::score_boundary(self.display_name(), boundary, &stats))
    }
}

/// One row of the grouped Socrata response.
///
/// Socrata serves aggregate counts as strings, but older dataset
/// mirrors use plain numbers; both are accepted.
#[derive(Debug, Deserialize)]
struct GroupedCountRow {
    #[serde(default)]
    community_area: Option<String>,
    #[serde(default)]
    crime_count: Option<serde_json::Value>,
    #[serde(default)]
    count: Option<serde_json::Value>,
}

/// Parses a count that may be a JSON string or number.
fn parse_count(value: Option<&serde_json::Value>) -> u64 {
    match value {
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0),
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

/// Fetches per-area counts in a single `$group` query.
pub struct GroupedCountFetcher {
    api_url: String,
    since: DateTime<Utc>,
    app_token: Option<String>,
}

impl GroupedCountFetcher {
    /// Builds the production fetcher, reading the optional Socrata app
    /// token from `CHICAGO_APP_TOKEN`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_url: CHICAGO_API_URL.to_owned(),
            since: default_since(),
            app_token: std::env::var("CHICAGO_APP_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl StatsFetcher for GroupedCountFetcher {
    async fn fetch_stats(&self, _boundaries: &BoundarySet) -> Result<CrimeStats, SafetyError> {
        let since = self.since.format("%Y-%m-%dT%H:%M:%S");
        let params: Vec<(&str, String)> = vec![
            (
                "$select",
                "community_area, count(*) as crime_count".to_owned(),
            ),
            ("$group", "community_area".to_owned()),
            ("$where", format!("date >= '{since}'")),
        ];

        log::info!("[Chicago] Fetching grouped crime counts since {since}");

        let client = reqwest::Client::new();
        let mut request = client.get(&self.api_url).query(&params);
        if let Some(token) = &self.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request.send().await?.error_for_status()?;
        let rows: Vec<GroupedCountRow> = response.json().await?;

        let mut stats = CrimeStats::new();
        for row in rows {
            let Some(area) = row.community_area.filter(|a| !a.is_empty()) else {
                continue;
            };
            let count = parse_count(row.crime_count.as_ref().or(row.count.as_ref()));
            stats.insert(area, count);
        }

        log::info!(
            "[Chicago] Loaded crime stats for {} community areas",
            stats.len()
        );
        Ok(stats)
    }
}

/// The since-threshold as a UTC timestamp. The constant cannot fail to
/// parse; the `Utc::now` arm only guards against editing it into
/// something invalid.
fn default_since() -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(CRIME_SINCE, "%Y-%m-%dT%H:%M:%S")
        .map_or_else(|_| Utc::now(), |naive| naive.and_utc())
}
