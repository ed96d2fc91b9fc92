//! London borough safety adapter.
//!
//! The police.uk street-crime API has no per-borough aggregation, so
//! each refresh samples one radius query centred on every borough's
//! centroid. That is O(boroughs) upstream calls per refresh, which is
//! why this adapter carries the longest TTL of the three cities.
//! API: <https://data.police.uk/docs/method/crime-street/>

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geojson::FeatureCollection;
use stay_score_safety_models::{CrimeStats, FallbackScore, ScoreResult};
use stay_score_scoring::Grade;

use crate::boundary::{AreaIdSource, BoundaryFields, BoundarySet};
use crate::cache::StatsCache;
use crate::{AreaProvider, SafetyError, StatsFetcher, enrich};

/// Base URL of the police.uk API.
const POLICE_BASE_URL: &str = "https://data.police.uk/api";

/// Month queried for street-crime counts, `YYYY-MM`.
const DEFAULT_MONTH: &str = "2024-06";

/// One refresh costs a request per borough; keep the snapshot for six
/// hours.
const CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 6);

/// Result for points outside every known borough.
const FALLBACK: FallbackScore = FallbackScore {
    score: 70,
    grade: Grade::B,
};

/// Borough files in the wild carry several naming conventions.
const FIELDS: BoundaryFields = BoundaryFields {
    id: AreaIdSource::AreaName,
    name: &[
        "area_name", "name", "NAME", "BOROUGH", "borough", "LAD13NM", "LAD16NM",
    ],
};

/// London safety adapter.
pub struct LondonSafety {
    boundaries: BoundarySet,
    cache: StatsCache,
    fetcher: Box<dyn StatsFetcher>,
}

impl LondonSafety {
    /// Builds the adapter with the production police.uk fetcher,
    /// loading boundaries from `<data_dir>/uk/london_boroughs.geojson`.
    #[must_use]
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let path = data_dir.join("uk").join("london_boroughs.geojson");
        let boundaries = BoundarySet::load_file(&path, &FIELDS, "London");
        Self::new(boundaries, Box::new(CentroidRadiusFetcher::new()))
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
            .get_or_refresh("London", || self.fetcher.fetch_stats(&self.boundaries))
            .await
    }
}

#[async_trait]
impl AreaProvider for LondonSafety {
    fn city_key(&self) -> &'static str {
        "london"
    }

    fn display_name(&self) -> &'static str {
        "London"
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

/// Samples street-crime counts with one radius query per borough
/// centroid.
pub struct CentroidRadiusFetcher {
    base_url: String,
    month: String,
}

impl CentroidRadiusFetcher {
    /// Builds the production fetcher against police.uk.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: POLICE_BASE_URL.to_owned(),
            month: DEFAULT_MONTH.to_owned(),
        }
    }

    /// Counts crimes around one point for the configured month.
    async fn crimes_around(
        &self,
        client: &reqwest::Client,
        lat: f64,
        lng: f64,
    ) -> Result<u64, SafetyError> {
        let url = format!(
            "{}/crimes-street/all-crime?date={}&lat={lat}&lng={lng}",
            self.base_url, self.month
        );
        let response = client.get(&url).send().await?.error_for_status()?;
        let crimes: Vec<serde_json::Value> = response.json().await?;
        Ok(crimes.len() as u64)
    }
}

impl Default for CentroidRadiusFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsFetcher for CentroidRadiusFetcher {
    async fn fetch_stats(&self, boundaries: &BoundarySet) -> Result<CrimeStats, SafetyError> {
        let client = reqwest::Client::new();
        let mut stats = CrimeStats::new();

        for boundary in boundaries.iter() {
            let count = match boundary.centroid {
                Some((lng, lat)) => match self.crimes_around(&client, lat, lng).await {
                    Ok(count) => count,
                    Err(e) => {
                        // One failed borough must not sink the whole
                        // snapshot; it reads as zero until next refresh.
                        log::error!("[London] Police API error for {}: {e}", boundary.name);
                        0
                    }
                },
                None => 0,
            };
            stats.insert(boundary.name.clone(), count);
        }

        log::info!("[London] Sampled crime counts for {} boroughs", stats.len());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::testing::{FailingFetcher, StubFetcher, square_set};

    #[tokio::test]
    async fn point_outside_all_boroughs_returns_london_fallback() {
        let adapter = LondonSafety::new(
            BoundarySet::empty(),
            Box::new(StubFetcher::new(CrimeStats::new())),
        );

        let result = adapter.point_score(51.5, -0.12).await.unwrap();
        assert_eq!(result.score, 70);
        assert_eq!(result.grade, Grade::B);
        assert_eq!(result.area_name, None);
        assert!(result.raw.is_none());
    }

    #[tokio::test]
    async fn borough_names_key_the_stats_snapshot() {
        let boundaries = square_set(
            &FIELDS,
            &[(serde_json::json!({ "LAD13NM": "Camden" }), 0.0, 0.0)],
        );
        let stats = CrimeStats::from([("Camden".to_owned(), 90_u64)]);
        let adapter = LondonSafety::new(boundaries, Box::new(StubFetcher::new(stats)));

        let result = adapter.point_score(0.5, 0.5).await.unwrap();
        assert_eq!(result.area_name.as_deref(), Some("Camden"));
        let raw = result.raw.unwrap();
        assert_eq!(raw.crime_count, 90);
        // Name-keyed cities carry no community-area number.
        assert_eq!(raw.community_area, None);
    }

    #[tokio::test]
    async fn area_features_survive_fetch_failure() {
        let boundaries = square_set(
            &FIELDS,
            &[(serde_json::json!({ "name": "Camden" }), 0.0, 0.0)],
        );
        let adapter = LondonSafety::new(boundaries, Box::new(FailingFetcher));

        let fc = adapter.area_features().await;
        assert_eq!(fc.features.len(), 1);
        assert_eq!(
            fc.features[0].properties.as_ref().unwrap()["crime_count"],
            0
        );
    }
}
