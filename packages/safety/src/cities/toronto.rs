//! Toronto neighbourhood safety adapter.
//!
//! The Toronto Police Service publishes Major Crime Indicators as an
//! `ArcGIS` feature layer with no server-side aggregation we can use,
//! so each refresh downloads every qualifying incident point with
//! offset pagination and attributes it to a neighbourhood with a
//! spatial join. The most expensive path of the three cities; it runs
//! at most once per TTL window.
//! Layer: <https://services.arcgis.com/S9th0jAJ7bqgIRjw/arcgis/rest/services/Major_Crime_Indicators_Open_Data/FeatureServer/0>

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

/// ArcGIS query endpoint for the Major Crime Indicators layer.
const TORONTO_MCI_URL: &str = "https://services.arcgis.com/S9th0jAJ7bqgIRjw/arcgis/rest/services/Major_Crime_Indicators_Open_Data/FeatureServer/0/query";

/// The layer caps responses at 2000 records per request.
const PAGE_SIZE: u64 = 2000;

/// Incident filter pushed down to the layer.
const WHERE_CLAUSE: &str = "OCC_YEAR >= 2023";

/// A full refresh downloads tens of thousands of points; keep the
/// snapshot for four hours.
const CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 4);

/// Result for points outside every known neighbourhood.
const FALLBACK: FallbackScore = FallbackScore {
    score: 70,
    grade: Grade::B,
};

const FIELDS: BoundaryFields = BoundaryFields {
    id: AreaIdSource::AreaName,
    name: &["name", "NAME", "NEIGHBOURHOOD"],
};

/// Toronto safety adapter.
pub struct TorontoSafety {
    boundaries: BoundarySet,
    cache: StatsCache,
    fetcher: Box<dyn StatsFetcher>,
}

impl TorontoSafety {
    /// Builds the adapter with the production TPS fetcher, loading
    /// boundaries from `<data_dir>/canada/toronto_neighbourhoods.geojson`.
    #[must_use]
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let path = data_dir
            .join("canada")
            .join("toronto_neighbourhoods.geojson");
        let boundaries = BoundarySet::load_file(&path, &FIELDS, "Toronto");
        Self::new(boundaries, Box::new(BulkSpatialJoinFetcher::new()))
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
            .get_or_refresh("Toronto", || self.fetcher.fetch_stats(&self.boundaries))
            .await
    }
}

#[async_trait]
impl AreaProvider for TorontoSafety {
    fn city_key(&self) -> &'static str {
        "toronto"
    }

    fn display_name(&self) -> &'static str {
        "Toronto"
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

/// Downloads all qualifying incident points and spatially joins them
/// onto the neighbourhood polygons.
pub struct BulkSpatialJoinFetcher {
    query_url: String,
    page_size: u64,
}

impl BulkSpatialJoinFetcher {
    /// Builds the production fetcher against the TPS open-data layer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            query_url: TORONTO_MCI_URL.to_owned(),
            page_size: PAGE_SIZE,
        }
    }

    /// Fetches every qualifying incident point with offset pagination.
    async fn fetch_points(&self, client: &reqwest::Client) -> Result<Vec<(f64, f64)>, SafetyError> {
        let mut all_points = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let params: Vec<(&str, String)> = vec![
                ("f", "geojson".to_owned()),
                ("where", WHERE_CLAUSE.to_owned()),
                ("outFields", "LAT_WGS84,LONG_WGS84,OCC_YEAR".to_owned()),
                ("outSR", "4326".to_owned()),
                ("resultOffset", offset.to_string()),
                ("resultRecordCount", self.page_size.to_string()),
            ];

            let response = client
                .get(&self.query_url)
                .query(&params)
                .send()
                .await?
                .error_for_status()?;
            let body: serde_json::Value = response.json().await?;

            let features = body
                .get("features")
                .and_then(serde_json::Value::as_array)
                .cloned()
                .unwrap_or_default();

            for feature in &features {
                if let Some(coords) = feature
                    .get("geometry")
                    .and_then(|geom| geom.get("coordinates"))
                    .and_then(serde_json::Value::as_array)
                    && let (Some(lng), Some(lat)) = (
                        coords.first().and_then(serde_json::Value::as_f64),
                        coords.get(1).and_then(serde_json::Value::as_f64),
                    )
                {
                    all_points.push((lng, lat));
                }
            }

            let count = features.len() as u64;
            log::info!("[Toronto] TPS chunk fetched: {count} records (offset={offset})");

            if !has_more_pages(count, self.page_size) {
                break;
            }
            offset += count;
        }

        log::info!("[Toronto] TPS total crime points fetched: {}", all_points.len());
        Ok(all_points)
    }
}

impl Default for BulkSpatialJoinFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsFetcher for BulkSpatialJoinFetcher {
    async fn fetch_stats(&self, boundaries: &BoundarySet) -> Result<CrimeStats, SafetyError> {
        let client = reqwest::Client::new();
        let points = self.fetch_points(&client).await?;
        Ok(attribute_points(boundaries, &points))
    }
}

/// The layer reports no total count; a short page is the only end
/// signal.
const fn has_more_pages(page_count: u64, page_size: u64) -> bool {
    page_count >= page_size
}

/// Attributes each incident point to the first containing neighbourhood
/// in load order. Every neighbourhood starts at zero so unmatched areas
/// still appear in the snapshot.
fn attribute_points(boundaries: &BoundarySet, points: &[(f64, f64)]) -> CrimeStats {
    let mut stats: CrimeStats = boundaries
        .iter()
        .map(|boundary| (boundary.name.clone(), 0))
        .collect();

    for &(lng, lat) in points {
        if let Some(boundary) = boundaries.locate(lng, lat)
            && let Some(count) = stats.get_mut(&boundary.name)
        {
            *count += 1;
        }
    }

    stats
}
