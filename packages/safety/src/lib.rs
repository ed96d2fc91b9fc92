#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Per-city crime aggregation and safety scoring.
//!
//! Each supported city implements the [`AreaProvider`] trait: it loads a
//! static polygon dataset of administrative areas at construction, keeps
//! a TTL-cached snapshot of per-area crime counts fetched from the
//! city's open-data portal, and answers two queries — annotated area
//! features for the map, and a point-level safety score.
//!
//! Upstream failures never propagate past an adapter: a failed fetch
//! degrades to an empty snapshot (every area reads as zero crimes) and
//! a broken boundary file degrades to an empty area set, so the map
//! always renders something.

pub mod boundary;
pub mod cache;
pub mod cities;
pub mod enrich;
pub mod registry;

use async_trait::async_trait;
use geojson::FeatureCollection;
use stay_score_safety_models::{CrimeStats, ScoreResult};

pub use boundary::{AreaIdSource, BoundaryFields, BoundarySet};
pub use registry::SafetyRegistry;

/// Errors that can occur while fetching or aggregating crime data.
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (boundary file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The upstream source returned data we cannot interpret.
    #[error("Malformed upstream data: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Capability set every supported city implements.
///
/// One implementing type per city; fetch strategies differ per city and
/// are deliberately not forced through a common pipeline.
#[async_trait]
pub trait AreaProvider: Send + Sync {
    /// Stable lookup key (e.g., `"chicago"`).
    fn city_key(&self) -> &'static str;

    /// Human-readable city name (e.g., `"Chicago"`).
    fn display_name(&self) -> &'static str;

    /// Returns every administrative area annotated with the current
    /// crime count, density, and safety score.
    ///
    /// Never fails toward the caller: any internal failure degrades to
    /// an empty `FeatureCollection` so the map renders without scores.
    async fn area_features(&self) -> FeatureCollection;

    /// Scores a WGS84 point.
    ///
    /// A point outside every known polygon yields the city's fallback
    /// result with no area name.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError`] only for truly unexpected failures;
    /// upstream fetch problems degrade to zero counts instead.
    async fn point_score(&self, lat: f64, lng: f64) -> Result<ScoreResult, SafetyError>;
}

/// Strategy for acquiring one snapshot of per-area crime counts.
///
/// Each city ships its own implementation (grouped aggregate query,
/// centroid-radius sampling, or paginated bulk download with a spatial
/// join). Tests inject counting stubs through this seam.
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    /// Fetches a fresh snapshot of crime counts keyed by area identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError`] if the upstream request or parsing fails.
    async fn fetch_stats(&self, boundaries: &BoundarySet) -> Result<CrimeStats, SafetyError>;
}
