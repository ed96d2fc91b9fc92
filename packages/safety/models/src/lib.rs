#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Contract types for the safety scoring API.
//!
//! These types are serialized to JSON for the REST API. Point-score
//! responses use camelCase (matching the frontend client), while
//! per-feature map properties use snake_case `GeoJSON` property names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stay_score_scoring::Grade;

/// One fetch cycle's worth of crime counts, keyed by area identifier.
///
/// The identifier is city-specific: a community area number for Chicago,
/// an area name for London and Toronto.
pub type CrimeStats = BTreeMap<String, u64>;

/// Result of a point-level safety query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Safety score rescaled to 0-100.
    pub score: u8,
    /// Letter grade for the score.
    pub grade: Grade,
    /// City display name.
    pub city: String,
    /// Name of the containing area, `None` if the point lies outside
    /// every known polygon.
    pub area_name: Option<String>,
    /// Raw scoring inputs, omitted for fallback results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<ScoreDiagnostics>,
}

impl ScoreResult {
    /// Builds the defined result for a point outside all known areas.
    #[must_use]
    pub fn fallback(city: &str, fallback: FallbackScore) -> Self {
        Self {
            score: fallback.score,
            grade: fallback.grade,
            city: city.to_owned(),
            area_name: None,
            raw: None,
        }
    }
}

/// Raw inputs behind a computed [`ScoreResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDiagnostics {
    /// Community area number, for cities keyed by number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_area: Option<String>,
    /// Polygon area in km² (floored at the minimum).
    pub area_km2: f64,
    /// Crime count attributed to the area in the current snapshot.
    pub crime_count: u64,
    /// Crimes per km².
    pub crime_density_per_km2: f64,
    /// Unscaled 1-10 safety score.
    pub safety_score10: u8,
}

/// Score and grade returned when a point matches no known area.
///
/// Each city tunes its own fallback; there is deliberately no shared
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackScore {
    /// 0-100 score.
    pub score: u8,
    /// Letter grade.
    pub grade: Grade,
}

/// Computed properties merged into each area feature returned by the
/// `/areas` endpoint. Key names follow the `GeoJSON` property
/// convention used by the map frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaProperties {
    /// City display name.
    pub city: String,
    /// Resolved area name.
    pub area_name: String,
    /// Polygon area in km².
    pub area_km2: f64,
    /// Crime count from the current snapshot, 0 if unknown.
    pub crime_count: u64,
    /// Crimes per km².
    pub crime_density_per_km2: f64,
    /// 1-10 safety score.
    pub safety_score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_result_serializes_camel_case() {
        let result = ScoreResult {
            score: 80,
            grade: Grade::B,
            city: "Chicago".to_owned(),
            area_name: Some("Loop".to_owned()),
            raw: Some(ScoreDiagnostics {
                community_area: Some("32".to_owned()),
                area_km2: 4.2,
                crime_count: 120,
                crime_density_per_km2: 28.57,
                safety_score10: 8,
            }),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["areaName"], "Loop");
        assert_eq!(json["raw"]["communityArea"], "32");
        assert_eq!(json["raw"]["areaKm2"], 4.2);
        assert_eq!(json["raw"]["safetyScore10"], 8);
    }

    #[test]
    fn fallback_result_omits_diagnostics() {
        let result = ScoreResult::fallback(
            "London",
            FallbackScore {
                score: 70,
                grade: Grade::B,
            },
        );

        assert_eq!(result.score, 70);
        assert_eq!(result.grade, Grade::B);
        assert_eq!(result.area_name, None);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("raw").is_none());
        assert_eq!(json["areaName"], serde_json::Value::Null);
    }

    #[test]
    fn area_properties_serialize_snake_case() {
        let props = AreaProperties {
            city: "Toronto".to_owned(),
            area_name: "Annex".to_owned(),
            area_km2: 2.9,
            crime_count: 64,
            crime_density_per_km2: 22.07,
            safety_score: 10,
        };

        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["area_name"], "Annex");
        assert_eq!(json["crime_density_per_km2"], 22.07);
        assert_eq!(json["safety_score"], 10);
    }
}
