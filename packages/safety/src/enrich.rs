//! Shared enrichment math for area features and point scores.
//!
//! The count → density → score → grade chain is identical across
//! cities; only the stats acquisition and fallback constants differ,
//! and those stay in the adapters.

use geojson::{Feature, FeatureCollection};
use stay_score_safety_models::{
    AreaProperties, CrimeStats, ScoreDiagnostics, ScoreResult,
};
use stay_score_scoring::{density_to_safety_score, scale_to_100, score_to_grade};

use crate::boundary::{Boundary, BoundarySet};

/// Crime count attributed to a boundary in the snapshot, 0 if unknown.
fn crime_count(boundary: &Boundary, stats: &CrimeStats) -> u64 {
    boundary
        .stats_key
        .as_deref()
        .and_then(|key| stats.get(key))
        .copied()
        .unwrap_or(0)
}

/// Annotates every boundary with its computed safety attributes.
///
/// Computed properties are merged over the source feature's own
/// properties, preserving whatever else the boundary file carried.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn annotate_features(
    city: &str,
    boundaries: &BoundarySet,
    stats: &CrimeStats,
) -> FeatureCollection {
    let features = boundaries
        .iter()
        .map(|boundary| {
            let count = crime_count(boundary, stats);
            let density = count as f64 / boundary.area_km2;

            let computed = AreaProperties {
                city: city.to_owned(),
                area_name: boundary.name.clone(),
                area_km2: boundary.area_km2,
                crime_count: count,
                crime_density_per_km2: density,
                safety_score: density_to_safety_score(density),
            };

            let mut properties = boundary.properties.clone();
            if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(&computed) {
                properties.extend(map);
            }

            Feature {
                bbox: None,
                geometry: Some(boundary.geometry.clone()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Scores a resolved boundary with full diagnostics.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_boundary(city: &str, boundary: &Boundary, stats: &CrimeStats) -> ScoreResult {
    let count = crime_count(boundary, stats);
    let density = count as f64 / boundary.area_km2;
    let safety_score10 = density_to_safety_score(density);
    let score100 = scale_to_100(safety_score10);

    ScoreResult {
        score: score100,
        grade: score_to_grade(score100),
        city: city.to_owned(),
        area_name: Some(boundary.name.clone()),
        raw: Some(ScoreDiagnostics {
            community_area: boundary.property_id.clone(),
            area_km2: boundary.area_km2,
            crime_count: count,
            crime_density_per_km2: density,
            safety_score10,
        }),
    }
}

#[cfg(test)]
mod tests {
    use stay_score_scoring::Grade;

    use super::*;
    use crate::boundary::{AreaIdSource, BoundaryFields};

    const FIELDS: BoundaryFields = BoundaryFields {
        id: AreaIdSource::AreaName,
        name: &["name"],
    };

    fn one_square_set(name: &str) -> BoundarySet {
        let raw = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": name, "borough_code": "X1" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [0.0, 0.0], [0.1, 0.0], [0.1, 0.1], [0.0, 0.1], [0.0, 0.0],
                    ]],
                },
            }],
        })
        .to_string();
        BoundarySet::from_geojson(&raw, &FIELDS).unwrap()
    }

    #[test]
    fn annotation_merges_computed_properties_over_source_ones() {
        let set = one_square_set("Annex");
        let stats = CrimeStats::from([("Annex".to_owned(), 12_u64)]);

        let fc = annotate_features("Toronto", &set, &stats);
        assert_eq!(fc.features.len(), 1);

        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["city"], "Toronto");
        assert_eq!(props["area_name"], "Annex");
        assert_eq!(props["crime_count"], 12);
        // Source properties survive the merge.
        assert_eq!(props["borough_code"], "X1");
        assert!(props["area_km2"].as_f64().unwrap() > 0.0);
        assert!(props["safety_score"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn unknown_area_reads_as_zero_crimes() {
        let set = one_square_set("Annex");
        let stats = CrimeStats::new();

        let fc = annotate_features("Toronto", &set, &stats);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["crime_count"], 0);
        assert_eq!(props["safety_score"], 10);
    }

    #[test]
    fn score_boundary_carries_full_diagnostics() {
        let set = one_square_set("Annex");
        let stats = CrimeStats::from([("Annex".to_owned(), 7_u64)]);
        let boundary = set.locate(0.05, 0.05).unwrap();

        let result = score_boundary("Toronto", boundary, &stats);
        assert_eq!(result.area_name.as_deref(), Some("Annex"));
        assert_eq!(result.city, "Toronto");

        let raw = result.raw.unwrap();
        assert_eq!(raw.crime_count, 7);
        assert_eq!(raw.community_area, None);
        assert!(raw.crime_density_per_km2 > 0.0);
        assert_eq!(result.score, raw.safety_score10 * 10);
        assert_eq!(result.grade, Grade::A);
    }
}
