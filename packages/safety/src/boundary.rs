//! Administrative-area boundary loading.
//!
//! Boundaries are loaded once from a `GeoJSON` file at adapter
//! construction and are immutable for the process lifetime. Each feature
//! is resolved to a name and a stats key using a per-city field mapping,
//! since every open-data portal names its identifying properties
//! differently.

use std::path::Path;

use geo::MultiPolygon;
use geojson::GeoJson;
use stay_score_geometry::PolygonIndex;

use crate::SafetyError;

/// Where an area's stats key comes from.
#[derive(Debug, Clone, Copy)]
pub enum AreaIdSource {
    /// A dedicated identifying property (e.g. Chicago's community area
    /// number). Candidates are tried in order; first present wins.
    Property(&'static [&'static str]),
    /// The resolved area name doubles as the identifier (London
    /// boroughs, Toronto neighbourhoods).
    AreaName,
}

/// Per-city property names for extracting identifier and name.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryFields {
    /// How to derive the stats key.
    pub id: AreaIdSource,
    /// Candidate property names for the area name, tried in order.
    pub name: &'static [&'static str],
}

/// A single administrative area with precomputed attributes.
///
/// The polygon itself lives in the [`PolygonIndex`]; this struct carries
/// everything needed to answer queries once containment is resolved.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// Resolved area name.
    pub name: String,
    /// Key into the crime-stats snapshot, `None` when the feature has no
    /// resolvable identifier (its counts always read as zero).
    pub stats_key: Option<String>,
    /// Identifier extracted from a dedicated property, when the city
    /// keys areas by number rather than name.
    pub property_id: Option<String>,
    /// Geodesic area in km², floored at the minimum.
    pub area_km2: f64,
    /// Polygon centroid as `(lng, lat)`.
    pub centroid: Option<(f64, f64)>,
    /// Original feature geometry, passed through to area responses.
    pub geometry: geojson::Geometry,
    /// Original feature properties, passed through to area responses.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// The immutable polygon dataset for one city.
pub struct BoundarySet {
    boundaries: Vec<Boundary>,
    index: PolygonIndex,
}

impl BoundarySet {
    /// A set with no areas. Every point query resolves to the city
    /// fallback and area queries return an empty collection.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            boundaries: Vec::new(),
            index: PolygonIndex::new(Vec::new()),
        }
    }

    /// Loads boundaries from a `GeoJSON` file.
    ///
    /// A missing or malformed file degrades to an empty set (logged);
    /// adapter construction must never fail on bad data files.
    #[must_use]
    pub fn load_file(path: &Path, fields: &BoundaryFields, label: &str) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("[{label}] Failed to read boundary file {}: {e}", path.display());
                return Self::empty();
            }
        };

        match Self::from_geojson(&raw, fields) {
            Ok(set) => {
                log::info!("[{label}] Loaded {} boundary features", set.len());
                set
            }
            Err(e) => {
                log::error!("[{label}] Failed to parse boundary file {}: {e}", path.display());
                Self::empty()
            }
        }
    }

    /// Parses boundaries from a `GeoJSON` string.
    ///
    /// Accepts a `FeatureCollection` or a single `Feature`. Features
    /// whose geometry is missing or not a (multi-)polygon are skipped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Malformed`] if the document is not valid
    /// `GeoJSON` or not a feature-bearing type.
    pub fn from_geojson(raw: &str, fields: &BoundaryFields) -> Result<Self, SafetyError> {
        let geojson: GeoJson = raw.parse().map_err(|e: geojson::Error| SafetyError::Malformed {
            message: e.to_string(),
        })?;

        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(SafetyError::Malformed {
                    message: "expected a FeatureCollection, got a bare geometry".to_owned(),
                });
            }
        };

        let mut boundaries = Vec::with_capacity(features.len());
        let mut polygons: Vec<MultiPolygon<f64>> = Vec::with_capacity(features.len());

        for feature in features {
            let Some(geometry) = feature.geometry else {
                log::warn!("Skipping boundary feature without geometry");
                continue;
            };

            let polygon = match stay_score_geometry::multipolygon_from_geometry(&geometry) {
                Ok(polygon) => polygon,
                Err(e) => {
                    log::warn!("Skipping boundary feature with unusable geometry: {e}");
                    continue;
                }
            };

            let properties = feature.properties.unwrap_or_default();
            let property_id = match fields.id {
                AreaIdSource::Property(candidates) => first_property(&properties, candidates),
                AreaIdSource::AreaName => None,
            };
            let name = first_property(&properties, fields.name).unwrap_or_else(|| {
                match fields.id {
                    AreaIdSource::Property(_) => {
                        format!("Area {}", property_id.as_deref().unwrap_or("Unknown"))
                    }
                    AreaIdSource::AreaName => "Unknown".to_owned(),
                }
            });
            let stats_key = match fields.id {
                AreaIdSource::Property(_) => property_id.clone(),
                AreaIdSource::AreaName => Some(name.clone()),
            };

            boundaries.push(Boundary {
                name,
                stats_key,
                property_id,
                area_km2: stay_score_geometry::area_km2(&polygon),
                centroid: stay_score_geometry::centroid(&polygon),
                geometry,
                properties,
            });
            polygons.push(polygon);
        }

        Ok(Self {
            index: PolygonIndex::new(polygons),
            boundaries,
        })
    }

    /// Finds the boundary containing a WGS84 point.
    ///
    /// Overlapping polygons resolve to the earliest feature in file
    /// order (the load-order tie-break of [`PolygonIndex::locate`]).
    #[must_use]
    pub fn locate(&self, lng: f64, lat: f64) -> Option<&Boundary> {
        self.index
            .locate(lng, lat)
            .and_then(|idx| self.boundaries.get(idx))
    }

    /// Iterates boundaries in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, Boundary> {
        self.boundaries.iter()
    }

    /// Number of loaded boundaries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Whether the set holds no boundaries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}

/// Returns the first listed property present on the feature, as a
/// trimmed non-empty string. Numeric values are stringified, matching
/// portals that serve area numbers as JSON numbers.
fn first_property(
    properties: &serde_json::Map<String, serde_json::Value>,
    candidates: &[&str],
) -> Option<String> {
    for key in candidates {
        match properties.get(*key) {
            Some(serde_json::Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_owned());
                }
            }
            Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHICAGO_FIELDS: BoundaryFields = BoundaryFields {
        id: AreaIdSource::Property(&["area_numbe", "area_number"]),
        name: &["community", "name"],
    };

    const NAME_FIELDS: BoundaryFields = BoundaryFields {
        id: AreaIdSource::AreaName,
        name: &["name"],
    };

    fn square_feature(props: serde_json::Value, min_lng: f64, min_lat: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "properties": props,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [min_lng, min_lat],
                    [min_lng + 1.0, min_lat],
                    [min_lng + 1.0, min_lat + 1.0],
                    [min_lng, min_lat + 1.0],
                    [min_lng, min_lat],
                ]],
            },
        })
    }

    fn collection(features: Vec<serde_json::Value>) -> String {
        serde_json::json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    #[test]
    fn extracts_numeric_area_identifier() {
        let raw = collection(vec![square_feature(
            serde_json::json!({ "area_numbe": 32, "community": "LOOP" }),
            0.0,
            0.0,
        )]);
        let set = BoundarySet::from_geojson(&raw, &CHICAGO_FIELDS).unwrap();

        assert_eq!(set.len(), 1);
        let boundary = set.iter().next().unwrap();
        assert_eq!(boundary.name, "LOOP");
        assert_eq!(boundary.stats_key.as_deref(), Some("32"));
        assert_eq!(boundary.property_id.as_deref(), Some("32"));
    }

    #[test]
    fn falls_back_to_area_number_name() {
        let raw = collection(vec![square_feature(
            serde_json::json!({ "area_numbe": "7" }),
            0.0,
            0.0,
        )]);
        let set = BoundarySet::from_geojson(&raw, &CHICAGO_FIELDS).unwrap();
        assert_eq!(set.iter().next().unwrap().name, "Area 7");
    }

    #[test]
    fn name_keyed_city_uses_name_as_stats_key() {
        let raw = collection(vec![square_feature(
            serde_json::json!({ "name": "Camden" }),
            0.0,
            0.0,
        )]);
        let set = BoundarySet::from_geojson(&raw, &NAME_FIELDS).unwrap();
        let boundary = set.iter().next().unwrap();
        assert_eq!(boundary.stats_key.as_deref(), Some("Camden"));
        assert_eq!(boundary.property_id, None);
    }

    #[test]
    fn unnamed_feature_resolves_to_unknown() {
        let raw = collection(vec![square_feature(serde_json::json!({}), 0.0, 0.0)]);
        let set = BoundarySet::from_geojson(&raw, &NAME_FIELDS).unwrap();
        assert_eq!(set.iter().next().unwrap().name, "Unknown");
    }

    #[test]
    fn skips_features_without_usable_geometry() {
        let point_feature = serde_json::json!({
            "type": "Feature",
            "properties": { "name": "Nowhere" },
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
        });
        let raw = collection(vec![
            point_feature,
            square_feature(serde_json::json!({ "name": "Somewhere" }), 0.0, 0.0),
        ]);
        let set = BoundarySet::from_geojson(&raw, &NAME_FIELDS).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().name, "Somewhere");
    }

    #[test]
    fn accepts_a_single_bare_feature() {
        let raw = square_feature(serde_json::json!({ "name": "Solo" }), 0.0, 0.0).to_string();
        let set = BoundarySet::from_geojson(&raw, &NAME_FIELDS).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn locate_respects_load_order() {
        let raw = collection(vec![
            square_feature(serde_json::json!({ "name": "First" }), 0.0, 0.0),
            square_feature(serde_json::json!({ "name": "Second" }), 0.5, 0.5),
        ]);
        let set = BoundarySet::from_geojson(&raw, &NAME_FIELDS).unwrap();

        // (0.75, 0.75) is inside both squares; the first loaded wins.
        assert_eq!(set.locate(0.75, 0.75).unwrap().name, "First");
        assert_eq!(set.locate(1.25, 1.25).unwrap().name, "Second");
        assert!(set.locate(30.0, 30.0).is_none());
    }

    #[test]
    fn missing_boundary_file_degrades_to_empty_set() {
        let set = BoundarySet::load_file(
            Path::new("/nonexistent/boundaries.geojson"),
            &NAME_FIELDS,
            "Test",
        );
        assert!(set.is_empty());
    }
}
