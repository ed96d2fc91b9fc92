#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Polygon geometry utilities for administrative area boundaries.
//!
//! Converts `GeoJSON` geometries into [`geo`] multi-polygons, computes
//! geodesic areas in km², and provides an R-tree-backed
//! point-in-polygon lookup index. Area computation never fails toward
//! the caller: degenerate or broken geometry degrades to a fallback
//! value so scoring can always proceed.

use geo::{BoundingRect, Centroid, Contains, GeodesicArea, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

/// Minimum area in km². Divisions by area are floored here so that
/// degenerate polygons cannot produce a division by zero.
pub const MIN_AREA_KM2: f64 = 0.01;

/// Area value used when the computation produces garbage.
const FALLBACK_AREA_KM2: f64 = 1.0;

/// Errors that can occur when converting `GeoJSON` geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The `GeoJSON` geometry could not be converted to `geo` types.
    #[error("Invalid geometry: {0}")]
    Invalid(String),

    /// The geometry converted, but is not a polygon or multi-polygon.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
///
/// Plain `Polygon` geometries are wrapped into a single-member
/// `MultiPolygon` so callers only deal with one shape.
///
/// # Errors
///
/// Returns [`GeometryError`] if the geometry cannot be converted or is
/// not a (multi-)polygon.
pub fn multipolygon_from_geometry(
    geometry: &geojson::Geometry,
) -> Result<MultiPolygon<f64>, GeometryError> {
    let geo_geom: geo::Geometry<f64> = geometry
        .value
        .clone()
        .try_into()
        .map_err(|e: geojson::Error| GeometryError::Invalid(e.to_string()))?;

    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(GeometryError::UnsupportedType(format!("{other:?}"))),
    }
}

/// Computes the geodesic area of a multi-polygon in km², floored at
/// [`MIN_AREA_KM2`].
///
/// A non-finite result (broken ring ordering, NaN coordinates) is logged
/// and degrades to 1.0 km² rather than aborting the caller.
#[must_use]
pub fn area_km2(polygon: &MultiPolygon<f64>) -> f64 {
    let area_m2 = polygon.geodesic_area_unsigned();
    if !area_m2.is_finite() {
        log::error!("Failed to compute polygon area, using {FALLBACK_AREA_KM2} km² fallback");
        return FALLBACK_AREA_KM2;
    }
    (area_m2 / 1_000_000.0).max(MIN_AREA_KM2)
}

/// Tests whether a WGS84 point lies inside a multi-polygon.
///
/// Holes are respected: a point inside an interior ring is outside.
#[must_use]
pub fn contains_point(polygon: &MultiPolygon<f64>, lng: f64, lat: f64) -> bool {
    polygon.contains(&Point::new(lng, lat))
}

/// Returns the centroid of a multi-polygon as `(lng, lat)`.
///
/// `None` for empty geometry.
#[must_use]
pub fn centroid(polygon: &MultiPolygon<f64>) -> Option<(f64, f64)> {
    polygon.centroid().map(|p| (p.x(), p.y()))
}

/// An indexed polygon stored in the R-tree with its load position.
struct PolygonEntry {
    load_index: usize,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for PolygonEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree index over a set of area polygons, preserving load order.
///
/// The R-tree only narrows candidates by bounding box; exact containment
/// is still decided by [`Contains`]. Polygons are immutable once indexed.
pub struct PolygonIndex {
    tree: RTree<PolygonEntry>,
    len: usize,
}

impl PolygonIndex {
    /// Builds an index over polygons in load order.
    #[must_use]
    pub fn new(polygons: Vec<MultiPolygon<f64>>) -> Self {
        let len = polygons.len();
        let entries = polygons
            .into_iter()
            .enumerate()
            .map(|(load_index, polygon)| PolygonEntry {
                load_index,
                envelope: compute_envelope(&polygon),
                polygon,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            len,
        }
    }

    /// Finds the polygon containing the point.
    ///
    /// Returns the load index of the match. If polygons overlap, the
    /// lowest load index wins, matching a linear scan over the source
    /// file's feature order.
    #[must_use]
    pub fn locate(&self, lng: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.load_index)
            .min()
    }

    /// Number of indexed polygons.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no polygons.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Computes the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
