#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the stay score server.
//!
//! Score and feature payloads come straight from
//! `stay_score_safety_models`; this crate only adds the server-specific
//! envelope types.

use serde::{Deserialize, Serialize};

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server considers itself healthy.
    pub healthy: bool,
    /// Crate version string.
    pub version: String,
}

/// Query parameters for the point-score endpoint.
///
/// Both coordinates are optional at the type level so the handler can
/// answer a consistent 400 body when either is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct PointQueryParams {
    /// WGS84 latitude.
    pub lat: Option<f64>,
    /// WGS84 longitude.
    pub lng: Option<f64>,
}
