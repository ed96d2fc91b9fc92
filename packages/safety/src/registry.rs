//! City adapter registry and dispatch.
//!
//! Maps a city key to its adapter. Unknown cities are a defined
//! "not supported" outcome (`None`), never an error, so the routing
//! layer can answer 404 without exception plumbing.

use std::path::Path;
use std::sync::Arc;

use geojson::FeatureCollection;
use stay_score_safety_models::ScoreResult;

use crate::cities::{ChicagoSafety, LondonSafety, TorontoSafety};
use crate::{AreaProvider, SafetyError};

/// Registry of all supported city adapters.
pub struct SafetyRegistry {
    adapters: Vec<Arc<dyn AreaProvider>>,
}

impl SafetyRegistry {
    /// Builds the production registry, loading each city's boundary
    /// file from the given data root. Missing files degrade to empty
    /// boundary sets; the registry itself always constructs.
    #[must_use]
    pub fn from_data_dir(data_dir: &Path) -> Self {
        Self::with_adapters(vec![
            Arc::new(ChicagoSafety::from_data_dir(data_dir)),
            Arc::new(LondonSafety::from_data_dir(data_dir)),
            Arc::new(TorontoSafety::from_data_dir(data_dir)),
        ])
    }

    /// Builds a registry from explicit adapters.
    #[must_use]
    pub fn with_adapters(adapters: Vec<Arc<dyn AreaProvider>>) -> Self {
        Self { adapters }
    }

    /// Case-insensitive adapter lookup. `None` means the city is not
    /// supported.
    #[must_use]
    pub fn get(&self, city_key: &str) -> Option<&dyn AreaProvider> {
        self.adapters
            .iter()
            .find(|adapter| adapter.city_key().eq_ignore_ascii_case(city_key))
            .map(AsRef::as_ref)
    }

    /// Keys of all registered cities, in registration order.
    #[must_use]
    pub fn city_keys(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.city_key()).collect()
    }

    /// Annotated area features for a city, `None` if unsupported.
    ///
    /// Adapter-level failures have already degraded to an empty
    /// collection by the time this returns.
    pub async fn area_features(&self, city_key: &str) -> Option<FeatureCollection> {
        match self.get(city_key) {
            Some(adapter) => Some(adapter.area_features().await),
            None => None,
        }
    }

    /// Point score for a city, `None` if unsupported.
    ///
    /// Unlike areas, adapter errors are propagated so the routing layer
    /// can answer with a server error.
    pub async fn point_score(
        &self,
        city_key: &str,
        lat: f64,
        lng: f64,
    ) -> Option<Result<ScoreResult, SafetyError>> {
        match self.get(city_key) {
            Some(adapter) => Some(adapter.point_score(lat, lng).await),
            None => None,
        }
    }
}
