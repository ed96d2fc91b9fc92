//! City adapters.
//!
//! One module per supported city. The adapters share the boundary,
//! cache, and enrichment plumbing but each keeps its own stats fetch
//! strategy and fallback tuning — the upstream portals are genuinely
//! different (grouped aggregate query, centroid-radius sampling,
//! paginated bulk download with a spatial join).

pub mod chicago;
pub mod london;
pub mod toronto;

pub use chicago::ChicagoSafety;
pub use london::LondonSafety;
pub use toronto::TorontoSafety;
