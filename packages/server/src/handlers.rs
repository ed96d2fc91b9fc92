//! HTTP handler functions for the safety API.

use actix_web::{HttpResponse, web};
use stay_score_server_models::{ApiHealth, PointQueryParams};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/safety/{city}/areas`
///
/// Returns every administrative area annotated with crime counts and
/// safety scores. Unsupported cities get a 404; adapter failures have
/// already degraded to an empty collection so the map always renders.
pub async fn city_areas(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let city = path.into_inner();

    match state.registry.area_features(&city).await {
        Some(fc) => HttpResponse::Ok().json(fc),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Unknown city"
        })),
    }
}

/// `GET /api/safety/{city}/point?lat=&lng=`
///
/// Scores a single coordinate. Points outside every known area return
/// the city's fallback score rather than an error.
pub async fn city_point(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PointQueryParams>,
) -> HttpResponse {
    let city = path.into_inner();

    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "lat, lng required"
        }));
    };

    match state.registry.point_score(&city, lat, lng).await {
        Some(Ok(result)) => HttpResponse::Ok().json(result),
        Some(Err(e)) => {
            log::error!("[{city}] point error for lat={lat}, lng={lng}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "safety point error"
            }))
        }
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Unknown city"
        })),
    }
}
