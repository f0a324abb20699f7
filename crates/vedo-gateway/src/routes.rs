// ── HTTP routes ──
//
// Thin layer over the `Vedo` facade: parse the path segment, call the
// facade, serialize the answer. Every failure goes through `ApiError`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::debug;

use vedo_core::{Area, AreaScope, GeneralStatus, Vedo, Zone, ZoneFilter};

use crate::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the gateway router around a shared panel client.
pub fn router(vedo: Vedo) -> Router {
    Router::new()
        .route("/vedo/status", get(general_status))
        .route("/vedo/areas", get(list_areas))
        .route("/vedo/areas/{area}", get(get_area))
        .route("/vedo/areas/{area}/is-active", get(is_active))
        .route("/vedo/areas/{area}/zones", get(list_zones))
        .route("/vedo/areas/{area}/arm", post(arm))
        .route("/vedo/areas/{area}/disarm", post(disarm))
        .route("/vedo/areas/{area}/arm-disarm", post(toggle))
        .route("/vedo/zones/{zone}/exclude", post(exclude_zone))
        .route("/vedo/zones/{zone}/include", post(include_zone))
        .route("/vedo/zones/{zone}/isolate", post(isolate_zone))
        .route("/vedo/zones/{zone}/remove-isolate", post(unisolate_zone))
        .layer(TraceLayer::new_for_http())
        .with_state(vedo)
}

// ── Path parsing ────────────────────────────────────────────────────

fn area_scope(raw: &str) -> Result<AreaScope, ApiError> {
    raw.parse().map_err(|e| ApiError::bad_area(&e))
}

fn area_id(raw: &str) -> Result<u32, ApiError> {
    match area_scope(raw)? {
        AreaScope::Area(id) => Ok(id),
        AreaScope::All => Err(ApiError::BadPath {
            what: "area",
            input: raw.to_owned(),
        }),
    }
}

fn zone_id(raw: &str) -> Result<u32, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::bad_zone(raw))
}

// ── Status ──────────────────────────────────────────────────────────

async fn general_status(State(vedo): State<Vedo>) -> Json<GeneralStatus> {
    Json(vedo.get_general_status().await)
}

async fn list_areas(State(vedo): State<Vedo>) -> ApiResult<Vec<Area>> {
    Ok(Json(vedo.get_areas_status().await?))
}

/// `204 No Content` when the panel has no such area.
async fn get_area(
    State(vedo): State<Vedo>,
    Path(area): Path<String>,
) -> Result<Response, ApiError> {
    let id = area_id(&area)?;
    Ok(match vedo.get_area_status(id).await? {
        Some(area) => Json(area).into_response(),
        None => {
            debug!(area = id, "area not present on panel");
            StatusCode::NO_CONTENT.into_response()
        }
    })
}

async fn is_active(State(vedo): State<Vedo>, Path(area): Path<String>) -> ApiResult<bool> {
    let active = match area_scope(&area)? {
        AreaScope::All => vedo.is_alarm_active().await?,
        AreaScope::Area(id) => vedo.is_area_active(id).await?,
    };
    Ok(Json(active))
}

async fn list_zones(State(vedo): State<Vedo>, Path(area): Path<String>) -> ApiResult<Vec<Zone>> {
    let filter: ZoneFilter = area_scope(&area)?.into();
    Ok(Json(vedo.get_zone_list(filter).await?))
}

// ── Area commands ───────────────────────────────────────────────────

async fn arm(State(vedo): State<Vedo>, Path(area): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.arm_alarm(area_scope(&area)?).await?))
}

async fn disarm(State(vedo): State<Vedo>, Path(area): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.disarm_alarm(area_scope(&area)?).await?))
}

/// Answers `true` when the area ended up armed.
async fn toggle(State(vedo): State<Vedo>, Path(area): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.toggle_alarm(area_scope(&area)?).await?))
}

// ── Zone commands ───────────────────────────────────────────────────

async fn exclude_zone(State(vedo): State<Vedo>, Path(zone): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.exclude_zone(zone_id(&zone)?).await?))
}

async fn include_zone(State(vedo): State<Vedo>, Path(zone): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.include_zone(zone_id(&zone)?).await?))
}

async fn isolate_zone(State(vedo): State<Vedo>, Path(zone): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.isolate_zone(zone_id(&zone)?).await?))
}

async fn unisolate_zone(State(vedo): State<Vedo>, Path(zone): Path<String>) -> ApiResult<bool> {
    Ok(Json(vedo.unisolate_zone(zone_id(&zone)?).await?))
}
