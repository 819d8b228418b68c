//! REST handlers. Thin: parse, delegate to a service, map the error.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use roadpulse_common::{BoundingBox, GeoPoint, IncidentType, RoadPulseError};
use roadpulse_incidents::{NewReport, ReportFilter};

use crate::AppState;

// --- Query/body structs ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentsQuery {
    bbox: Option<String>,
    incident_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsQuery {
    bbox: Option<String>,
    user_id: Option<String>,
    active: Option<bool>,
    incident_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    incident_type: Option<String>,
    coordinates: Option<Vec<f64>>,
    description: Option<String>,
    severity: Option<String>,
    duration_minutes: Option<i64>,
    user_id: Option<String>,
}

// --- Error mapping ---

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({"status": "error", "message": message.into()})),
    )
        .into_response()
}

fn service_error(err: RoadPulseError) -> Response {
    match err {
        RoadPulseError::Validation(msg) => error_body(StatusCode::BAD_REQUEST, msg),
        RoadPulseError::NotFound(id) => {
            error_body(StatusCode::NOT_FOUND, format!("incident {id} not found"))
        }
        other => {
            warn!(error = %other, "Request failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

fn parse_type(raw: &Option<String>) -> Result<Option<IncidentType>, Response> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: String| error_body(StatusCode::BAD_REQUEST, format!("incidentType: {e}"))),
    }
}

fn parse_bbox(raw: &str) -> Result<BoundingBox, Response> {
    BoundingBox::parse(raw)
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, format!("bbox: {e}")))
}

fn parse_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw)
        .map_err(|_| error_body(StatusCode::BAD_REQUEST, format!("'{raw}' is not a valid id")))
}

// --- Handlers ---

pub async fn api_incidents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IncidentsQuery>,
) -> Response {
    let Some(raw_bbox) = params.bbox.as_deref() else {
        return error_body(StatusCode::BAD_REQUEST, "bbox query parameter is required");
    };
    let bbox = match parse_bbox(raw_bbox) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let type_filter = match parse_type(&params.incident_type) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match state.query.incidents_in(bbox, type_filter).await {
        Ok(merged) => Json(serde_json::json!({
            "status": "ok",
            "vendor": merged.vendor,
            "user": merged.user,
        }))
        .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn api_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportsQuery>,
) -> Response {
    let bbox = match params.bbox.as_deref() {
        Some(raw) => match parse_bbox(raw) {
            Ok(b) => Some(b),
            Err(resp) => return resp,
        },
        None => None,
    };
    let incident_type = match parse_type(&params.incident_type) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let filter = ReportFilter {
        bbox,
        reporter_id: params.user_id,
        active: params.active,
        incident_type,
    };
    match state.query.reports(filter).await {
        Ok(reports) => Json(serde_json::json!({ "reports": reports })).into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn api_submit_report(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReportBody>,
) -> Response {
    let Some(incident_type) = body.incident_type else {
        return error_body(StatusCode::BAD_REQUEST, "incidentType is required");
    };
    let location = match body.coordinates.as_deref() {
        Some([lon, lat]) => GeoPoint::new(*lon, *lat),
        Some(other) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                format!("coordinates: expected [lon, lat], got {} numbers", other.len()),
            );
        }
        None => return error_body(StatusCode::BAD_REQUEST, "coordinates are required"),
    };

    let report = NewReport {
        incident_type,
        location,
        description: body.description,
        severity: body.severity,
        duration_minutes: body.duration_minutes,
        reporter_id: body.user_id,
    };
    match state.reports.submit(report).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn api_validate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.reports.validate(id).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn api_invalidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.reports.invalidate(id).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn api_resolve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.reports.resolve(id).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => service_error(e),
    }
}
