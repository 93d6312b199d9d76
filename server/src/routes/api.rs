use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use bytes::Bytes;
use tracing::{info, warn};
use ubsmap_shared::dashboard::{export, facility_summary};
use ubsmap_shared::{
    Dashboard, DashboardConfig, ExportArtifact, ExportError, FacilitySummary, RenderError,
    content_etag, render,
};

use crate::config::EXPORT_CACHE_CONTROL;
use crate::leaflet::render_map_html;
use crate::routes::error::ApiError;
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "boundary_file": state.settings.boundary_path.display().to_string(),
        "facility_file": state.settings.facility_path.display().to_string(),
        "zoom": state.settings.zoom,
        "cached_layers": state.layer_cache.entries(),
        "observability": {
            "map_requests_total": observability.map_requests_total,
            "render_failures_total": observability.render_failures_total,
            "layer_cache_hits_total": observability.layer_cache_hits_total,
            "layer_cache_misses_total": observability.layer_cache_misses_total,
            "layer_cache_clears_total": observability.layer_cache_clears_total,
            "exports_total": observability.exports_total,
            "skipped_markers_total": observability.skipped_markers_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(state.layer_cache.len(), state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(cached_layers: usize, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "ubsmap_layer_cache_entries",
        "gauge",
        "Layers currently held in the layer cache.",
        cached_layers as u64,
    );
    write_metric(
        &mut body,
        "ubsmap_map_requests_total",
        "counter",
        "Total dashboard renders requested.",
        observability.map_requests_total,
    );
    write_metric(
        &mut body,
        "ubsmap_render_failures_total",
        "counter",
        "Total dashboard renders that returned an error.",
        observability.render_failures_total,
    );
    write_metric(
        &mut body,
        "ubsmap_layer_cache_hits_total",
        "counter",
        "Total layer lookups served from the cache.",
        observability.layer_cache_hits_total,
    );
    write_metric(
        &mut body,
        "ubsmap_layer_cache_misses_total",
        "counter",
        "Total layer lookups that read the file from disk.",
        observability.layer_cache_misses_total,
    );
    write_metric(
        &mut body,
        "ubsmap_layer_cache_clears_total",
        "counter",
        "Total explicit layer cache clears.",
        observability.layer_cache_clears_total,
    );
    write_metric(
        &mut body,
        "ubsmap_exports_total",
        "counter",
        "Total export downloads served.",
        observability.exports_total,
    );
    write_metric(
        &mut body,
        "ubsmap_skipped_markers_total",
        "counter",
        "Total facility records left off the map for lack of a usable coordinate.",
        observability.skipped_markers_total,
    );
    body
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

pub async fn get_map(
    State(state): State<AppState>,
    Query(config): Query<DashboardConfig>,
) -> Result<Json<Dashboard>, ApiError> {
    render_dashboard(&state, &config).await.map(Json)
}

pub async fn get_map_page(
    State(state): State<AppState>,
    Query(config): Query<DashboardConfig>,
) -> Result<Html<String>, ApiError> {
    let dashboard = render_dashboard(&state, &config).await?;
    let html = render_map_html(&dashboard.map).map_err(|e| ExportError {
        artifact: "map.html",
        message: e.to_string(),
    })?;
    Ok(Html(html))
}

pub async fn get_facilities(
    State(state): State<AppState>,
) -> Result<Json<FacilitySummary>, ApiError> {
    let layers = state.load_layers().await?;
    Ok(Json(facility_summary(&layers.facilities)))
}

pub async fn get_export(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(artifact) = ExportArtifact::from_file_name(&file) else {
        return Err(ApiError::UnknownArtifact(file));
    };

    let layers = state.load_layers().await?;
    let body = export(artifact, &layers).inspect_err(|e| {
        warn!(error = %e, file = artifact.file_name(), "export failed");
    })?;
    let etag = content_etag(body.as_bytes());

    if if_none_match_matches(&headers, &etag) {
        return Ok(not_modified_response(EXPORT_CACHE_CONTROL, Some(etag.as_str())));
    }

    state.observability.record_export();
    Ok(artifact_response(Bytes::from(body), artifact, &etag))
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    let dropped = state.layer_cache.len();
    state.layer_cache.clear();
    state.observability.record_layer_cache_clear();
    info!(dropped, "layer cache cleared");
    StatusCode::NO_CONTENT
}

/// Load the layers and run one render, logging what the map had to leave out.
async fn render_dashboard(
    state: &AppState,
    config: &DashboardConfig,
) -> Result<Dashboard, ApiError> {
    state.observability.record_map_request();

    let result = match state.load_layers().await {
        Ok(layers) => render(config, &layers, state.settings.zoom),
        Err(e) => Err(RenderError::from(e)),
    };

    match result {
        Ok(dashboard) => {
            for skipped in &dashboard.skipped {
                warn!(
                    index = skipped.index,
                    name = %skipped.name,
                    reason = ?skipped.reason,
                    "facility left off the map"
                );
            }
            state
                .observability
                .record_skipped_markers(dashboard.skipped.len() as u64);
            Ok(dashboard)
        }
        Err(e) => {
            state.observability.record_render_failure();
            warn!(error = %e, kind = e.kind(), base = %config.base, "dashboard render failed");
            Err(e.into())
        }
    }
}

fn artifact_response(body: Bytes, artifact: ExportArtifact, etag: &str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(artifact.content_type()),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(EXPORT_CACHE_CONTROL),
    );
    if let Ok(disposition) = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.file_name()
    )) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    if let Ok(etag_header) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
