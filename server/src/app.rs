use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config::ASSET_CACHE_CONTROL;
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let static_assets = ServeDir::new(&state.settings.assets_dir);

    Router::new()
        .route("/map", get(routes::api::get_map_page))
        .route("/api/map", get(routes::api::get_map))
        .route("/api/facilities", get(routes::api::get_facilities))
        .route("/api/export/{file}", get(routes::api::get_export))
        .route("/api/cache/clear", post(routes::api::clear_cache))
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .nest_service("/assets", static_assets)
        .layer(middleware::from_fn(set_static_cache_control))
        .layer(CompressionLayer::new())
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if path.starts_with("/assets/") {
        return Some(ASSET_CACHE_CONTROL);
    }

    None
}
