pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let logo_routes = Router::new()
        .route("/generate", post(routes::logo::generate))
        .route("/status", get(routes::logo::status))
        .route("/result", get(routes::logo::result));

    let image_routes = Router::new().route("/hd-url", get(routes::image::hd_url));

    let api = Router::new()
        .nest("/logo", logo_routes)
        .nest("/image", image_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
