use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub const HEALTH_BODY: &str = "Airsoft Checker läuft ✅";

pub fn build_app() -> Router {
    Router::new()
        .route("/", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    HEALTH_BODY
}
