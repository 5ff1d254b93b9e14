use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    cache_stats_handler, create_link_handler, deep_health_handler, delete_link_handler,
    health_handler, link_detail_handler, redirect_handler, update_link_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/health/deep", get(deep_health_handler))
            .route("/debug/cache", get(cache_stats_handler))
            .route("/links", post(create_link_handler))
            .route(
                "/links/{code}",
                get(link_detail_handler)
                    .delete(delete_link_handler)
                    .patch(update_link_handler),
            )
            .route("/{code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
