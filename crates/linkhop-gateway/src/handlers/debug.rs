use axum::extract::State;
use axum::Json;
use linkhop_cache::LocalCacheStats;

use crate::state::AppState;

/// Counters of this instance's in-process cache.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<LocalCacheStats> {
    Json(state.resolver().cache_stats())
}
