use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{app_state::AppState, videogen::handlers};

/// Generation and catalog routes
pub fn videogen_router<S>(state: Arc<AppState>) -> OpenApiRouter<S> {
    let body_limit = state.config.server.body_limit_bytes;

    OpenApiRouter::new()
        .routes(routes!(handlers::generate_video))
        .routes(routes!(handlers::get_videos))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
