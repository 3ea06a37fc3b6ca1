/**
 * API Route Configuration
 *
 * This module defines the moderation API routes.
 *
 * # Routes
 *
 * ## User
 * - `POST /api/moderation/check` - Moderate content for the caller
 *
 * ## Admin
 * - `GET|PATCH /api/admin/moderation/config` - Read / merge-update config
 * - `GET /api/admin/moderation/queue` - List review items
 * - `GET /api/admin/moderation/queue/{id}` - Get one review item
 * - `POST /api/admin/moderation/queue/{id}/resolve` - Approve or reject
 * - `GET|PUT /api/admin/moderation/users/{user_id}` - User block state
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::backend::middleware::auth::auth_middleware;
use crate::backend::moderation::handlers::{
    check_content, get_config, get_queue_item, get_user_status, list_queue, resolve_queue_item,
    set_user_status, update_config,
};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// Every route added here requires a bearer token; the auth middleware is
/// applied with `route_layer`, so unknown paths still reach the fallback.
/// Admin routes additionally check the `admin` role in their extractor.
pub fn configure_api_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .route("/api/moderation/check", post(check_content))
        .route(
            "/api/admin/moderation/config",
            get(get_config).patch(update_config),
        )
        .route("/api/admin/moderation/queue", get(list_queue))
        .route("/api/admin/moderation/queue/{id}", get(get_queue_item))
        .route(
            "/api/admin/moderation/queue/{id}/resolve",
            post(resolve_queue_item),
        )
        .route(
            "/api/admin/moderation/users/{user_id}",
            get(get_user_status).put(set_user_status),
        )
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    router.merge(api)
}
