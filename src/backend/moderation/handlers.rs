/**
 * Moderation HTTP Handlers
 *
 * Axum handlers for the moderation API. The caller's identity always comes
 * from the bearer token (`AuthUser` / `AdminUser`), never from the request
 * body.
 *
 * # Routes
 *
 * - `POST /api/moderation/check` - moderate content for the calling user
 * - `GET|PATCH /api/admin/moderation/config` - read / merge-update config
 * - `GET /api/admin/moderation/queue` - list review items
 * - `GET /api/admin/moderation/queue/{id}` - one review item
 * - `POST /api/admin/moderation/queue/{id}/resolve` - approve or reject
 * - `GET|PUT /api/admin/moderation/users/{userId}` - user block state
 */

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use super::orchestrator::{ModerationRequest, ModerationService};
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::{AdminUser, AuthUser};
use crate::backend::middleware::extract::{ApiJson, ApiPath, ApiQuery};
use crate::shared::moderation::{
    CheckContentRequest, ListQueueQuery, ListQueueResponse, ModerationConfig,
    ModerationConfigPatch, ModerationQueueItem, ModerationResult, ResolveQueueItemRequest,
    SetUserBlockRequest, UserModerationState,
};

/// Moderate a piece of content for the authenticated user
pub async fn check_content(
    State(service): State<Arc<ModerationService>>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CheckContentRequest>,
) -> Result<Json<ModerationResult>, BackendError> {
    let request = ModerationRequest::from_check(body, user.user_id, user.email)?;
    let result = service.check_content(request).await?;
    Ok(Json(result))
}

pub async fn get_config(
    State(service): State<Arc<ModerationService>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ModerationConfig>, BackendError> {
    Ok(Json(service.config_store().get_config().await?))
}

/// Merge a partial update into the moderation config
pub async fn update_config(
    State(service): State<Arc<ModerationService>>,
    AdminUser(admin): AdminUser,
    ApiJson(patch): ApiJson<ModerationConfigPatch>,
) -> Result<Json<ModerationConfig>, BackendError> {
    let config = service
        .config_store()
        .save_config(&patch, &admin.user_id)
        .await?;
    Ok(Json(config))
}

pub async fn list_queue(
    State(service): State<Arc<ModerationService>>,
    AdminUser(_admin): AdminUser,
    ApiQuery(query): ApiQuery<ListQueueQuery>,
) -> Result<Json<ListQueueResponse>, BackendError> {
    let items = service.queue().list(query).await?;
    Ok(Json(ListQueueResponse {
        count: items.len(),
        items,
    }))
}

pub async fn get_queue_item(
    State(service): State<Arc<ModerationService>>,
    AdminUser(_admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ModerationQueueItem>, BackendError> {
    Ok(Json(service.queue().get(id).await?))
}

/// Approve or reject a pending review item
pub async fn resolve_queue_item(
    State(service): State<Arc<ModerationService>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ResolveQueueItemRequest>,
) -> Result<Json<ModerationQueueItem>, BackendError> {
    let item = service.queue().resolve(id, &body, &admin.user_id).await?;
    Ok(Json(item))
}

pub async fn get_user_status(
    State(service): State<Arc<ModerationService>>,
    AdminUser(_admin): AdminUser,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<UserModerationState>, BackendError> {
    Ok(Json(service.users().get_block_status(&user_id).await?))
}

pub async fn set_user_status(
    State(service): State<Arc<ModerationService>>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(body): ApiJson<SetUserBlockRequest>,
) -> Result<Json<UserModerationState>, BackendError> {
    let state = service
        .users()
        .set_block_status(&user_id, body.blocked, body.reason, &admin.user_id)
        .await?;
    Ok(Json(state))
}
