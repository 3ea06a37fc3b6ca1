/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including store selection, external client construction and route
 * configuration.
 *
 * # Initialization Process
 *
 * 1. Connect to PostgreSQL if configured and apply migrations; otherwise use
 *    the in-memory document store
 * 2. Build the external service clients that are configured
 * 3. Assemble the moderation service and application state
 * 4. Create and configure the router
 *
 * Nothing here prevents startup: a missing or broken dependency is logged
 * and the server continues without it.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::auth::sessions::JwtKeys;
use crate::backend::moderation::{
    AiClassifier, ConfigStore, ContentClassifier, ContentSafetyClient, LinkReputation,
    LinkSafetyChecker, ModerationQueue, ModerationService, UserModerationStore, VirusTotalClient,
};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::memory::MemoryDocumentStore;
use crate::backend::store::postgres::PgDocumentStore;
use crate::backend::store::DocumentStore;

/// Create and configure the Axum application
pub async fn create_app(config: &ServerConfig) -> Router<()> {
    tracing::info!("Initializing townsquare moderation server");

    let app_state = build_state(config).await;
    let app = create_router(app_state);

    tracing::info!("Router configured");
    app
}

/// Build the application state for `config`
pub async fn build_state(config: &ServerConfig) -> AppState {
    let db_pool = load_database(config.database_url.as_deref()).await;

    let store: Arc<dyn DocumentStore> = match db_pool {
        Some(pool) => {
            let store = PgDocumentStore::new(pool);
            tracing::info!("Running database migrations...");
            match store.migrate().await {
                Ok(()) => tracing::info!("Database migrations completed successfully"),
                Err(e) => {
                    tracing::error!("Failed to run database migrations: {}", e);
                    tracing::warn!("Continuing without migrations - database might not be up to date");
                }
            }
            Arc::new(store)
        }
        None => Arc::new(MemoryDocumentStore::new()),
    };

    AppState {
        moderation: Arc::new(build_moderation_service(config, store)),
        auth: JwtKeys::from_secret(&config.jwt_secret),
    }
}

/// Wire the moderation pipeline on top of `store`
pub fn build_moderation_service(
    config: &ServerConfig,
    store: Arc<dyn DocumentStore>,
) -> ModerationService {
    let reputation: Option<Arc<dyn LinkReputation>> = config
        .link_reputation
        .clone()
        .and_then(|service| match VirusTotalClient::new(service) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn LinkReputation>),
            Err(e) => {
                tracing::error!("Failed to build link reputation client: {}", e);
                None
            }
        });
    if reputation.is_none() {
        tracing::warn!("Link reputation service not configured; tier 2 will fail open");
    }

    let classifier: Option<Arc<dyn ContentClassifier>> = config
        .content_safety
        .clone()
        .and_then(|service| match ContentSafetyClient::new(service) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn ContentClassifier>),
            Err(e) => {
                tracing::error!("Failed to build content safety client: {}", e);
                None
            }
        });
    if classifier.is_none() {
        tracing::warn!("Content safety service not configured; tier 3 will fail open");
    }

    ModerationService::new(
        Arc::new(ConfigStore::new(store.clone())),
        Arc::new(ModerationQueue::new(store.clone())),
        Arc::new(UserModerationStore::new(store)),
        Arc::new(LinkSafetyChecker::new(
            reputation,
            config.fallback,
            config.link_check,
        )),
        Arc::new(AiClassifier::new(classifier, config.fallback)),
    )
}
