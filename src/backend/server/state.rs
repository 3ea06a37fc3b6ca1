/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The moderation service (pipeline, config store, queue, user state)
 * - The JWT keys used by the auth middleware
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`. Moderation
 * handlers take `State<Arc<ModerationService>>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::sessions::JwtKeys;
use crate::backend::moderation::ModerationService;

/// Application state shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Moderation pipeline and its persisted state
    pub moderation: Arc<ModerationService>,

    /// Token verification keys
    pub auth: JwtKeys,
}

impl FromRef<AppState> for Arc<ModerationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.moderation.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth.clone()
    }
}
