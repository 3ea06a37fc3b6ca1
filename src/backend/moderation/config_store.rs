/**
 * Moderation Config Store
 *
 * Owns the singleton `moderationConfig/global` document. The config is read
 * on every moderation call, so it is cached in memory behind a tokio
 * `RwLock`; admin updates write through to the store and refresh the cache.
 *
 * # First Access
 *
 * If no document exists yet, the default config is persisted and returned.
 * A stored document that no longer decodes is logged and replaced by the
 * defaults in memory (the stored copy is left for an admin to fix).
 */

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::error::ModerationError;
use crate::backend::store::{collections, DocumentStore, StoreError};
use crate::shared::moderation::{ModerationConfig, ModerationConfigPatch};

pub const CONFIG_DOCUMENT_ID: &str = "global";

pub struct ConfigStore {
    store: Arc<dyn DocumentStore>,
    cache: RwLock<Option<ModerationConfig>>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
        }
    }

    /// Current config, from cache when warm
    pub async fn get_config(&self) -> Result<ModerationConfig, ModerationError> {
        if let Some(config) = self.cache.read().await.as_ref() {
            return Ok(config.clone());
        }

        let config = self.load_or_create().await?;
        *self.cache.write().await = Some(config.clone());
        Ok(config)
    }

    /// Current config, or the defaults if the store cannot be read
    pub async fn get_config_or_default(&self) -> ModerationConfig {
        match self.get_config().await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load moderation config, using defaults");
                ModerationConfig::default()
            }
        }
    }

    /// Merge `patch` into the stored config and persist it.
    ///
    /// Validation happens before anything is written; an invalid patch
    /// leaves both the store and the cache untouched.
    pub async fn save_config(
        &self,
        patch: &ModerationConfigPatch,
        actor: &str,
    ) -> Result<ModerationConfig, ModerationError> {
        let existing = self
            .store
            .get(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID)
            .await?;
        let mut config = match &existing {
            Some(document) => decode_config(document.decode()),
            None => ModerationConfig::default(),
        };

        config.apply(patch)?;
        config.updated_at = Some(Utc::now());
        config.updated_by = Some(actor.to_string());

        let body = serde_json::to_value(&config).map_err(StoreError::from)?;
        match existing {
            Some(_) => {
                self.store
                    .replace(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID, body, None)
                    .await?;
            }
            None => self.create_or_replace(body).await?,
        }

        tracing::info!(actor, "Moderation config updated");
        *self.cache.write().await = Some(config.clone());
        Ok(config)
    }

    /// Drop the cached copy so the next read goes to the store
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn load_or_create(&self) -> Result<ModerationConfig, ModerationError> {
        if let Some(document) = self
            .store
            .get(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID)
            .await?
        {
            return Ok(decode_config(document.decode()));
        }

        tracing::info!("No moderation config stored, creating defaults");
        let config = ModerationConfig::default();
        let body = serde_json::to_value(&config).map_err(StoreError::from)?;
        match self
            .store
            .create(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID, body)
            .await
        {
            Ok(_) => Ok(config),
            // Another request created it first
            Err(StoreError::AlreadyExists { .. }) => {
                let document = self
                    .store
                    .get(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID)
                    .await?;
                Ok(document
                    .map(|document| decode_config(document.decode()))
                    .unwrap_or_default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_or_replace(&self, body: serde_json::Value) -> Result<(), StoreError> {
        match self
            .store
            .create(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID, body.clone())
            .await
        {
            Ok(_) => Ok(()),
            Err(StoreError::AlreadyExists { .. }) => self
                .store
                .replace(collections::MODERATION_CONFIG, CONFIG_DOCUMENT_ID, body, None)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        }
    }
}

fn decode_config(decoded: Result<ModerationConfig, StoreError>) -> ModerationConfig {
    match decoded {
        Ok(config) => config.sanitized(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored moderation config is malformed, using defaults");
            ModerationConfig::default()
        }
    }
}
