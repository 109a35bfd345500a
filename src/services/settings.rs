use crate::{
    models::settings::GeneralSettings,
    services::menu::SETTINGS,
    store::{document_body, DocumentStore, StoreError, Subscription},
};

/// Key of the site-wide settings document in the `settings` collection.
pub const GENERAL: &str = "general";

pub struct SettingsService;

impl SettingsService {
    /// Stored settings, or the built-in defaults when none were saved yet.
    pub async fn get(store: &dyn DocumentStore) -> Result<GeneralSettings, StoreError> {
        let Some(doc) = store.get(SETTINGS, GENERAL).await? else {
            return Ok(GeneralSettings::default());
        };
        Ok(serde_json::from_value(doc.data).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed general settings: {}", e);
            GeneralSettings::default()
        }))
    }

    pub async fn update(
        store: &dyn DocumentStore,
        settings: GeneralSettings,
    ) -> Result<GeneralSettings, StoreError> {
        let data = document_body(&settings).map_err(|e| StoreError::Rejected {
            collection: SETTINGS.into(),
            id: GENERAL.into(),
            reason: e.to_string(),
        })?;
        store.set(SETTINGS, GENERAL, data).await?;
        tracing::info!("General settings updated");
        Ok(settings)
    }

    /// Fires on every write to the `settings` collection, monthly menu links included.
    pub fn subscribe(store: &dyn DocumentStore) -> Subscription {
        store.subscribe(SETTINGS)
    }
}
