use log::{ info, warn };
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::llm::ProviderId;
use crate::models::settings::{ Credentials, Settings };
use crate::store::{ self, KeyValueStore, StoreError, SETTINGS_KEY };

/// Settings and credentials, hydrated once from the store and written back
/// as whole records on every save.
pub struct SettingsService {
    store: Arc<dyn KeyValueStore>,
    settings: RwLock<Settings>,
    credentials: RwLock<Credentials>,
}

impl SettingsService {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let settings = match store::load::<Settings>(store.as_ref(), SETTINGS_KEY).await {
            Ok(found) => found.unwrap_or_default(),
            Err(StoreError::Json(e)) => {
                warn!("Ignoring unreadable settings record: {}", e);
                Settings::default()
            }
            Err(e) => {
                return Err(e);
            }
        };

        let mut credentials = Credentials::new();
        for provider in ProviderId::ALL {
            if let Some(key) = store::load::<String>(store.as_ref(), provider.credential_key()).await? {
                credentials.set(provider, key);
            }
        }
        info!(
            "Settings loaded: provider={}, model={}, theme={}, keys configured for {:?}",
            settings.provider,
            settings.effective_model(),
            settings.theme,
            credentials.configured()
        );

        Ok(Self {
            store,
            settings: RwLock::new(settings),
            credentials: RwLock::new(credentials),
        })
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn save_settings(&self, settings: Settings) -> Result<(), StoreError> {
        let mut current = self.settings.write().await;
        store::save(self.store.as_ref(), SETTINGS_KEY, &settings).await?;
        *current = settings;
        Ok(())
    }

    /// Applies `change` to a copy of the current settings and saves it.
    pub async fn update_settings<F>(&self, change: F) -> Result<Settings, StoreError>
        where F: FnOnce(&mut Settings)
    {
        let mut current = self.settings.write().await;
        let mut next = current.clone();
        change(&mut next);
        store::save(self.store.as_ref(), SETTINGS_KEY, &next).await?;
        *current = next.clone();
        Ok(next)
    }

    pub async fn credentials(&self) -> Credentials {
        self.credentials.read().await.clone()
    }

    pub async fn api_key(&self, provider: ProviderId) -> Option<String> {
        self.credentials.read().await.get(provider).map(str::to_string)
    }

    /// Stores `key` for `provider`; an empty key clears it.
    pub async fn save_api_key(&self, provider: ProviderId, key: &str) -> Result<(), StoreError> {
        let mut credentials = self.credentials.write().await;
        store::save(self.store.as_ref(), provider.credential_key(), key.trim()).await?;
        credentials.set(provider, key.trim());
        info!("API key for {} {}", provider, if key.trim().is_empty() { "cleared" } else { "saved" });
        Ok(())
    }
}
