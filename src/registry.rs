//! SDK instance registry
//!
//! Keeps at most one live [`WeatherSdk`] per API key, so multiple parts of a
//! program sharing a key also share its cache, quota accounting, and polling
//! task. Plain struct, no global state: callers own the registry and its
//! lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::config::{SdkConfig, SdkMode};
use crate::error::SdkError;
use crate::sdk::WeatherSdk;

/// Registry of SDK instances keyed by API key
#[derive(Default)]
pub struct SdkRegistry {
    instances: Mutex<HashMap<String, Arc<WeatherSdk>>>,
}

impl SdkRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance registered for `api_key`, creating one on first
    /// acquisition
    ///
    /// A repeat acquisition with the same key returns the existing instance
    /// and ignores `config`; asking for a different `mode` than the instance
    /// was created with fails with `IllegalState` instead of silently handing
    /// out an instance that behaves differently than requested.
    pub fn acquire(
        &self,
        api_key: &str,
        mode: SdkMode,
        config: SdkConfig,
    ) -> Result<Arc<WeatherSdk>, SdkError> {
        let mut instances = self.instances.lock().expect("registry lock poisoned");

        if let Some(existing) = instances.get(api_key) {
            if existing.mode() != mode {
                return Err(SdkError::IllegalState(format!(
                    "SDK for this key already exists in {:?} mode",
                    existing.mode()
                )));
            }
            debug!(key = %existing.masked_api_key(), "Reusing registered SDK instance");
            return Ok(Arc::clone(existing));
        }

        let sdk = Arc::new(WeatherSdk::new(Some(api_key), mode, config)?);
        info!(key = %sdk.masked_api_key(), mode = ?mode, "SDK instance registered");
        instances.insert(api_key.to_string(), Arc::clone(&sdk));
        Ok(sdk)
    }

    /// Registers a pre-built instance under `api_key`
    ///
    /// Fails with `IllegalState` if the key is already registered. Exists so
    /// callers (and tests) can register instances built with custom providers.
    pub fn register(&self, api_key: &str, sdk: WeatherSdk) -> Result<Arc<WeatherSdk>, SdkError> {
        let mut instances = self.instances.lock().expect("registry lock poisoned");
        if instances.contains_key(api_key) {
            return Err(SdkError::IllegalState(
                "an SDK is already registered for this key".to_string(),
            ));
        }
        let sdk = Arc::new(sdk);
        instances.insert(api_key.to_string(), Arc::clone(&sdk));
        Ok(sdk)
    }

    /// Destroys and removes the instance for `api_key`
    ///
    /// Returns whether an instance was registered. Existing `Arc` handles
    /// stay alive but every call through them fails with `IllegalState`.
    pub async fn release(&self, api_key: &str) -> bool {
        let removed = {
            let mut instances = self.instances.lock().expect("registry lock poisoned");
            instances.remove(api_key)
        };

        match removed {
            Some(sdk) => {
                sdk.destroy().await;
                info!(key = %sdk.masked_api_key(), "SDK instance released");
                true
            }
            None => false,
        }
    }

    /// Whether an instance is registered for `api_key`
    pub fn contains(&self, api_key: &str) -> bool {
        self.instances
            .lock()
            .expect("registry lock poisoned")
            .contains_key(api_key)
    }

    /// Number of registered instances
    pub fn len(&self) -> usize {
        self.instances.lock().expect("registry lock poisoned").len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroys and removes every registered instance
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<WeatherSdk>> = {
            let mut instances = self.instances.lock().expect("registry lock poisoned");
            instances.drain().map(|(_, sdk)| sdk).collect()
        };

        for sdk in &drained {
            sdk.destroy().await;
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "All SDK instances released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SdkConfig {
        SdkConfig::default()
    }

    #[tokio::test]
    async fn test_same_key_returns_same_instance() {
        let registry = SdkRegistry::new();
        let first = registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");
        let second = registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_different_keys_get_distinct_instances() {
        let registry = SdkRegistry::new();
        let a = registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");
        let b = registry
            .acquire("key-b", SdkMode::OnDemand, config())
            .expect("acquire should succeed");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);

        registry.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_mode_mismatch_is_rejected() {
        let registry = SdkRegistry::new();
        registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");

        let result = registry.acquire("key-a", SdkMode::Polling, config());
        assert!(matches!(result, Err(SdkError::IllegalState(_))));

        registry.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_release_destroys_and_removes() {
        let registry = SdkRegistry::new();
        let sdk = registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");

        assert!(registry.release("key-a").await);
        assert!(!registry.contains("key-a"));
        assert!(sdk.is_destroyed(), "held handles see the destroyed state");

        // Releasing again reports nothing to do
        assert!(!registry.release("key-a").await);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_key() {
        let registry = SdkRegistry::new();
        registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");

        let extra = WeatherSdk::new(Some("key-a"), SdkMode::OnDemand, config())
            .expect("SDK creation should succeed");
        assert!(matches!(
            registry.register("key-a", extra),
            Err(SdkError::IllegalState(_))
        ));

        registry.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_shutdown_all_empties_the_registry() {
        let registry = SdkRegistry::new();
        let a = registry
            .acquire("key-a", SdkMode::OnDemand, config())
            .expect("acquire should succeed");
        let b = registry
            .acquire("key-b", SdkMode::Polling, config())
            .expect("acquire should succeed");

        registry.shutdown_all().await;
        assert!(registry.is_empty());
        assert!(a.is_destroyed());
        assert!(b.is_destroyed());
    }
}
