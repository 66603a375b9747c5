//! Carrier configuration consumed by the controller
//!
//! A [`CarrierConfig`] is the subset of a carrier bundle that decides whether
//! the handset may resolve call waiting locally. Bundles are plain serde
//! structs so they can be loaded from JSON or TOML fixtures:
//!
//! ```rust
//! use call_waiting_core::carrier_config::CarrierConfig;
//! use call_waiting_core::types::{CallWaitingState, SyncPreference};
//!
//! let config: CarrierConfig = serde_json::from_str(r#"{
//!     "ut_terminal_based_services": [0],
//!     "terminal_based_call_waiting_default_enabled": true
//! }"#).unwrap();
//!
//! assert_eq!(config.default_state(), CallWaitingState::Activated);
//! assert_eq!(config.sync_preference(), SyncPreference::None);
//! ```

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::types::{CallWaitingState, SubscriptionId, SyncPreference};

/// Supplementary service code for call waiting in the terminal-based list
pub const SUPPLEMENTARY_SERVICE_CW: i32 = 0;

/// Call waiting related carrier configuration for one subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    /// Supplementary services the carrier lets the terminal handle
    pub ut_terminal_based_services: Option<Vec<i32>>,
    /// Raw [`SyncPreference`] code; absent means no synchronization
    pub terminal_based_call_waiting_sync_type: Option<i32>,
    /// Whether call waiting starts out activated when first supported
    pub terminal_based_call_waiting_default_enabled: Option<bool>,
}

impl CarrierConfig {
    /// Bundle that offers terminal-based call waiting
    pub fn terminal_based(default_enabled: bool) -> Self {
        Self {
            ut_terminal_based_services: Some(vec![SUPPLEMENTARY_SERVICE_CW]),
            terminal_based_call_waiting_sync_type: None,
            terminal_based_call_waiting_default_enabled: Some(default_enabled),
        }
    }

    pub fn with_sync_preference(mut self, sync: SyncPreference) -> Self {
        self.terminal_based_call_waiting_sync_type = Some(sync.code());
        self
    }

    pub fn supports_terminal_based_call_waiting(&self) -> bool {
        self.ut_terminal_based_services
            .as_deref()
            .map(|services| services.contains(&SUPPLEMENTARY_SERVICE_CW))
            .unwrap_or(false)
    }

    pub fn sync_preference(&self) -> SyncPreference {
        self.terminal_based_call_waiting_sync_type
            .map(SyncPreference::from_code)
            .unwrap_or_default()
    }

    /// State the carrier wants a fresh subscription to start in
    pub fn default_state(&self) -> CallWaitingState {
        if !self.supports_terminal_based_call_waiting() {
            return CallWaitingState::NotSupported;
        }
        CallWaitingState::from_enabled(
            self.terminal_based_call_waiting_default_enabled.unwrap_or(false),
        )
    }
}

/// Supplies carrier configuration per subscription
pub trait CarrierConfigSource: Send + Sync {
    /// Returns `None` when no bundle is loaded for `sub_id`
    fn config_for_subscription(&self, sub_id: SubscriptionId) -> Option<CarrierConfig>;
}

/// In-memory carrier configuration source
#[derive(Debug, Default)]
pub struct InMemoryCarrierConfigSource {
    configs: DashMap<SubscriptionId, CarrierConfig>,
}

impl InMemoryCarrierConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the bundle for a subscription
    pub fn set_config(&self, sub_id: SubscriptionId, config: CarrierConfig) {
        self.configs.insert(sub_id, config);
    }

    pub fn remove_config(&self, sub_id: SubscriptionId) -> Option<CarrierConfig> {
        self.configs.remove(&sub_id).map(|(_, config)| config)
    }
}

impl CarrierConfigSource for InMemoryCarrierConfigSource {
    fn config_for_subscription(&self, sub_id: SubscriptionId) -> Option<CarrierConfig> {
        self.configs.get(&sub_id).map(|entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_service_list_means_not_supported() {
        let config = CarrierConfig {
            terminal_based_call_waiting_default_enabled: Some(true),
            ..Default::default()
        };
        assert!(!config.supports_terminal_based_call_waiting());
        assert_eq!(config.default_state(), CallWaitingState::NotSupported);
    }

    #[test]
    fn test_service_list_without_cw() {
        let config = CarrierConfig {
            ut_terminal_based_services: Some(vec![1, 2, 3]),
            terminal_based_call_waiting_default_enabled: Some(true),
            ..Default::default()
        };
        assert_eq!(config.default_state(), CallWaitingState::NotSupported);
    }

    #[test]
    fn test_default_enabled_flag() {
        assert_eq!(
            CarrierConfig::terminal_based(false).default_state(),
            CallWaitingState::NotActivated
        );
        assert_eq!(
            CarrierConfig::terminal_based(true).default_state(),
            CallWaitingState::Activated
        );
        let no_flag = CarrierConfig {
            ut_terminal_based_services: Some(vec![5, SUPPLEMENTARY_SERVICE_CW]),
            ..Default::default()
        };
        assert_eq!(no_flag.default_state(), CallWaitingState::NotActivated);
    }

    #[test]
    fn test_sync_type_parsing() {
        let config = CarrierConfig::terminal_based(true)
            .with_sync_preference(SyncPreference::FirstPowerUp);
        assert_eq!(config.sync_preference(), SyncPreference::FirstPowerUp);
        assert_eq!(CarrierConfig::default().sync_preference(), SyncPreference::None);
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemoryCarrierConfigSource::new();
        assert!(source.config_for_subscription(SubscriptionId(3)).is_none());

        source.set_config(SubscriptionId(3), CarrierConfig::terminal_based(true));
        assert_eq!(
            source.config_for_subscription(SubscriptionId(3)),
            Some(CarrierConfig::terminal_based(true))
        );

        assert!(source.remove_config(SubscriptionId(3)).is_some());
        assert!(source.config_for_subscription(SubscriptionId(3)).is_none());
    }
}
