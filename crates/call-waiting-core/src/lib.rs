//! # Call-Waiting-Core
//!
//! Terminal-based call waiting for a phone line.
//!
//! Some carriers let the handset, rather than the network, own the call
//! waiting supplementary service. This crate tracks whether that is the case
//! for the line's active subscription, remembers the user's choice across
//! restarts and SIM swaps, and answers interrogate/set requests locally when
//! the carrier does not require synchronization with the network.
//!
//! This crate provides:
//! - [`CallWaitingController`], the per-phone state machine
//! - Preference stores (in-memory and JSON file) for the persisted record
//! - A carrier config change broadcaster and listener plumbing
//! - [`CallWaitingService`], which runs a controller on its own tokio task
//! - Configuration and `tracing` setup
//!
//! ## Architecture
//!
//! ```text
//!  carrier config ──▶ CarrierConfigBroadcaster ──▶ ChannelForwarder ─┐
//!                                                                    ▼
//!  CallWaitingHandle ──────────────── commands ──────────────▶ per-phone task
//!                                                                    │
//!                                                        CallWaitingController
//!                                                      │         │          │
//!                                        PreferenceStore  PhoneHandle  CarrierConfigSource
//! ```

pub mod error;
pub mod types;
pub mod carrier_config;
pub mod store;
pub mod events;
pub mod phone;
pub mod controller;
pub mod service;
pub mod config;
pub mod logging;

pub use error::{CallWaitingError, Result};
pub use types::{
    CallWaitingState, CallWaitingStatus, PhoneId, ServiceClass, SubscriptionId, SyncPreference,
};
pub use carrier_config::{CarrierConfig, CarrierConfigSource, InMemoryCarrierConfigSource};
pub use store::{FilePreferenceStore, MemoryPreferenceStore, PreferenceKey, PreferenceStore};
pub use events::{
    CarrierConfigBroadcaster, CarrierConfigChanged, CarrierConfigListener, CarrierConfigNotifier,
    ChannelForwarder, ListenerId,
};
pub use phone::{PhoneHandle, PhoneLine};
pub use controller::{CallWaitingController, Collaborators, ResponseSink};
pub use service::{CallWaitingHandle, CallWaitingService};
pub use crate::config::{CallWaitingConfig, LogSettings};

/// Re-export of common types for easier use
pub mod prelude {
    pub use crate::{
        CallWaitingConfig, CallWaitingController, CallWaitingError, CallWaitingHandle,
        CallWaitingService, CallWaitingState, CallWaitingStatus, CarrierConfig,
        CarrierConfigBroadcaster, CarrierConfigChanged, CarrierConfigNotifier,
        CarrierConfigSource, Collaborators, InMemoryCarrierConfigSource, MemoryPreferenceStore,
        PhoneHandle, PhoneId, PhoneLine, PreferenceStore, Result, ServiceClass, SubscriptionId,
        SyncPreference,
    };
}
