//! Terminal-based call waiting controller
//!
//! One controller exists per phone. It decides, from carrier configuration and
//! the user's last choice, whether call waiting is handled by the handset and
//! whether it is currently activated. Interrogate and set requests are answered
//! locally when the carrier does not require synchronization with the network.
//!
//! # States
//!
//! ```text
//!                  carrier config
//!  NotSupported ───────────────────▶ NotActivated ◀──────▶ Activated
//!       ▲                                  │    set_call_waiting   │
//!       └──────── support withdrawn ───────┴───────────────────────┘
//! ```
//!
//! Every transition is persisted and pushed to the owning phone before the
//! triggering call returns. A transition to the current state (same
//! subscription, state and sync preference) is dropped unless enforced.

use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::carrier_config::{CarrierConfig, CarrierConfigSource};
use crate::events::{CarrierConfigChanged, CarrierConfigListener, CarrierConfigNotifier, ListenerId};
use crate::phone::PhoneHandle;
use crate::store::{DEFAULT_PREFERENCE_GROUP, PreferenceKey, PreferenceStore};
use crate::types::{
    CallWaitingState, CallWaitingStatus, ServiceClass, SubscriptionId, SyncPreference,
};

/// One-shot response channel supplied by the requester
///
/// `None` means the caller is not interested in the response.
pub type ResponseSink<T> = Option<oneshot::Sender<T>>;

/// External services a controller is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub phone: Arc<dyn PhoneHandle>,
    pub store: Arc<dyn PreferenceStore>,
    pub carrier_configs: Arc<dyn CarrierConfigSource>,
    pub notifier: Arc<dyn CarrierConfigNotifier>,
}

/// Per-phone terminal-based call waiting state machine
pub struct CallWaitingController {
    collaborators: Collaborators,
    /// Registered with the notifier while terminal-based support is on
    listener: Arc<dyn CarrierConfigListener>,
    listener_id: Option<ListenerId>,
    preference_group: String,

    supported_by_ims_service: bool,
    valid_subscription: bool,
    /// The user's last setting
    state: CallWaitingState,
    sync_preference: SyncPreference,
    last_sub_id: SubscriptionId,
}

impl CallWaitingController {
    /// Create a controller in the `NotSupported` state
    ///
    /// Nothing is loaded and no listener is registered until
    /// [`set_terminal_based_call_waiting_supported(true)`](Self::set_terminal_based_call_waiting_supported).
    pub fn new(collaborators: Collaborators, listener: Arc<dyn CarrierConfigListener>) -> Self {
        Self {
            collaborators,
            listener,
            listener_id: None,
            preference_group: DEFAULT_PREFERENCE_GROUP.to_string(),
            supported_by_ims_service: false,
            valid_subscription: false,
            state: CallWaitingState::NotSupported,
            sync_preference: SyncPreference::None,
            last_sub_id: SubscriptionId::INVALID,
        }
    }

    /// Use a different preference group for persistence
    pub fn with_preference_group(mut self, group: impl Into<String>) -> Self {
        self.preference_group = group.into();
        self
    }

    pub fn phone(&self) -> &Arc<dyn PhoneHandle> {
        &self.collaborators.phone
    }

    pub fn sync_preference(&self) -> SyncPreference {
        self.sync_preference
    }

    pub fn is_supported_by_ims_service(&self) -> bool {
        self.supported_by_ims_service
    }

    /// True while subscribed to carrier configuration changes
    pub fn is_listening(&self) -> bool {
        self.listener_id.is_some()
    }

    /// Cached user setting, gated on a valid subscription
    pub fn terminal_based_call_waiting_state(&self) -> CallWaitingState {
        if !self.valid_subscription {
            return CallWaitingState::NotSupported;
        }
        self.state
    }

    /// Serve an interrogation of the call waiting service
    ///
    /// Returns true when the request was answered locally, in which case
    /// `on_complete` receives the current status.
    pub fn get_call_waiting(&self, on_complete: ResponseSink<CallWaitingStatus>) -> bool {
        if self.state == CallWaitingState::NotSupported {
            return false;
        }

        info!(target: "call_waiting", "Answering call waiting interrogation locally, state={}", self.state);

        if self.sync_preference.is_local() {
            send_response(on_complete, CallWaitingStatus::from_state(self.state));
            return true;
        }

        false
    }

    /// Serve a request to activate or deactivate call waiting
    ///
    /// Only voice call waiting is controlled here; a `service_class` without
    /// the voice bit is rejected and leaves the state untouched.
    pub fn set_call_waiting(
        &mut self,
        enable: bool,
        service_class: ServiceClass,
        on_complete: ResponseSink<()>,
    ) -> bool {
        if self.state == CallWaitingState::NotSupported {
            return false;
        }

        if !service_class.contains(ServiceClass::VOICE) {
            return false;
        }

        info!(
            target: "call_waiting",
            "Set call waiting enable={}, service_class={}",
            enable,
            service_class.bits()
        );

        if self.sync_preference.is_local() {
            self.update_state(CallWaitingState::from_enabled(enable));
            send_response(on_complete, ());
            return true;
        }

        false
    }

    /// Handle a carrier configuration change broadcast
    pub fn on_carrier_config_changed(&mut self, event: CarrierConfigChanged) {
        if !event.slot_index.is_valid() {
            error!(
                target: "call_waiting",
                "Carrier config changed with invalid slot index {}",
                event.slot_index
            );
            return;
        }

        if event.slot_index != self.collaborators.phone.phone_id() {
            return;
        }

        self.reevaluate_carrier_config();
    }

    fn reevaluate_carrier_config(&mut self) {
        let sub_id = self.collaborators.phone.sub_id();
        if !sub_id.is_valid() {
            info!(target: "call_waiting", "Carrier config changed but subscription {} is invalid", sub_id);
            self.valid_subscription = false;
            return;
        }

        let config = self.collaborators.carrier_configs.config_for_subscription(sub_id);
        self.update_carrier_config(sub_id, config.as_ref(), false);
    }

    /// Apply a carrier bundle for `sub_id`
    ///
    /// `enforced` discards the saved state in favour of the carrier default
    /// and forces a write even when nothing changed.
    pub fn update_carrier_config(
        &mut self,
        sub_id: SubscriptionId,
        config: Option<&CarrierConfig>,
        enforced: bool,
    ) {
        self.valid_subscription = true;

        let Some(config) = config else {
            return;
        };

        let sync_preference = config.sync_preference();
        let default_state = config.default_state();
        let saved_state = self.saved_state(sub_id);

        debug!(
            target: "call_waiting",
            "Carrier config phone_id={}, sub_id={}, supported={}, sync={:?}, default={}, saved={}",
            self.collaborators.phone.phone_id(),
            sub_id,
            config.supports_terminal_based_call_waiting(),
            sync_preference,
            default_state,
            saved_state
        );

        let desired_state = merge_states(default_state, saved_state, enforced);

        self.update_state_with(desired_state, sync_preference, enforced);
    }

    /// Turn terminal-based call waiting support on or off
    pub fn set_terminal_based_call_waiting_supported(&mut self, supported: bool) {
        if self.supported_by_ims_service == supported {
            return;
        }

        info!(target: "call_waiting", "Terminal-based call waiting supported={}", supported);

        self.supported_by_ims_service = supported;

        if supported {
            self.initialize();
            self.reevaluate_carrier_config();
        } else {
            self.stop_listening();
            self.update_state(CallWaitingState::NotSupported);
        }
    }

    fn initialize(&mut self) {
        if self.listener_id.is_none() {
            self.listener_id = Some(self.collaborators.notifier.subscribe(self.listener.clone()));
        }

        let phone_id = self.collaborators.phone.phone_id();
        let sub_id = self.collaborators.phone.sub_id();
        let store = &self.collaborators.store;
        let group = self.preference_group.as_str();

        self.last_sub_id = SubscriptionId(store.get_int(
            group,
            PreferenceKey::last_sub_id(phone_id),
            SubscriptionId::INVALID.0,
        ));
        self.state = CallWaitingState::from_code(store.get_int(
            group,
            PreferenceKey::state(sub_id),
            CallWaitingState::NotSupported.code(),
        ));
        self.sync_preference = SyncPreference::from_code(store.get_int(
            group,
            PreferenceKey::cs_sync(phone_id),
            SyncPreference::None.code(),
        ));

        info!(
            target: "call_waiting",
            "Loaded call waiting record phone_id={}, last_sub_id={}, sub_id={}, state={}, sync={:?}",
            phone_id,
            self.last_sub_id,
            sub_id,
            self.state,
            self.sync_preference
        );
    }

    fn stop_listening(&mut self) {
        if let Some(id) = self.listener_id.take() {
            if !self.collaborators.notifier.unsubscribe(id) {
                warn!(target: "call_waiting", "Listener {} was already unregistered", id);
            }
        }
    }

    fn update_state(&mut self, state: CallWaitingState) {
        self.update_state_with(state, self.sync_preference, false);
    }

    fn update_state_with(
        &mut self,
        state: CallWaitingState,
        sync_preference: SyncPreference,
        enforced: bool,
    ) {
        let sub_id = self.collaborators.phone.sub_id();

        if self.last_sub_id == sub_id
            && self.state == state
            && self.sync_preference == sync_preference
            && !enforced
        {
            return;
        }

        let phone_id = self.collaborators.phone.phone_id();

        info!(
            target: "call_waiting",
            "Call waiting state change phone_id={}, sub_id={}, state={}, sync={:?}, enforced={}",
            phone_id,
            sub_id,
            state,
            sync_preference,
            enforced
        );

        let entries = [
            (PreferenceKey::last_sub_id(phone_id), sub_id.0),
            (PreferenceKey::state(sub_id), state.code()),
            (PreferenceKey::cs_sync(phone_id), sync_preference.code()),
        ];
        if let Err(e) = self
            .collaborators
            .store
            .put_ints(&self.preference_group, &entries)
        {
            warn!(target: "call_waiting", "Failed to persist call waiting state: {}", e);
        }

        self.state = state;
        self.last_sub_id = sub_id;
        self.sync_preference = sync_preference;

        self.collaborators
            .phone
            .set_terminal_based_call_waiting_status(self.state);
    }

    fn saved_state(&self, sub_id: SubscriptionId) -> CallWaitingState {
        let state = CallWaitingState::from_code(self.collaborators.store.get_int(
            &self.preference_group,
            PreferenceKey::state(sub_id),
            CallWaitingState::NotSupported.code(),
        ));

        info!(target: "call_waiting", "Saved call waiting state sub_id={}, state={}", sub_id, state);

        state
    }
}

impl Drop for CallWaitingController {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

/// Merge the carrier default with the saved user setting
///
/// A saved `NotSupported` is indistinguishable from "never set" and yields
/// the carrier default.
pub fn merge_states(
    default_state: CallWaitingState,
    saved_state: CallWaitingState,
    enforced: bool,
) -> CallWaitingState {
    if enforced {
        default_state
    } else if default_state == CallWaitingState::NotSupported {
        CallWaitingState::NotSupported
    } else if saved_state == CallWaitingState::NotSupported {
        default_state
    } else {
        saved_state
    }
}

fn send_response<T>(on_complete: ResponseSink<T>, value: T) {
    if let Some(tx) = on_complete {
        // The requester may have given up waiting
        let _ = tx.send(value);
    }
}
