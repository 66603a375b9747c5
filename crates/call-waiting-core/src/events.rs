//! Carrier configuration change notifications
//!
//! The controller acquires a subscription on [`CarrierConfigNotifier`] when
//! terminal-based call waiting becomes supported and releases it when support
//! is withdrawn. Events are delivered to a [`CarrierConfigListener`]; the
//! per-phone service uses a [`ChannelForwarder`] so that events land on the
//! same queue as user requests.
//!
//! ```rust
//! use call_waiting_core::events::{
//!     CarrierConfigBroadcaster, CarrierConfigChanged, CarrierConfigNotifier, ChannelForwarder,
//! };
//! use call_waiting_core::types::PhoneId;
//! use std::sync::Arc;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<CarrierConfigChanged>();
//! let broadcaster = CarrierConfigBroadcaster::new();
//! let id = broadcaster.subscribe(Arc::new(ChannelForwarder::new(&tx)));
//!
//! broadcaster.notify(CarrierConfigChanged::for_slot(PhoneId(0)));
//! assert_eq!(rx.try_recv().unwrap().slot_index, PhoneId(0));
//!
//! assert!(broadcaster.unsubscribe(id));
//! ```

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::types::PhoneId;

/// Carrier configuration changed for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierConfigChanged {
    /// Slot whose configuration changed; [`PhoneId::INVALID`] when unknown
    pub slot_index: PhoneId,
}

impl CarrierConfigChanged {
    pub fn for_slot(slot_index: PhoneId) -> Self {
        Self { slot_index }
    }
}

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receives carrier configuration change events
pub trait CarrierConfigListener: Send + Sync {
    fn on_carrier_config_changed(&self, event: CarrierConfigChanged);
}

/// Source of carrier configuration change events
pub trait CarrierConfigNotifier: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn CarrierConfigListener>) -> ListenerId;

    /// Returns false when `id` was not registered
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Fan-out notifier delivering each event to every registered listener
#[derive(Default)]
pub struct CarrierConfigBroadcaster {
    listeners: DashMap<ListenerId, Arc<dyn CarrierConfigListener>>,
}

impl CarrierConfigBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to all listeners
    pub fn notify(&self, event: CarrierConfigChanged) {
        // Snapshot first so listeners may (un)subscribe from inside the callback
        let listeners: Vec<_> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        debug!(
            target: "call_waiting",
            "Carrier config changed for slot {}, notifying {} listeners",
            event.slot_index,
            listeners.len()
        );

        for listener in listeners {
            listener.on_carrier_config_changed(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl CarrierConfigNotifier for CarrierConfigBroadcaster {
    fn subscribe(&self, listener: Arc<dyn CarrierConfigListener>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }
}

impl fmt::Debug for CarrierConfigBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierConfigBroadcaster")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Listener that forwards events into an mpsc channel
///
/// Holds only a weak sender: a registered forwarder does not keep the
/// receiving side's queue open once every other sender is gone.
pub struct ChannelForwarder<T = CarrierConfigChanged> {
    tx: mpsc::WeakUnboundedSender<T>,
}

impl<T> ChannelForwarder<T> {
    pub fn new(tx: &mpsc::UnboundedSender<T>) -> Self {
        Self { tx: tx.downgrade() }
    }
}

impl<T> CarrierConfigListener for ChannelForwarder<T>
where
    T: From<CarrierConfigChanged> + Send + 'static,
{
    fn on_carrier_config_changed(&self, event: CarrierConfigChanged) {
        let delivered = match self.tx.upgrade() {
            Some(tx) => tx.send(T::from(event)).is_ok(),
            None => false,
        };
        if !delivered {
            debug!(target: "call_waiting", "Dropping carrier config event for closed queue");
        }
    }
}

impl<T> fmt::Debug for ChannelForwarder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelForwarder").finish_non_exhaustive()
    }
}
