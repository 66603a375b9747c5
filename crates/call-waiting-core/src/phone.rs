//! Owning phone contract

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::types::{CallWaitingState, PhoneId, SubscriptionId};

/// The phone a controller belongs to
///
/// The controller reads identity from it on every transition (the active
/// subscription may change at any time) and pushes each new state back to it.
pub trait PhoneHandle: Send + Sync {
    fn phone_id(&self) -> PhoneId;

    /// Currently active subscription, possibly [`SubscriptionId::INVALID`]
    fn sub_id(&self) -> SubscriptionId;

    /// One-way notification of a new terminal-based call waiting state
    fn set_terminal_based_call_waiting_status(&self, state: CallWaitingState);
}

/// Basic phone line with a swappable subscription
///
/// Records every status pushed by the controller so hosts can forward it
/// downstream (and tests can observe it).
#[derive(Debug)]
pub struct PhoneLine {
    phone_id: PhoneId,
    sub_id: AtomicI32,
    status_updates: Mutex<Vec<CallWaitingState>>,
}

impl PhoneLine {
    pub fn new(phone_id: PhoneId, sub_id: SubscriptionId) -> Self {
        Self {
            phone_id,
            sub_id: AtomicI32::new(sub_id.0),
            status_updates: Mutex::new(Vec::new()),
        }
    }

    /// Swap the active subscription (SIM change, hot swap, removal)
    pub fn set_sub_id(&self, sub_id: SubscriptionId) {
        self.sub_id.store(sub_id.0, Ordering::SeqCst);
    }

    /// Last state pushed by the controller
    pub fn terminal_based_call_waiting_status(&self) -> Option<CallWaitingState> {
        self.status_updates.lock().last().copied()
    }

    pub fn status_updates(&self) -> Vec<CallWaitingState> {
        self.status_updates.lock().clone()
    }
}

impl PhoneHandle for PhoneLine {
    fn phone_id(&self) -> PhoneId {
        self.phone_id
    }

    fn sub_id(&self) -> SubscriptionId {
        SubscriptionId(self.sub_id.load(Ordering::SeqCst))
    }

    fn set_terminal_based_call_waiting_status(&self, state: CallWaitingState) {
        self.status_updates.lock().push(state);
    }
}
