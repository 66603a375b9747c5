//! Core types for call-waiting-core

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a phone slot (one per logical line)
///
/// Negative values mean "no slot". Events carrying such an index are
/// dropped by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhoneId(pub i32);

impl PhoneId {
    /// Sentinel for "no slot"
    pub const INVALID: PhoneId = PhoneId(-1);

    pub fn is_valid(self) -> bool {
        self.0 > Self::INVALID.0
    }
}

impl fmt::Display for PhoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a subscription (SIM profile) owned by a phone slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub i32);

impl SubscriptionId {
    /// Sentinel for "no active subscription"
    pub const INVALID: SubscriptionId = SubscriptionId(-1);

    /// A subscription id is valid when it is greater than the sentinel
    pub fn is_valid(self) -> bool {
        self.0 > Self::INVALID.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal-based call waiting state of a line
///
/// ```rust
/// use call_waiting_core::types::CallWaitingState;
///
/// assert_eq!(CallWaitingState::from_code(1), CallWaitingState::Activated);
/// assert_eq!(CallWaitingState::NotSupported.code(), -1);
/// // Garbage from the store is treated as "not supported"
/// assert_eq!(CallWaitingState::from_code(42), CallWaitingState::NotSupported);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallWaitingState {
    /// The carrier does not offer terminal-based call waiting
    NotSupported,
    /// Supported, but the user has it switched off
    NotActivated,
    /// Supported and switched on
    Activated,
}

impl CallWaitingState {
    /// Integer code used in the preference store
    pub fn code(self) -> i32 {
        match self {
            CallWaitingState::NotSupported => -1,
            CallWaitingState::NotActivated => 0,
            CallWaitingState::Activated => 1,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => CallWaitingState::NotActivated,
            1 => CallWaitingState::Activated,
            _ => CallWaitingState::NotSupported,
        }
    }

    /// State matching a user's enable/disable request
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            CallWaitingState::Activated
        } else {
            CallWaitingState::NotActivated
        }
    }

    pub fn is_supported(self) -> bool {
        self != CallWaitingState::NotSupported
    }
}

impl Default for CallWaitingState {
    fn default() -> Self {
        CallWaitingState::NotSupported
    }
}

impl fmt::Display for CallWaitingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallWaitingState::NotSupported => "not-supported",
            CallWaitingState::NotActivated => "not-activated",
            CallWaitingState::Activated => "activated",
        };
        f.write_str(name)
    }
}

/// How the locally held state must track the network-side setting
///
/// Only [`SyncPreference::None`] is resolved by the controller. The other
/// modes are stored and compared so that a change of mode is persisted, but
/// requests made under them are left to the network path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncPreference {
    /// Resolve entirely on the handset
    None,
    /// Push every user change to the network
    UserChange,
    /// Sync once with the network on first power-up
    FirstPowerUp,
    /// Sync on the first user change after power-up
    FirstChange,
    /// Sync only while registered over IMS
    ImsOnly,
    /// A mode this crate does not know about, kept verbatim
    Other(i32),
}

impl SyncPreference {
    pub fn code(self) -> i32 {
        match self {
            SyncPreference::None => 0,
            SyncPreference::UserChange => 1,
            SyncPreference::FirstPowerUp => 2,
            SyncPreference::FirstChange => 3,
            SyncPreference::ImsOnly => 4,
            SyncPreference::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => SyncPreference::None,
            1 => SyncPreference::UserChange,
            2 => SyncPreference::FirstPowerUp,
            3 => SyncPreference::FirstChange,
            4 => SyncPreference::ImsOnly,
            other => SyncPreference::Other(other),
        }
    }

    /// True when requests can be answered without the network
    pub fn is_local(self) -> bool {
        self == SyncPreference::None
    }
}

impl Default for SyncPreference {
    fn default() -> Self {
        SyncPreference::None
    }
}

/// Bitmask of telecom service classes a supplementary service applies to
///
/// ```rust
/// use call_waiting_core::types::ServiceClass;
///
/// let mask = ServiceClass::VOICE | ServiceClass::DATA;
/// assert!(mask.contains(ServiceClass::VOICE));
/// assert!(!ServiceClass::SMS.contains(ServiceClass::VOICE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ServiceClass(pub u32);

impl ServiceClass {
    pub const NONE: ServiceClass = ServiceClass(0);
    pub const VOICE: ServiceClass = ServiceClass(1 << 0);
    pub const DATA: ServiceClass = ServiceClass(1 << 1);
    pub const FAX: ServiceClass = ServiceClass(1 << 2);
    pub const SMS: ServiceClass = ServiceClass(1 << 3);
    pub const DATA_SYNC: ServiceClass = ServiceClass(1 << 4);
    pub const DATA_ASYNC: ServiceClass = ServiceClass(1 << 5);
    pub const PACKET: ServiceClass = ServiceClass(1 << 6);
    pub const PAD: ServiceClass = ServiceClass(1 << 7);

    pub fn bits(self) -> u32 {
        self.0
    }

    /// True when every bit of `other` is set in `self`
    pub fn contains(self, other: ServiceClass) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ServiceClass {
    type Output = ServiceClass;

    fn bitor(self, rhs: ServiceClass) -> ServiceClass {
        ServiceClass(self.0 | rhs.0)
    }
}

/// Answer to an interrogation of the call waiting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallWaitingStatus {
    pub state: CallWaitingState,
    /// [`ServiceClass::VOICE`] when activated, otherwise [`ServiceClass::NONE`]
    pub service_class: ServiceClass,
}

impl CallWaitingStatus {
    pub fn from_state(state: CallWaitingState) -> Self {
        let service_class = if state == CallWaitingState::Activated {
            ServiceClass::VOICE
        } else {
            ServiceClass::NONE
        };
        Self { state, service_class }
    }
}
