//! Durable preference storage for the controller record
//!
//! Values are integers grouped under a preference group name and addressed
//! by a structured [`PreferenceKey`] (`field`, `scope`), where the scope is a
//! phone slot or a subscription id depending on the field.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::types::{PhoneId, SubscriptionId};

pub mod file;
pub mod memory;

pub use file::FilePreferenceStore;
pub use memory::MemoryPreferenceStore;

/// Default preference group for terminal-based call waiting
pub const DEFAULT_PREFERENCE_GROUP: &str = "terminal_based_call_waiting";

/// Logical field of the persisted controller record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreferenceField {
    /// Last subscription owned by a phone slot, scoped by phone id
    #[serde(rename = "subId")]
    SubId,
    /// Call waiting state, scoped by subscription id
    #[serde(rename = "state")]
    State,
    /// Sync preference, scoped by phone id
    #[serde(rename = "cs_sync")]
    CsSync,
}

impl PreferenceField {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceField::SubId => "subId",
            PreferenceField::State => "state",
            PreferenceField::CsSync => "cs_sync",
        }
    }
}

/// Composite key of a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub field: PreferenceField,
    pub scope: i32,
}

impl PreferenceKey {
    pub fn new(field: PreferenceField, scope: i32) -> Self {
        Self { field, scope }
    }

    pub fn last_sub_id(phone_id: PhoneId) -> Self {
        Self::new(PreferenceField::SubId, phone_id.0)
    }

    pub fn state(sub_id: SubscriptionId) -> Self {
        Self::new(PreferenceField::State, sub_id.0)
    }

    pub fn cs_sync(phone_id: PhoneId) -> Self {
        Self::new(PreferenceField::CsSync, phone_id.0)
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.field.as_str(), self.scope)
    }
}

/// Integer key-value store namespaced by preference group
///
/// Writes must be visible to subsequent reads through the same store as soon
/// as `put_ints` returns `Ok`. A batch that fails leaves every value as it was.
pub trait PreferenceStore: Send + Sync {
    /// Read a value, falling back to `default` when absent
    fn get_int(&self, group: &str, key: PreferenceKey, default: i32) -> i32;

    /// Write a batch of values as one unit
    fn put_ints(&self, group: &str, entries: &[(PreferenceKey, i32)]) -> Result<()>;
}
