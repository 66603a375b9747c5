//! In-memory preference store

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{PreferenceKey, PreferenceStore};
use crate::error::Result;

/// DashMap-backed store, shared freely between phones
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: DashMap<(String, PreferenceKey), i32>,
    batches: AtomicU64,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put_ints` batches applied so far
    pub fn batches_written(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    /// Raw lookup without a default
    pub fn get(&self, group: &str, key: PreferenceKey) -> Option<i32> {
        self.values
            .get(&(group.to_string(), key))
            .map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_int(&self, group: &str, key: PreferenceKey, default: i32) -> i32 {
        self.get(group, key).unwrap_or(default)
    }

    fn put_ints(&self, group: &str, entries: &[(PreferenceKey, i32)]) -> Result<()> {
        for (key, value) in entries {
            self.values.insert((group.to_string(), *key), *value);
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PhoneId, SubscriptionId};

    #[test]
    fn test_default_when_absent() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.get_int("g", PreferenceKey::state(SubscriptionId(1)), -1), -1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_batch_write_and_groups() {
        let store = MemoryPreferenceStore::new();
        store
            .put_ints(
                "g",
                &[
                    (PreferenceKey::last_sub_id(PhoneId(0)), 4),
                    (PreferenceKey::state(SubscriptionId(4)), 1),
                ],
            )
            .unwrap();
        store
            .put_ints("other", &[(PreferenceKey::state(SubscriptionId(4)), 0)])
            .unwrap();

        assert_eq!(store.batches_written(), 2);
        assert_eq!(store.get_int("g", PreferenceKey::state(SubscriptionId(4)), -1), 1);
        assert_eq!(store.get_int("other", PreferenceKey::state(SubscriptionId(4)), -1), 0);
        assert_eq!(store.get("other", PreferenceKey::last_sub_id(PhoneId(0))), None);
        assert_eq!(store.len(), 3);
    }
}
