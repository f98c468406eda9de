//! Keyed record storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{OfficeError, OfficeResult};

/// Ordered in-memory table of records keyed by id.
///
/// Ordered so that listings and snapshots are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Ord + Deserialize<'de>, V: Deserialize<'de>"
))]
pub struct Table<K: Ord, V> {
    rows: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Ord + Copy + core::fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.rows.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.rows.get_mut(key)
    }

    /// Like [`Table::get`], failing with `NotFound` for a missing key.
    pub fn require(&self, key: &K, entity: &'static str) -> OfficeResult<&V> {
        self.rows
            .get(key)
            .ok_or_else(|| OfficeError::not_found(entity, key))
    }

    pub fn require_mut(&mut self, key: &K, entity: &'static str) -> OfficeResult<&mut V> {
        self.rows
            .get_mut(key)
            .ok_or_else(|| OfficeError::not_found(entity, key))
    }

    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        self.rows.insert(key, value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.rows.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.rows.values_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.rows.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_core::OrderId;

    #[test]
    fn require_reports_entity_and_id() {
        let table: Table<OrderId, String> = Table::new();
        let id = OrderId::new();
        match table.require(&id, "order") {
            Err(OfficeError::NotFound { entity, id: found }) => {
                assert_eq!(entity, "order");
                assert_eq!(found, id.to_string());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_through_json_keyed_by_id() {
        let mut table: Table<OrderId, u32> = Table::new();
        let id = OrderId::new();
        table.upsert(id, 7);
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains(&id.to_string()));
        let back: Table<OrderId, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&id), Some(&7));
    }
}
