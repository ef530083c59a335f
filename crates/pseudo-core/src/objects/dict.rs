//! Dict heap objects: string-keyed mapping to `Value` (spec §3.2).
//!
//! Backed by `table::OpenTable`, the same open-addressed layout the globals
//! table uses. Iteration order is neither preserved nor meaningful, per spec.

use crate::table::OpenTable;
use crate::value::Value;

pub struct DictObj {
    table: OpenTable<Value>,
}

impl DictObj {
    pub fn new() -> Self {
        DictObj {
            table: OpenTable::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.table.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.table.set(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.table.iter().map(|(k, v)| (k, *v))
    }
}

impl Default for DictObj {
    fn default() -> Self {
        Self::new()
    }
}
