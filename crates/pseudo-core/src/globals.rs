//! Top-level bindings table (spec §2 "Globals table", §3.3).
//!
//! Open-addressed, string-keyed, power-of-two capacity, resizes past 75%
//! load — identical contract to `objects::dict::DictObj`, so this is a thin
//! wrapper over the same `table::OpenTable`.

use crate::table::OpenTable;
use crate::value::Value;

pub struct Globals {
    table: OpenTable<Value>,
}

impl Globals {
    pub fn new() -> Self {
        Globals {
            table: OpenTable::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.table.get(name).copied()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.table.set(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}
