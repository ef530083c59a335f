//! Class heap objects (spec §3.2, §4.7).
//!
//! `field_hash` is an open-addressed table (shared with dict/globals via
//! `table::OpenTable`) mapping a field name to its slot index, giving O(1)
//! field lookup once a site's inline cache misses. Methods are found by
//! linear scan over `method_names` — §4.7 is explicit that method lookup on
//! the slow path is a scan, not a hash lookup, since method tables are small
//! and the hot path is the inline cache, not this fallback.

use crate::heap::Obj;
use crate::table::OpenTable;
use crate::value::Value;
use std::ptr::NonNull;

/// Bounds the inline field array every `InstanceObj` carries (spec §3.2:
/// "inline array of Value fields sized to hold the maximum permitted field
/// count"). Chosen generously; a program defining more fields than this on
/// one class is a resource-limit error, not a silent truncation.
pub const MAX_FIELDS: usize = 256;

pub struct ClassObj {
    pub name: Box<str>,
    pub superclass: Option<NonNull<Obj>>,
    pub field_names: Vec<Box<str>>,
    pub field_hash: OpenTable<u16>,
    pub method_names: Vec<Box<str>>,
    pub methods: Vec<Value>,
    pub static_names: Vec<Box<str>>,
    pub statics: Vec<Value>,
}

impl ClassObj {
    pub fn new(name: impl Into<Box<str>>) -> Self {
        ClassObj {
            name: name.into(),
            superclass: None,
            field_names: Vec::new(),
            field_hash: OpenTable::new(),
            method_names: Vec::new(),
            methods: Vec::new(),
            static_names: Vec::new(),
            statics: Vec::new(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }

    /// Registers a field name, allocating a fresh slot. Returns the slot
    /// index, or `None` if `MAX_FIELDS` has been exhausted.
    pub fn declare_field(&mut self, name: &str) -> Option<u16> {
        if let Some(slot) = self.field_hash.get(name) {
            return Some(*slot);
        }
        if self.field_names.len() >= MAX_FIELDS {
            return None;
        }
        let slot = self.field_names.len() as u16;
        self.field_names.push(name.into());
        self.field_hash.set(name, slot);
        Some(slot)
    }

    pub fn field_slot(&self, name: &str) -> Option<u16> {
        self.field_hash.get(name).copied()
    }

    pub fn method(&self, name: &str) -> Option<Value> {
        self.method_names
            .iter()
            .position(|n| &**n == name)
            .map(|i| self.methods[i])
    }

    /// Overrides an existing same-name method, or appends a new one (§4.7
    /// `OP_METHOD`).
    pub fn define_method(&mut self, name: &str, value: Value) {
        if let Some(i) = self.method_names.iter().position(|n| &**n == name) {
            self.methods[i] = value;
        } else {
            self.method_names.push(name.into());
            self.methods.push(value);
        }
    }

    pub fn static_member(&self, name: &str) -> Option<Value> {
        self.static_names
            .iter()
            .position(|n| &**n == name)
            .map(|i| self.statics[i])
    }

    pub fn define_static(&mut self, name: &str, value: Value) {
        if let Some(i) = self.static_names.iter().position(|n| &**n == name) {
            self.statics[i] = value;
        } else {
            self.static_names.push(name.into());
            self.statics.push(value);
        }
    }

    /// `OP_INHERIT`: copy the superclass's methods, method names, field
    /// names, and field hash into `self` (spec §4.7).
    pub fn inherit_from(&mut self, superclass: &ClassObj) {
        self.field_names = superclass.field_names.clone();
        self.field_hash = {
            let mut t = OpenTable::new();
            for name in &self.field_names {
                if let Some(slot) = superclass.field_hash.get(name) {
                    t.set(name, *slot);
                }
            }
            t
        };
        self.method_names = superclass.method_names.clone();
        self.methods = superclass.methods.clone();
    }
}
