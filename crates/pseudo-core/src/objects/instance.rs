//! Instance heap objects (spec §3.2, §4.7).
//!
//! Fields live in an inline array sized to `class::MAX_FIELDS` so dynamic
//! field addition never reallocates; only the slots up to the owning class's
//! current `field_count()` are meaningful, the rest stay `Value::NIL`.

use crate::heap::Obj;
use crate::objects::class::MAX_FIELDS;
use crate::value::Value;
use std::ptr::NonNull;

pub struct InstanceObj {
    pub class: NonNull<Obj>,
    fields: Box<[Value; MAX_FIELDS]>,
}

impl InstanceObj {
    pub fn new(class: NonNull<Obj>) -> Self {
        InstanceObj {
            class,
            fields: Box::new([Value::NIL; MAX_FIELDS]),
        }
    }

    pub fn get(&self, slot: u16) -> Value {
        self.fields[slot as usize]
    }

    pub fn set(&mut self, slot: u16, value: Value) {
        self.fields[slot as usize] = value;
    }
}
