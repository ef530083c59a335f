//! Bound-method heap objects: `{receiver, method}` (spec §3.2, §4.7
//! `OP_GET_SUPER`).

use crate::heap::Obj;
use crate::value::Value;
use std::ptr::NonNull;

pub struct BoundMethodObj {
    pub receiver: Value,
    /// A Closure.
    pub method: NonNull<Obj>,
}

impl BoundMethodObj {
    pub fn new(receiver: Value, method: NonNull<Obj>) -> Self {
        BoundMethodObj { receiver, method }
    }
}
