//! Promise heap objects: synchronous value wrappers (spec §4.9).
//!
//! No cooperative scheduler lives here — `OP_AWAIT` on a pending promise
//! simply yields `nil` (§4.9). `on_resolve`/`on_reject` and `next` exist so a
//! builtin dispatch table can implement `.then`-style chaining on top of this
//! primitive without the VM knowing about callback scheduling.

use crate::heap::Obj;
use crate::value::Value;
use std::ptr::NonNull;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Resolved,
    Rejected,
}

pub struct PromiseObj {
    pub state: PromiseState,
    pub result: Value,
    pub on_resolve: Value,
    pub on_reject: Value,
    pub next: Option<NonNull<Obj>>,
}

impl PromiseObj {
    pub fn pending() -> Self {
        PromiseObj {
            state: PromiseState::Pending,
            result: Value::NIL,
            on_resolve: Value::NIL,
            on_reject: Value::NIL,
            next: None,
        }
    }

    pub fn resolve(&mut self, value: Value) {
        if self.state == PromiseState::Pending {
            self.state = PromiseState::Resolved;
            self.result = value;
        }
    }

    pub fn reject(&mut self, value: Value) {
        if self.state == PromiseState::Pending {
            self.state = PromiseState::Rejected;
            self.result = value;
        }
    }
}

impl Default for PromiseObj {
    fn default() -> Self {
        Self::pending()
    }
}
