//! Upvalue heap objects: the open/closed state machine (spec §3.2, §4.2,
//! design notes "Upvalues as an open/closed state machine").
//!
//! An upvalue starts OPEN, pointing at a live stack slot by index, and
//! transitions exactly once to CLOSED, at which point it owns a private copy
//! of the value. The transition is one-way — there is no `Closed -> Open`.

use crate::heap::Obj;
use crate::value::Value;
use std::ptr::NonNull;

pub enum UpvalueState {
    /// Points at `bp`-relative... actually VM-global stack index `slot`.
    Open(usize),
    Closed(Value),
}

pub struct UpvalueObj {
    pub state: UpvalueState,
    /// Threads this upvalue into the VM's singly-linked, strictly
    /// decreasing-by-`location` list of open upvalues (spec.md §4.2). Only
    /// meaningful while `state` is `Open`; cleared once closed.
    pub open_next: Option<NonNull<Obj>>,
}

impl UpvalueObj {
    pub fn new_open(slot: usize) -> Self {
        UpvalueObj {
            state: UpvalueState::Open(slot),
            open_next: None,
        }
    }

    pub fn location(&self) -> Option<usize> {
        match self.state {
            UpvalueState::Open(slot) => Some(slot),
            UpvalueState::Closed(_) => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, UpvalueState::Open(_))
    }

    /// Closes this upvalue over `value`, taking it out of the open list.
    pub fn close(&mut self, value: Value) {
        self.state = UpvalueState::Closed(value);
        self.open_next = None;
    }
}
