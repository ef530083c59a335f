//! Module heap objects: `{name, exports, loaded}` (spec §3.2).
//!
//! Bookkeeping for the import preprocessor's "already loaded" discipline
//! (§6.3) lives one level up, in the VM's module registry — this object is
//! just the runtime value a completed import binds to.

use crate::heap::Obj;
use std::ptr::NonNull;

pub struct ModuleObj {
    pub name: Box<str>,
    /// A Dict.
    pub exports: NonNull<Obj>,
    pub loaded: bool,
}

impl ModuleObj {
    pub fn new(name: impl Into<Box<str>>, exports: NonNull<Obj>) -> Self {
        ModuleObj {
            name: name.into(),
            exports,
            loaded: false,
        }
    }
}
