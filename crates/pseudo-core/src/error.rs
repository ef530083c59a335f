//! Shared error types for the core data model.
//!
//! Mirrors the teacher's `CodeGenError` (`seq-compiler/src/codegen.rs`): a small
//! closed enum with a hand-written `Display`, not a catch-all string or an
//! `anyhow`/`thiserror` wrapper. The core crate only ever fails in a handful of
//! enumerable ways (heap exhaustion, a malformed chunk), so a closed set is more
//! honest than an open one.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A constant-pool index referenced a slot that was never interned.
    BadConstantIndex(usize),
    /// A class's field table ran out of slots (see `ClassObj::MAX_FIELDS`).
    FieldTableFull,
    /// A polymorphic inline cache overflowed its fixed capacity.
    PicOverflow,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::BadConstantIndex(i) => write!(f, "constant index {i} out of range"),
            CoreError::FieldTableFull => write!(f, "class field table is full"),
            CoreError::PicOverflow => write!(f, "polymorphic inline cache overflowed"),
        }
    }
}

impl std::error::Error for CoreError {}
