//! Runtime error taxonomy (spec §7).
//!
//! Hand-written, closed enum with a manual `Display`/`Error` impl, matching
//! the teacher's `CodeGenError` rather than reaching for `thiserror` — this
//! crate carries no error-derive dependency, same as the teacher's compiler
//! crate.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    /// Opcode encountered an operand of an unacceptable type (§7 "runtime
    /// type error"): calling a non-callable, arithmetic on a non-numeric,
    /// indexing a non-indexable, and so on.
    Type(String),
    /// Array/string index out of range (§7 "bounds error").
    Bounds(String),
    /// Call-frame stack is full.
    StackOverflow,
    /// Exception-handler stack (`OP_TRY`) is full.
    HandlerStackOverflow,
    /// Import nesting exceeded the depth cap (surfaced by the host, not the
    /// VM loop itself, but the VM needs the variant for a uniform exit code).
    ImportDepthExceeded,
    /// `OP_THROW` with no active handler on the stack (§7 "user-raised
    /// exception"). Carries the thrown value's debug rendering, since the
    /// raw `Value` cannot outlive the heap that produced it.
    UnhandledException(String),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::Type(msg) => write!(f, "type error: {msg}"),
            VmError::Bounds(msg) => write!(f, "bounds error: {msg}"),
            VmError::StackOverflow => write!(f, "call stack overflow"),
            VmError::HandlerStackOverflow => write!(f, "exception handler stack overflow"),
            VmError::ImportDepthExceeded => write!(f, "import depth exceeded"),
            VmError::UnhandledException(repr) => write!(f, "unhandled exception: {repr}"),
        }
    }
}

impl std::error::Error for VmError {}

pub type VmResult<T> = Result<T, VmError>;
