//! Function heap objects: compile-time immutable records (spec §3.2, §4.2).
//!
//! A `FunctionObj` does *not* own bytecode — bytecode lives in the chunk
//! shared by the whole program (`chunk::Chunk`). This mirrors the teacher's
//! `Function` record, which only carries the metadata the call/return
//! protocol needs to find and validate a call.

pub struct FunctionObj {
    pub arity: u8,
    pub locals_count: u16,
    pub upvalue_count: u8,
    pub code_start: usize,
    pub name: Box<str>,
    /// Set by the (external) compiler when a call site can reuse the
    /// caller's frame without a separate upvalue environment (§4.6,
    /// "inlinable" functions). The VM still pushes a call frame either way;
    /// this only changes whether a fresh upvalue environment is set up.
    pub inlinable: bool,
}

impl FunctionObj {
    pub fn new(name: impl Into<Box<str>>, arity: u8, locals_count: u16, code_start: usize) -> Self {
        FunctionObj {
            arity,
            locals_count,
            upvalue_count: 0,
            code_start,
            name: name.into(),
            inlinable: false,
        }
    }
}
