//! Native (builtin) function objects.
//!
//! Not named by spec.md directly — it describes builtin dispatch only as
//! "thin trampolines" (§2, §1 OUT OF SCOPE) the VM calls into. Those
//! trampolines still need to be ordinary callable `Value`s so `OP_CALL` can
//! treat a user function and `print` identically. `id` indexes into a table
//! owned by `pseudo-runtime`; this crate only records identity, arity, and a
//! name for diagnostics, the same split `FunctionObj` makes between the
//! compile-time record and the chunk that owns its bytecode.

pub struct NativeObj {
    pub id: u16,
    pub name: Box<str>,
    /// `-1` marks a variadic builtin; otherwise the exact argument count.
    pub arity: i8,
}

impl NativeObj {
    pub fn new(id: u16, name: impl Into<Box<str>>, arity: i8) -> Self {
        NativeObj {
            id,
            name: name.into(),
            arity,
        }
    }

    pub fn accepts(&self, argc: usize) -> bool {
        self.arity < 0 || self.arity as usize == argc
    }
}
