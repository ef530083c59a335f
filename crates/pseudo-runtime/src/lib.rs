//! Pseudocode Runtime: the bytecode VM for the pseudocode scripting language.
//!
//! Key design principles:
//! - The dispatcher (`vm::Vm::execute_opcode`) is written once and shared by
//!   the top-level run loop and the generator-body stepper in `generators`.
//! - Opcode families live in their own module (`arithmetic`, `control_flow`,
//!   `containers`, `calls`, `classes`, `exceptions`, `generators`) and take
//!   `&mut Vm` rather than being inherent methods, keeping `vm.rs` itself to
//!   the dispatch table and the embedding entry points.
//! - Everything outside the dispatcher that this runtime does not itself
//!   implement (the source-text compiler, the trace compiler, tensor/regex/
//!   HTTP/crypto kernels) is reached through a narrow hook surface:
//!   `trace::TraceHooks` and the `builtins::Builtin` trampoline table.

pub mod arithmetic;
pub mod assembler;
pub mod builtins;
pub mod cache;
pub mod calls;
pub mod classes;
pub mod containers;
pub mod control_flow;
pub mod error;
pub mod exceptions;
pub mod frame;
pub mod generators;
pub mod opcode;
pub mod preprocessor;
pub mod report;
pub mod trace;
pub mod upvalues;
pub mod vm;

pub use error::{VmError, VmResult};
pub use opcode::{ExtOpCode, OpCode};
pub use vm::{ControlSignal, NativeFn, Vm};

pub use pseudo_core::{Chunk, Globals, Heap, HeapStats, Obj, ObjType, Value, ValueKind};
