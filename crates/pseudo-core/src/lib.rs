//! Pseudocode Core: value representation, heap object model, and bytecode
//! chunk format.
//!
//! Key design principles:
//! - `Value`: what the language talks about (nil, bool, int, float, object).
//! - `heap::Obj`: implementation detail — a GC header plus one object payload,
//!   threaded into the process-wide live-object list.
//! - The opcode *semantics* that operate on these types live one crate up, in
//!   `pseudo-runtime` — this crate only defines the data they operate on.

pub mod chunk;
pub mod error;
pub mod globals;
pub mod heap;
pub mod objects;
pub mod serialize;
pub mod table;
pub mod value;

pub use chunk::Chunk;
pub use error::CoreError;
pub use globals::Globals;
pub use heap::{Heap, HeapStats, Obj};
pub use objects::ObjType;
pub use value::{Value, ValueKind};
