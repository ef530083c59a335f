//! The heap object taxonomy (spec §3.2).
//!
//! One file per object kind, matching the teacher's one-concern-per-file
//! layout (`seqstring.rs`, `variant_ops.rs`, ...). Each struct here is the
//! *payload* of a heap object; `heap::Obj` wraps a payload with the
//! three-field GC header (`tag`, `marked`, `next`) spec.md §3.2 requires.

pub mod array;
pub mod bound_method;
pub mod bytes;
pub mod class;
pub mod closure;
pub mod dict;
pub mod function;
pub mod generator;
pub mod instance;
pub mod module;
pub mod native;
pub mod promise;
pub mod range;
pub mod string;
pub mod upvalue;

pub use array::ArrayObj;
pub use bound_method::BoundMethodObj;
pub use bytes::BytesObj;
pub use class::ClassObj;
pub use closure::ClosureObj;
pub use dict::DictObj;
pub use function::FunctionObj;
pub use generator::{GeneratorObj, GeneratorState};
pub use instance::InstanceObj;
pub use module::ModuleObj;
pub use native::NativeObj;
pub use promise::{PromiseObj, PromiseState};
pub use range::RangeObj;
pub use string::StringObj;
pub use upvalue::{UpvalueObj, UpvalueState};

use std::cell::{Cell, RefCell};

/// The discriminant stored in `heap::Obj::tag`. Spec §3.2 calls for an
/// explicit type tag in the header even though Rust's `ObjPayload` enum
/// already carries one implicitly — this makes `Obj::tag` a cheap, direct
/// read for hot-path type checks instead of a full `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjType {
    String,
    Array,
    Dict,
    Range,
    Function,
    Upvalue,
    Closure,
    Class,
    Instance,
    BoundMethod,
    Generator,
    Promise,
    Module,
    Bytes,
    Native,
}

/// Every heap object's payload. Interior mutability (`Cell`/`RefCell`) is
/// used for the variants the VM mutates in place through shared pointers —
/// the single-threaded posture spec.md §5 and its design notes call for
/// ("Self-modifying caches... should be modeled with interior mutability
/// rather than shared mutable state").
pub enum ObjPayload {
    String(StringObj),
    Array(RefCell<ArrayObj>),
    Dict(RefCell<DictObj>),
    Range(Cell<RangeObj>),
    Function(FunctionObj),
    Upvalue(RefCell<UpvalueObj>),
    Closure(ClosureObj),
    Class(RefCell<ClassObj>),
    Instance(RefCell<InstanceObj>),
    BoundMethod(BoundMethodObj),
    Generator(RefCell<GeneratorObj>),
    Promise(RefCell<PromiseObj>),
    Module(RefCell<ModuleObj>),
    Bytes(RefCell<BytesObj>),
    Native(NativeObj),
}

impl ObjPayload {
    pub fn tag(&self) -> ObjType {
        match self {
            ObjPayload::String(_) => ObjType::String,
            ObjPayload::Array(_) => ObjType::Array,
            ObjPayload::Dict(_) => ObjType::Dict,
            ObjPayload::Range(_) => ObjType::Range,
            ObjPayload::Function(_) => ObjType::Function,
            ObjPayload::Upvalue(_) => ObjType::Upvalue,
            ObjPayload::Closure(_) => ObjType::Closure,
            ObjPayload::Class(_) => ObjType::Class,
            ObjPayload::Instance(_) => ObjType::Instance,
            ObjPayload::BoundMethod(_) => ObjType::BoundMethod,
            ObjPayload::Generator(_) => ObjType::Generator,
            ObjPayload::Promise(_) => ObjType::Promise,
            ObjPayload::Module(_) => ObjType::Module,
            ObjPayload::Bytes(_) => ObjType::Bytes,
            ObjPayload::Native(_) => ObjType::Native,
        }
    }
}
