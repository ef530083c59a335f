//! `OP_TRY`/`OP_THROW`/`OP_CATCH` unwinding (spec §4.8), hand-assembled.

use pseudo_core::{Heap, Value};
use pseudo_runtime::assembler::ChunkBuilder;
use pseudo_runtime::{OpCode, Vm};

/// `try: throw "boom" catch e: halt e` — the thrown value survives the
/// unwind and reaches the handler unchanged.
#[test]
fn thrown_value_reaches_its_handler() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    let handler_offset = b.jump_placeholder(OpCode::Try);
    b.push_const(Value::obj(heap.alloc_string("boom")));
    b.op0(OpCode::Throw);
    b.patch_jump_here(handler_offset);
    b.op0(OpCode::Catch);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();

    let s = unsafe { result.as_obj().as_ref() }.as_string().unwrap();
    assert_eq!(s.as_str(), "boom");
}

/// A `throw` with no active handler is a runtime error (spec §7), not a
/// panic, and the VM reports it via the ordinary `VmError` path.
#[test]
fn unhandled_throw_is_a_runtime_error() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();
    b.push_const(Value::obj(heap.alloc_string("nobody catches me")));
    b.op0(OpCode::Throw);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let err = vm.interpret(chunk).unwrap_err();
    assert!(matches!(err, pseudo_runtime::VmError::UnhandledException(_)));
}
