//! Calls, tail calls, and closures (spec §4.6), hand-assembled.

use pseudo_core::{Heap, Value};
use pseudo_runtime::assembler::ChunkBuilder;
use pseudo_runtime::{OpCode, Vm};

/// `fn inc(x) return x + 1 end; inc(41)` — a plain call returns to its
/// caller with the expected result.
#[test]
fn plain_call_returns_the_computed_value() {
    let mut b = ChunkBuilder::new();

    let skip = b.jump_placeholder(OpCode::Jump);
    let inc_start = b.offset();
    b.op_byte(OpCode::GetLocal, 1);
    b.push_const(Value::int(1));
    b.op0(OpCode::AddII);
    b.op0(OpCode::Return);
    b.patch_jump_here(skip);

    let mut heap = Heap::new();
    let inc_fn = b.function_const(&mut heap, "inc", 1, 2, inc_start);

    b.const_index(inc_fn);
    b.push_const(Value::int(41));
    b.op_byte(OpCode::Call, 1);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 42);
}

/// `fn countdown(n, acc) ... tailcall countdown(n - 1, acc + 1) end` run for
/// far more iterations than the 1,024-deep call-frame stack (spec §4.2)
/// could survive without frame reuse (testable property 8: an unbounded
/// tail-recursive loop runs in constant frame depth).
#[test]
fn tail_call_reuses_the_frame_instead_of_growing_the_call_stack() {
    let mut b = ChunkBuilder::new();

    let skip = b.jump_placeholder(OpCode::Jump);
    let countdown_start = b.offset();
    // if n == 0: return acc
    b.op_byte(OpCode::GetLocal, 1);
    b.push_const(Value::int(0));
    b.op0(OpCode::EqII);
    let else_branch = b.jump_placeholder(OpCode::JumpIfFalse);
    // OP_JUMP_IF_FALSE leaves the tested bool on the stack either way
    // (spec §4.5); each branch pops it before continuing.
    b.op0(OpCode::Pop);
    b.op_byte(OpCode::GetLocal, 2);
    b.op0(OpCode::Return);
    b.patch_jump_here(else_branch);
    b.op0(OpCode::Pop);
    // tailcall countdown(n - 1, acc + 1)
    b.op_byte(OpCode::GetLocal, 0);
    b.op_byte(OpCode::GetLocal, 1);
    b.push_const(Value::int(1));
    b.op0(OpCode::SubII);
    b.op_byte(OpCode::GetLocal, 2);
    b.push_const(Value::int(1));
    b.op0(OpCode::AddII);
    b.op_byte(OpCode::TailCall, 2);
    b.patch_jump_here(skip);

    let mut heap = Heap::new();
    let countdown_fn = b.function_const(&mut heap, "countdown", 2, 3, countdown_start);

    b.const_index(countdown_fn);
    b.push_const(Value::int(100_000));
    b.push_const(Value::int(0));
    b.op_byte(OpCode::Call, 2);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 100_000);
}
