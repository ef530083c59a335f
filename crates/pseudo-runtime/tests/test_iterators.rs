//! The fused iteration superinstructions (spec §4.5): `OP_FOR_COUNT`,
//! `OP_FOR_COUNT_STEP`, and `OP_FOR_LOOP` over a range/array/string, each
//! hand-assembled as `header: FOR_*; <body>; LOOP header`.

use pseudo_core::{Heap, Value};
use pseudo_runtime::assembler::ChunkBuilder;
use pseudo_runtime::{OpCode, Vm};

/// `for i in 0..5: acc = acc + i` via `OP_FOR_COUNT`, summing 0+1+2+3+4 = 10.
#[test]
fn for_count_sums_a_fixed_integer_range() {
    let mut b = ChunkBuilder::new();
    b.push_const(Value::int(0)); // slot 1: counter
    b.push_const(Value::int(5)); // slot 2: end
    b.push_const(Value::NIL); // slot 3: var (i)
    b.push_const(Value::int(0)); // slot 4: acc

    let loop_start = b.offset();
    let end_jump = b.for_loop_placeholder(OpCode::ForCount, &[1, 2, 3]);
    // acc = acc + i
    b.op_byte(OpCode::GetLocal, 4);
    b.op_byte(OpCode::GetLocal, 3);
    b.op0(OpCode::AddII);
    b.op_byte(OpCode::SetLocal, 4);
    b.op0(OpCode::Pop);
    b.emit_loop(loop_start);
    b.patch_jump_here(end_jump);

    b.op_byte(OpCode::GetLocal, 4);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = Heap::new();
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 10);
}

/// `for i in 10..0 step -2: acc = acc + i` via `OP_FOR_COUNT_STEP`, summing
/// the inclusive descending sequence 10, 8, 6, 4, 2, 0 = 30.
#[test]
fn for_count_step_handles_a_descending_inclusive_range() {
    let mut b = ChunkBuilder::new();
    b.push_const(Value::int(10)); // slot 1: counter
    b.push_const(Value::int(0)); // slot 2: end
    b.push_const(Value::int(-2)); // slot 3: step
    b.push_const(Value::NIL); // slot 4: var (i)
    b.push_const(Value::int(0)); // slot 5: acc

    let loop_start = b.offset();
    let end_jump = b.for_loop_placeholder(OpCode::ForCountStep, &[1, 2, 3, 4]);
    b.op_byte(OpCode::GetLocal, 5);
    b.op_byte(OpCode::GetLocal, 4);
    b.op0(OpCode::AddII);
    b.op_byte(OpCode::SetLocal, 5);
    b.op0(OpCode::Pop);
    b.emit_loop(loop_start);
    b.patch_jump_here(end_jump);

    b.op_byte(OpCode::GetLocal, 5);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = Heap::new();
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 30);
}

/// `for x in [10, 20, 30]: acc = acc + x` via `OP_FOR_LOOP` over an array,
/// exercising the idx_slot bookkeeping the range/string arms don't need.
#[test]
fn for_loop_walks_an_array_in_order() {
    let mut heap = Heap::new();
    let arr_ptr = heap.alloc_array(vec![Value::int(10), Value::int(20), Value::int(30)]);

    let mut b = ChunkBuilder::new();
    b.push_const(Value::obj(arr_ptr)); // slot 1: iterable
    b.push_const(Value::int(0)); // slot 2: idx
    b.push_const(Value::NIL); // slot 3: var (x)
    b.push_const(Value::int(0)); // slot 4: acc

    let loop_start = b.offset();
    let end_jump = b.for_loop_placeholder(OpCode::ForLoop, &[1, 2, 3]);
    b.op_byte(OpCode::GetLocal, 4);
    b.op_byte(OpCode::GetLocal, 3);
    b.op0(OpCode::AddII);
    b.op_byte(OpCode::SetLocal, 4);
    b.op0(OpCode::Pop);
    b.emit_loop(loop_start);
    b.patch_jump_here(end_jump);

    b.op_byte(OpCode::GetLocal, 4);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 60);
}
