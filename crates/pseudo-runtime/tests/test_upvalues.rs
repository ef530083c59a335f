//! Closures capturing enclosing locals (spec §4.6, §9 "Upvalues as an
//! open/closed state machine"), hand-assembled directly against `Heap`
//! rather than through the `.pseudoasm` text format, since a hand-written
//! listing has no way to state a function's upvalue count (see
//! `assembler::assemble`'s doc comment) — these tests build the
//! `FunctionObj`/`OP_CLOSURE` operand pair the way a real compiler would.

use pseudo_core::objects::FunctionObj;
use pseudo_core::{Heap, Value};
use pseudo_runtime::assembler::ChunkBuilder;
use pseudo_runtime::{OpCode, Vm};

/// Two calls to the same closure observe each other's writes to a captured
/// local: `make_counter`-style shared mutable state through one upvalue.
///
/// ```text
/// count = 0
/// inc = closure(increment) capturing count
/// inc()
/// inc()
/// ```
#[test]
fn repeated_calls_through_one_closure_share_captured_state() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    // increment(): push captured count + 1, store it back, return it.
    let skip = b.jump_placeholder(OpCode::Jump);
    let increment_start = b.offset();
    b.op_byte(OpCode::GetUpvalue, 0);
    b.push_const(Value::int(1));
    b.op0(OpCode::AddII);
    b.op_byte(OpCode::SetUpvalue, 0);
    b.op0(OpCode::Return);
    b.patch_jump_here(skip);

    let mut increment_fn = FunctionObj::new("increment", 0, 1, increment_start);
    increment_fn.upvalue_count = 1;
    let increment_ptr = heap.alloc_function(increment_fn);
    let increment_const = b.add_constant(Value::obj(increment_ptr));
    let inc_global = b.add_constant(Value::obj(heap.alloc_string("inc")));

    // count = 0, the script frame's local slot 1 (slot 0 is the nil sentinel).
    b.push_const(Value::int(0));
    // OP_CLOSURE const_idx; (is_local=1, index=1) — captures slot 1 of the
    // enclosing (script) frame, whose bp is 0 at this point.
    b.op_bytes(OpCode::Closure, &[increment_const as u8, 1, 1]);
    b.op_byte(OpCode::DefineGlobal, inc_global as u8);

    b.op_byte(OpCode::GetGlobal, inc_global as u8);
    b.op_byte(OpCode::Call, 0);
    b.op0(OpCode::Pop);

    b.op_byte(OpCode::GetGlobal, inc_global as u8);
    b.op_byte(OpCode::Call, 0);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 2);
}

/// Once the capturing frame returns, its upvalue closes over the local's
/// last value (spec §9): the closure keeps working correctly even though
/// the stack slot it originally pointed at is long gone.
///
/// ```text
/// fn make_getter()
///   let x = 99
///   return closure(get_x) capturing x
/// end
/// getter = make_getter()
/// getter()
/// ```
#[test]
fn closure_outlives_the_frame_that_captured_its_local() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    // get_x(): just return the captured value.
    let skip_get_x = b.jump_placeholder(OpCode::Jump);
    let get_x_start = b.offset();
    b.op_byte(OpCode::GetUpvalue, 0);
    b.op0(OpCode::Return);
    b.patch_jump_here(skip_get_x);

    let mut get_x_fn = FunctionObj::new("get_x", 0, 1, get_x_start);
    get_x_fn.upvalue_count = 1;
    let get_x_ptr = heap.alloc_function(get_x_fn);
    let get_x_const = b.add_constant(Value::obj(get_x_ptr));

    // make_getter(): x = 99 (own local slot 1); closure over it; return it.
    // `OP_RETURN` closes every upvalue at or above the callee's bp (spec
    // §4.6), so the closure's reference to slot 1 must close to 99 here,
    // before the frame (and that stack slot) disappears.
    let skip_make_getter = b.jump_placeholder(OpCode::Jump);
    let make_getter_start = b.offset();
    b.push_const(Value::int(99));
    b.op_bytes(OpCode::Closure, &[get_x_const as u8, 1, 1]);
    b.op0(OpCode::Return);
    b.patch_jump_here(skip_make_getter);

    let make_getter_fn = FunctionObj::new("make_getter", 0, 2, make_getter_start);
    let make_getter_ptr = heap.alloc_function(make_getter_fn);
    let make_getter_const = b.add_constant(Value::obj(make_getter_ptr));

    b.const_index(make_getter_const);
    b.op_byte(OpCode::Call, 0);
    b.op_byte(OpCode::Call, 0);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 99);
}
