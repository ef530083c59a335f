//! Generators: `next`/`send` stepping, suspension, and completion (spec
//! §4.9), hand-assembled. Each step comes back as a two-element array
//! `[value, done]` (`generators::push_step_result`), since the extended
//! opcode space has no dedicated tuple type of its own.

use pseudo_core::{Heap, Value};
use pseudo_runtime::assembler::ChunkBuilder;
use pseudo_runtime::{ExtOpCode, OpCode, Vm};

fn step(result: Value) -> (Value, bool) {
    let obj = unsafe { result.as_obj().as_ref() };
    let arr = obj.as_array().unwrap().borrow();
    (arr.get(0).unwrap(), arr.get(1).unwrap().as_bool())
}

/// `fn counter() yield 10 yield 20 return 30 end` stepped three times via
/// `gen_next`: two suspensions carrying their yielded value, then a final
/// step carrying the return value with `done = true`.
#[test]
fn next_drives_a_generator_through_two_yields_to_completion() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    let skip = b.jump_placeholder(OpCode::Jump);
    let body_start = b.offset();
    b.push_const(Value::int(10));
    b.extended(ExtOpCode::Yield);
    b.push_const(Value::int(20));
    b.extended(ExtOpCode::Yield);
    b.push_const(Value::int(30));
    b.op0(OpCode::Return);
    b.patch_jump_here(skip);

    let body_fn = b.function_const(&mut heap, "counter", 0, 1, body_start);
    b.op_bytes(OpCode::Closure, &[body_fn as u8]);
    b.extended(ExtOpCode::Generator);
    // stack: [nil, generator]
    b.op_byte(OpCode::GetLocal, 1);
    b.extended(ExtOpCode::GenNext);
    b.op0(OpCode::Pop);
    b.op_byte(OpCode::GetLocal, 1);
    b.extended(ExtOpCode::GenNext);
    b.op0(OpCode::Pop);
    b.op_byte(OpCode::GetLocal, 1);
    b.extended(ExtOpCode::GenNext);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    let (value, done) = step(result);
    assert_eq!(value.as_int(), 30);
    assert!(done);
}

/// `gen_send` delivers its argument into the generator body as the value the
/// suspended `yield` expression evaluates to.
#[test]
fn send_delivers_its_value_back_into_the_suspended_yield() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    // fn echo() let got = yield 1; return got + 100 end
    let skip = b.jump_placeholder(OpCode::Jump);
    let body_start = b.offset();
    b.push_const(Value::int(1));
    b.extended(ExtOpCode::Yield);
    // resumed here with the sent value already on the stack
    b.push_const(Value::int(100));
    b.op0(OpCode::AddII);
    b.op0(OpCode::Return);
    b.patch_jump_here(skip);

    let body_fn = b.function_const(&mut heap, "echo", 0, 1, body_start);
    b.op_bytes(OpCode::Closure, &[body_fn as u8]);
    b.extended(ExtOpCode::Generator);
    // stack: [nil, generator]
    b.op_byte(OpCode::GetLocal, 1);
    b.extended(ExtOpCode::GenNext);
    b.op0(OpCode::Pop);

    b.op_byte(OpCode::GetLocal, 1);
    b.push_const(Value::int(5));
    b.extended(ExtOpCode::GenSend);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    let (value, done) = step(result);
    assert_eq!(value.as_int(), 105);
    assert!(done);
}

/// Stepping a generator again once it has already completed reports
/// `(nil, done=true)` rather than re-running or erroring (spec §4.9's
/// `Closed` state).
#[test]
fn stepping_a_closed_generator_stays_done_without_error() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    let skip = b.jump_placeholder(OpCode::Jump);
    let body_start = b.offset();
    b.push_const(Value::int(1));
    b.op0(OpCode::Return);
    b.patch_jump_here(skip);

    let body_fn = b.function_const(&mut heap, "once", 0, 1, body_start);
    b.op_bytes(OpCode::Closure, &[body_fn as u8]);
    b.extended(ExtOpCode::Generator);
    b.op_byte(OpCode::GetLocal, 1);
    b.extended(ExtOpCode::GenNext);
    b.op0(OpCode::Pop);

    b.op_byte(OpCode::GetLocal, 1);
    b.extended(ExtOpCode::GenNext);
    b.op0(OpCode::Halt);

    let chunk = b.build();
    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    let (value, done) = step(result);
    assert!(value.is_nil());
    assert!(done);
}
