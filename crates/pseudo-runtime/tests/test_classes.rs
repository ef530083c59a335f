//! Classes, instances, fields, and method dispatch (spec §4.7), built by hand
//! with `ChunkBuilder` rather than parsed source (the source-text compiler is
//! out of scope, per spec §1).

use pseudo_core::{Heap, Value};
use pseudo_runtime::assembler::ChunkBuilder;
use pseudo_runtime::{OpCode, Vm};

/// Builds and runs:
///
/// ```text
/// class Counter
///   field n
///   fn inc()
///     self.n = self.n + 1
///     return self.n
///   end
/// end
/// let counter = Counter()
/// counter.n = 0
/// counter.inc()
/// counter.inc()
/// ```
///
/// asserting the second `inc()` observes the first's write (one shared
/// instance, not two fresh ones).
#[test]
fn field_mutation_is_visible_across_separate_invocations() {
    let mut heap = Heap::new();
    let mut b = ChunkBuilder::new();

    let skip = b.jump_placeholder(OpCode::Jump);
    let inc_start = b.offset();
    let n_name = b.add_constant(Value::obj(heap.alloc_string("n")));
    // self.n = self.n + 1; return self.n
    b.op_byte(OpCode::GetLocal, 0);
    b.op_byte(OpCode::GetLocal, 0);
    b.op_byte(OpCode::GetField, n_name as u8);
    b.push_const(Value::int(1));
    b.op0(OpCode::AddII);
    b.op_byte(OpCode::SetField, n_name as u8);
    b.op0(OpCode::Return);
    b.patch_jump_here(skip);

    let inc_fn = b.function_const(&mut heap, "inc", 0, 1, inc_start);
    let class_name = b.add_constant(Value::obj(heap.alloc_string("Counter")));
    let inc_name = b.add_constant(Value::obj(heap.alloc_string("inc")));
    let counter_global = b.add_constant(Value::obj(heap.alloc_string("counter")));

    b.op_byte(OpCode::Class, class_name as u8);
    b.op_byte(OpCode::Field, n_name as u8);
    b.op_byte(OpCode::Closure, inc_fn as u8);
    b.op_byte(OpCode::Method, inc_name as u8);
    // stack: [nil, class]
    b.op_byte(OpCode::Call, 0);
    // stack: [nil, instance] (construction replaces the class slot in place)

    // instance.n = 0, via a throwaway copy so the instance itself stays put
    b.op_byte(OpCode::GetLocal, 1);
    b.push_const(Value::int(0));
    b.op_byte(OpCode::SetField, n_name as u8);
    b.op0(OpCode::Pop);

    b.op_byte(OpCode::DefineGlobal, counter_global as u8);

    b.op_byte(OpCode::GetGlobal, counter_global as u8);
    b.op_bytes(OpCode::Invoke, &[inc_name as u8, 0]);
    b.op0(OpCode::Pop);

    b.op_byte(OpCode::GetGlobal, counter_global as u8);
    b.op_bytes(OpCode::Invoke, &[inc_name as u8, 0]);
    b.op0(OpCode::Halt);

    let chunk = b.build();

    let mut vm = Vm::new();
    vm.heap = heap;
    let result = vm.interpret(chunk).unwrap();
    assert_eq!(result.as_int(), 2);
}
