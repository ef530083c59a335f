//! Jumps, fused compare-and-jump, and the fused iteration superinstructions
//! (spec §4.5).
//!
//! Jump offsets are unsigned 16-bit displacements; `OP_LOOP` subtracts, every
//! other jump adds (spec §4.3). `OP_JUMP_IF_FALSE`/`OP_JUMP_IF_TRUE` leave the
//! tested value on the stack either way — the compiler is responsible for
//! emitting the matching `OP_POP` (spec §4.5).

use crate::arithmetic;
use crate::error::VmResult;
use crate::vm::Vm;
use pseudo_core::Value;

pub fn op_jump(vm: &mut Vm) -> VmResult<()> {
    let offset = vm.read_u16();
    vm.jump_forward(offset);
    Ok(())
}

pub fn op_jump_if_false(vm: &mut Vm) -> VmResult<()> {
    let offset = vm.read_u16();
    if !vm.peek(0).is_truthy() {
        vm.jump_forward(offset);
    }
    Ok(())
}

pub fn op_jump_if_true(vm: &mut Vm) -> VmResult<()> {
    let offset = vm.read_u16();
    if vm.peek(0).is_truthy() {
        vm.jump_forward(offset);
    }
    Ok(())
}

pub fn op_loop(vm: &mut Vm) -> VmResult<()> {
    let offset = vm.read_u16();
    vm.jump_backward(offset);
    Ok(())
}

fn fused(vm: &mut Vm, cmp: impl Fn(Value, Value) -> VmResult<bool>) -> VmResult<()> {
    let offset = vm.read_u16();
    let b = vm.pop();
    let a = vm.pop();
    if !cmp(a, b)? {
        vm.jump_forward(offset);
    }
    Ok(())
}

pub fn op_lt_jmp_false(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::lt)
}
pub fn op_le_jmp_false(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::le)
}
pub fn op_gt_jmp_false(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::gt)
}
pub fn op_ge_jmp_false(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::ge)
}
pub fn op_eq_jmp_false(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::eq)
}
pub fn op_neq_jmp_false(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::neq)
}
pub fn op_lt_jmp_false_ii(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::lt_ii)
}
pub fn op_le_jmp_false_ii(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::le_ii)
}
pub fn op_gt_jmp_false_ii(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::gt_ii)
}
pub fn op_ge_jmp_false_ii(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::ge_ii)
}
pub fn op_eq_jmp_false_ii(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::eq_ii)
}
pub fn op_neq_jmp_false_ii(vm: &mut Vm) -> VmResult<()> {
    fused(vm, arithmetic::neq_ii)
}

/// `OP_FOR_COUNT counter_slot, end_slot, var_slot, offset` (spec §4.5).
/// `header_ip` is the offset of this opcode itself, for the trace hooks.
pub fn op_for_count(vm: &mut Vm, header_ip: usize) -> VmResult<()> {
    let counter_slot = vm.read_byte() as usize;
    let end_slot = vm.read_byte() as usize;
    let var_slot = vm.read_byte() as usize;
    let offset = vm.read_u16();

    let bp = vm.current_bp();
    let counter = vm.stack_at(bp + counter_slot).as_int();
    let end = vm.stack_at(bp + end_slot).as_int();
    vm.trace_loop_header(header_ip);
    if counter >= end {
        vm.jump_forward(offset);
    } else {
        vm.set_stack_at(bp + var_slot, Value::int(counter));
        vm.set_stack_at(bp + counter_slot, Value::int(counter + 1));
    }
    Ok(())
}

/// `OP_FOR_COUNT_STEP counter_slot, end_slot, step_slot, var_slot, offset`
/// (spec §4.5): sign-aware, inclusive-bound termination; `step == 0`
/// terminates immediately.
pub fn op_for_count_step(vm: &mut Vm, header_ip: usize) -> VmResult<()> {
    let counter_slot = vm.read_byte() as usize;
    let end_slot = vm.read_byte() as usize;
    let step_slot = vm.read_byte() as usize;
    let var_slot = vm.read_byte() as usize;
    let offset = vm.read_u16();

    let bp = vm.current_bp();
    let counter = vm.stack_at(bp + counter_slot).as_int();
    let end = vm.stack_at(bp + end_slot).as_int();
    let step = vm.stack_at(bp + step_slot).as_int();
    vm.trace_loop_header(header_ip);

    let done = if step == 0 {
        true
    } else if step > 0 {
        counter > end
    } else {
        counter < end
    };

    if done {
        vm.jump_forward(offset);
    } else {
        vm.set_stack_at(bp + var_slot, Value::int(counter));
        vm.set_stack_at(bp + counter_slot, Value::int(counter + step));
    }
    Ok(())
}

/// `OP_FOR_LOOP iter_slot, idx_slot, var_slot, offset` (spec §4.5):
/// polymorphic over ranges, arrays, and strings.
pub fn op_for_loop(vm: &mut Vm, header_ip: usize) -> VmResult<()> {
    use crate::error::VmError;

    let iter_slot = vm.read_byte() as usize;
    let idx_slot = vm.read_byte() as usize;
    let var_slot = vm.read_byte() as usize;
    let offset = vm.read_u16();
    let bp = vm.current_bp();
    vm.trace_loop_header(header_ip);

    let iter_value = vm.stack_at(bp + iter_slot);
    if !iter_value.is_obj() {
        return Err(VmError::Type("for-loop target is not iterable".into()));
    }
    let obj = unsafe { iter_value.as_obj().as_ref() };

    if let Some(range) = obj.as_range() {
        let mut r = range.get();
        match r.next() {
            Some(v) => {
                range.set(r);
                vm.set_stack_at(bp + var_slot, Value::int(v));
            }
            None => vm.jump_forward(offset),
        }
        return Ok(());
    }

    if let Some(arr) = obj.as_array() {
        let idx = vm.stack_at(bp + idx_slot).as_int() as usize;
        let arr = arr.borrow();
        match arr.get(idx) {
            Some(v) => {
                drop(arr);
                vm.set_stack_at(bp + var_slot, v);
                vm.set_stack_at(bp + idx_slot, Value::int(idx as i32 + 1));
            }
            None => vm.jump_forward(offset),
        }
        return Ok(());
    }

    if let Some(s) = obj.as_string() {
        let idx = vm.stack_at(bp + idx_slot).as_int() as usize;
        match s.as_str().chars().nth(idx) {
            Some(c) => {
                let ptr = vm.heap.alloc_string(c.to_string());
                vm.set_stack_at(bp + var_slot, Value::obj(ptr));
                vm.set_stack_at(bp + idx_slot, Value::int(idx as i32 + 1));
            }
            None => vm.jump_forward(offset),
        }
        return Ok(());
    }

    Err(VmError::Type("for-loop target is not iterable".into()))
}
