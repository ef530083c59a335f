//! Arithmetic, bitwise, and comparison opcodes (spec §4.4).
//!
//! `OP_ADD`/`OP_SUB`/`OP_MUL` stay integer when both operands are integers
//! and otherwise promote to double; `OP_DIV` additionally truncates for the
//! all-integer case. The `*_II` variants skip every type check the compiler
//! already proved unnecessary (spec §3.3 invariant, §9 "undefined but
//! memory-safe results when the precondition is violated" — here we still
//! choose to read both operands as raw ints rather than reach for
//! `unwrap()`-style panics, since a `debug_assert!` inside `Value::as_int`
//! already covers the debug-build contract).

use crate::error::{VmError, VmResult};
use crate::vm::Vm;
use pseudo_core::{Value, ValueKind};

fn as_numeric(v: Value) -> VmResult<f64> {
    match v.kind() {
        ValueKind::Int => Ok(v.as_int() as f64),
        ValueKind::Float => Ok(v.as_float()),
        _ => Err(VmError::Type("expected a number".into())),
    }
}

fn as_i32_coerced(v: Value) -> VmResult<i32> {
    match v.kind() {
        ValueKind::Int => Ok(v.as_int()),
        ValueKind::Float => Ok(v.as_float() as i32),
        _ => Err(VmError::Type("expected a number".into())),
    }
}

pub fn values_equal(a: Value, b: Value) -> bool {
    match (a.kind(), b.kind()) {
        (ValueKind::Int, ValueKind::Int) => a.as_int() == b.as_int(),
        (ValueKind::Int, ValueKind::Float) => a.as_int() as f64 == b.as_float(),
        (ValueKind::Float, ValueKind::Int) => a.as_float() == b.as_int() as f64,
        (ValueKind::Float, ValueKind::Float) => a.as_float() == b.as_float(),
        (ValueKind::Obj, ValueKind::Obj) => {
            let oa = unsafe { a.as_obj().as_ref() };
            let ob = unsafe { b.as_obj().as_ref() };
            match (oa.as_string(), ob.as_string()) {
                (Some(sa), Some(sb)) => sa == sb,
                _ => a.as_obj() == b.as_obj(),
            }
        }
        _ => a == b,
    }
}

fn numeric_cmp(a: Value, b: Value) -> VmResult<std::cmp::Ordering> {
    let (x, y) = (as_numeric(a)?, as_numeric(b)?);
    x.partial_cmp(&y).ok_or_else(|| VmError::Type("NaN in comparison".into()))
}

// Shared by the fused compare-and-jump opcodes (control_flow.rs), which need
// the bare boolean without the stack push `op_lt`/`op_eq`/etc. perform.
pub(crate) fn lt(a: Value, b: Value) -> VmResult<bool> {
    Ok(numeric_cmp(a, b)?.is_lt())
}
pub(crate) fn le(a: Value, b: Value) -> VmResult<bool> {
    Ok(numeric_cmp(a, b)?.is_le())
}
pub(crate) fn gt(a: Value, b: Value) -> VmResult<bool> {
    Ok(numeric_cmp(a, b)?.is_gt())
}
pub(crate) fn ge(a: Value, b: Value) -> VmResult<bool> {
    Ok(numeric_cmp(a, b)?.is_ge())
}
pub(crate) fn eq(a: Value, b: Value) -> VmResult<bool> {
    Ok(values_equal(a, b))
}
pub(crate) fn neq(a: Value, b: Value) -> VmResult<bool> {
    Ok(!values_equal(a, b))
}
pub(crate) fn lt_ii(a: Value, b: Value) -> VmResult<bool> {
    Ok(cmp_ii(a, b).is_lt())
}
pub(crate) fn le_ii(a: Value, b: Value) -> VmResult<bool> {
    Ok(cmp_ii(a, b).is_le())
}
pub(crate) fn gt_ii(a: Value, b: Value) -> VmResult<bool> {
    Ok(cmp_ii(a, b).is_gt())
}
pub(crate) fn ge_ii(a: Value, b: Value) -> VmResult<bool> {
    Ok(cmp_ii(a, b).is_ge())
}
pub(crate) fn eq_ii(a: Value, b: Value) -> VmResult<bool> {
    Ok(a.as_int() == b.as_int())
}
pub(crate) fn neq_ii(a: Value, b: Value) -> VmResult<bool> {
    Ok(a.as_int() != b.as_int())
}

pub fn op_add(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    if a.is_obj() && b.is_obj() {
        let (oa, ob) = unsafe { (a.as_obj().as_ref(), b.as_obj().as_ref()) };
        if let (Some(sa), Some(sb)) = (oa.as_string(), ob.as_string()) {
            let mut combined = String::with_capacity(sa.as_str().len() + sb.as_str().len());
            combined.push_str(sa.as_str());
            combined.push_str(sb.as_str());
            let ptr = vm.heap.alloc_string(combined);
            vm.push(Value::obj(ptr))?;
            return Ok(());
        }
    }
    if a.is_int() && b.is_int() {
        vm.push(Value::int(a.as_int().wrapping_add(b.as_int())))?;
    } else {
        vm.push(Value::float(as_numeric(a)? + as_numeric(b)?))?;
    }
    Ok(())
}

pub fn op_sub(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    if a.is_int() && b.is_int() {
        vm.push(Value::int(a.as_int().wrapping_sub(b.as_int())))?;
    } else {
        vm.push(Value::float(as_numeric(a)? - as_numeric(b)?))?;
    }
    Ok(())
}

pub fn op_mul(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    if a.is_int() && b.is_int() {
        vm.push(Value::int(a.as_int().wrapping_mul(b.as_int())))?;
    } else {
        vm.push(Value::float(as_numeric(a)? * as_numeric(b)?))?;
    }
    Ok(())
}

pub fn op_div(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    if a.is_int() && b.is_int() {
        let (x, y) = (a.as_int(), b.as_int());
        if y == 0 {
            return Err(VmError::Type("division by zero".into()));
        }
        vm.push(Value::int(x.wrapping_div(y)))?;
    } else {
        vm.push(Value::float(as_numeric(a)? / as_numeric(b)?))?;
    }
    Ok(())
}

pub fn op_mod(vm: &mut Vm) -> VmResult<()> {
    let b = as_i32_coerced(vm.pop())?;
    let a = as_i32_coerced(vm.pop())?;
    if b == 0 {
        return Err(VmError::Type("modulo by zero".into()));
    }
    vm.push(Value::int(a.wrapping_rem(b)))
}

pub fn op_pow(vm: &mut Vm) -> VmResult<()> {
    let b = as_numeric(vm.pop())?;
    let a = as_numeric(vm.pop())?;
    vm.push(Value::float(a.powf(b)))
}

pub fn op_neg(vm: &mut Vm) -> VmResult<()> {
    let a = vm.pop();
    if a.is_int() {
        vm.push(Value::int(a.as_int().wrapping_neg()))
    } else {
        vm.push(Value::float(-as_numeric(a)?))
    }
}

pub fn op_not(vm: &mut Vm) -> VmResult<()> {
    let a = vm.pop();
    vm.push(Value::bool(!a.is_truthy()))
}

pub fn op_band(vm: &mut Vm) -> VmResult<()> {
    let b = as_i32_coerced(vm.pop())?;
    let a = as_i32_coerced(vm.pop())?;
    vm.push(Value::int(a & b))
}

pub fn op_bor(vm: &mut Vm) -> VmResult<()> {
    let b = as_i32_coerced(vm.pop())?;
    let a = as_i32_coerced(vm.pop())?;
    vm.push(Value::int(a | b))
}

pub fn op_bxor(vm: &mut Vm) -> VmResult<()> {
    let b = as_i32_coerced(vm.pop())?;
    let a = as_i32_coerced(vm.pop())?;
    vm.push(Value::int(a ^ b))
}

pub fn op_bnot(vm: &mut Vm) -> VmResult<()> {
    let a = as_i32_coerced(vm.pop())?;
    vm.push(Value::int(!a))
}

pub fn op_shl(vm: &mut Vm) -> VmResult<()> {
    let b = as_i32_coerced(vm.pop())?;
    let a = as_i32_coerced(vm.pop())?;
    vm.push(Value::int(a.wrapping_shl(b as u32)))
}

pub fn op_shr(vm: &mut Vm) -> VmResult<()> {
    let b = as_i32_coerced(vm.pop())?;
    let a = as_i32_coerced(vm.pop())?;
    vm.push(Value::int(a.wrapping_shr(b as u32)))
}

pub fn op_eq(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(values_equal(a, b)))
}

pub fn op_neq(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(!values_equal(a, b)))
}

pub fn op_lt(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(numeric_cmp(a, b)?.is_lt()))
}

pub fn op_le(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(numeric_cmp(a, b)?.is_le()))
}

pub fn op_gt(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(numeric_cmp(a, b)?.is_gt()))
}

pub fn op_ge(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(numeric_cmp(a, b)?.is_ge()))
}

// --- Integer-specialized variants: no coercion, no type checks. ---

pub fn op_add_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop().as_int();
    let a = vm.pop().as_int();
    vm.push(Value::int(a.wrapping_add(b)))
}

pub fn op_sub_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop().as_int();
    let a = vm.pop().as_int();
    vm.push(Value::int(a.wrapping_sub(b)))
}

pub fn op_mul_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop().as_int();
    let a = vm.pop().as_int();
    vm.push(Value::int(a.wrapping_mul(b)))
}

pub fn op_div_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop().as_int();
    let a = vm.pop().as_int();
    if b == 0 {
        return Err(VmError::Type("division by zero".into()));
    }
    vm.push(Value::int(a.wrapping_div(b)))
}

/// Shared by `op_*_jmp_false_ii`: compares two known-int operands.
pub(crate) fn cmp_ii(a: Value, b: Value) -> std::cmp::Ordering {
    a.as_int().cmp(&b.as_int())
}

pub fn op_eq_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(a.as_int() == b.as_int()))
}

pub fn op_neq_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(a.as_int() != b.as_int()))
}

pub fn op_lt_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(cmp_ii(a, b).is_lt()))
}

pub fn op_le_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(cmp_ii(a, b).is_le()))
}

pub fn op_gt_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(cmp_ii(a, b).is_gt()))
}

pub fn op_ge_ii(vm: &mut Vm) -> VmResult<()> {
    let b = vm.pop();
    let a = vm.pop();
    vm.push(Value::bool(cmp_ii(a, b).is_ge()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_plus_int_stays_int() {
        assert!(values_equal(Value::int(2), Value::int(2)));
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert!(values_equal(Value::int(3), Value::float(3.0)));
        assert!(!values_equal(Value::int(3), Value::float(3.1)));
    }

    #[test]
    fn non_numeric_non_string_equality_is_bitwise_identity() {
        assert!(values_equal(Value::NIL, Value::NIL));
        assert!(!values_equal(Value::TRUE, Value::FALSE));
    }
}
