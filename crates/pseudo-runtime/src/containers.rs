//! Array, Dict, Range, and Bytes opcodes (spec §4.1 design notes).
//!
//! `OP_NEW_ARRAY`/`OP_NEW_DICT` read a one-byte element/pair count and
//! consume exactly that many stack slots; everything else here pops a
//! container plus its operands and pushes a result or the mutated container
//! back, mirroring the push-pop discipline the arithmetic opcodes use.

use crate::error::{VmError, VmResult};
use crate::vm::Vm;
use pseudo_core::Value;

fn as_index(v: Value) -> VmResult<usize> {
    if !v.is_int() {
        return Err(VmError::Type("expected an integer index".into()));
    }
    let n = v.as_int();
    if n < 0 {
        return Err(VmError::Bounds(format!("negative index {n}")));
    }
    Ok(n as usize)
}

fn as_key(vm: &Vm, v: Value) -> VmResult<String> {
    if !v.is_obj() {
        return Err(VmError::Type("dict keys must be strings".into()));
    }
    let _ = vm;
    unsafe { v.as_obj().as_ref() }
        .as_string()
        .map(|s| s.as_str().to_string())
        .ok_or_else(|| VmError::Type("dict keys must be strings".into()))
}

pub fn op_new_array(vm: &mut Vm) -> VmResult<()> {
    let count = vm.read_byte() as usize;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(vm.pop());
    }
    values.reverse();
    let ptr = vm.heap.alloc_array(values);
    vm.push(Value::obj(ptr))
}

pub fn op_new_dict(vm: &mut Vm) -> VmResult<()> {
    let pair_count = vm.read_byte() as usize;
    let mut pairs = Vec::with_capacity(pair_count);
    for _ in 0..pair_count {
        let value = vm.pop();
        let key = vm.pop();
        pairs.push((as_key(vm, key)?, value));
    }
    let ptr = vm.heap.alloc_dict();
    {
        let dict = unsafe { ptr.as_ref() }.as_dict().unwrap();
        let mut dict = dict.borrow_mut();
        for (key, value) in pairs.into_iter().rev() {
            dict.set(&key, value);
        }
    }
    vm.push(Value::obj(ptr))
}

pub fn op_new_range(vm: &mut Vm) -> VmResult<()> {
    let end = vm.pop();
    let start = vm.pop();
    if !start.is_int() || !end.is_int() {
        return Err(VmError::Type("range bounds must be integers".into()));
    }
    let ptr = vm.heap.alloc_range(start.as_int(), end.as_int());
    vm.push(Value::obj(ptr))
}

pub fn op_index_get(vm: &mut Vm) -> VmResult<()> {
    let index = vm.pop();
    let container = vm.pop();
    if !container.is_obj() {
        return Err(VmError::Type("value is not indexable".into()));
    }
    let obj = unsafe { container.as_obj().as_ref() };

    if let Some(arr) = obj.as_array() {
        let idx = as_index(index)?;
        let value = arr
            .borrow()
            .get(idx)
            .ok_or_else(|| VmError::Bounds(format!("array index {idx} out of bounds")))?;
        return vm.push(value);
    }
    if let Some(dict) = obj.as_dict() {
        let key = as_key(vm, index)?;
        return vm.push(dict.borrow().get(&key).unwrap_or(Value::NIL));
    }
    if let Some(range) = obj.as_range() {
        let idx = as_index(index)? as i32;
        let r = range.get();
        let len = r.end - r.start;
        if idx >= len {
            return Err(VmError::Bounds(format!("range index {idx} out of bounds")));
        }
        return vm.push(Value::int(r.start + idx));
    }
    if let Some(s) = obj.as_string() {
        let idx = as_index(index)?;
        let c = s
            .as_str()
            .chars()
            .nth(idx)
            .ok_or_else(|| VmError::Bounds(format!("string index {idx} out of bounds")))?;
        let ptr = vm.heap.alloc_string(c.to_string());
        return vm.push(Value::obj(ptr));
    }
    Err(VmError::Type("value is not indexable".into()))
}

pub fn op_index_set(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop();
    let index = vm.pop();
    let container = vm.pop();
    if !container.is_obj() {
        return Err(VmError::Type("value does not support index assignment".into()));
    }
    let obj = unsafe { container.as_obj().as_ref() };

    if let Some(arr) = obj.as_array() {
        let idx = as_index(index)?;
        if !arr.borrow_mut().set(idx, value) {
            return Err(VmError::Bounds(format!("array index {idx} out of bounds")));
        }
        return vm.push(value);
    }
    if let Some(dict) = obj.as_dict() {
        let key = as_key(vm, index)?;
        dict.borrow_mut().set(&key, value);
        return vm.push(value);
    }
    Err(VmError::Type("value does not support index assignment".into()))
}

pub fn op_len(vm: &mut Vm) -> VmResult<()> {
    let container = vm.pop();
    if !container.is_obj() {
        return Err(VmError::Type("value has no length".into()));
    }
    let obj = unsafe { container.as_obj().as_ref() };
    let len = if let Some(arr) = obj.as_array() {
        arr.borrow().len()
    } else if let Some(dict) = obj.as_dict() {
        dict.borrow().len()
    } else if let Some(s) = obj.as_string() {
        s.as_str().chars().count()
    } else if let Some(range) = obj.as_range() {
        let r = range.get();
        (r.end - r.start).max(0) as usize
    } else if let Some(b) = obj.as_bytes() {
        b.borrow().len()
    } else {
        return Err(VmError::Type("value has no length".into()));
    };
    vm.push(Value::int(len as i32))
}

pub fn op_array_push(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop();
    let container = vm.pop();
    let arr = unsafe { container.as_obj().as_ref() }
        .as_array()
        .ok_or_else(|| VmError::Type("push target is not an array".into()))?;
    arr.borrow_mut().push(value);
    vm.push(container)
}

pub fn op_array_pop(vm: &mut Vm) -> VmResult<()> {
    let container = vm.pop();
    let arr = unsafe { container.as_obj().as_ref() }
        .as_array()
        .ok_or_else(|| VmError::Type("pop target is not an array".into()))?;
    let value = arr
        .borrow_mut()
        .pop()
        .ok_or_else(|| VmError::Bounds("pop from an empty array".into()))?;
    vm.push(value)
}

pub fn op_dict_set(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop();
    let key = vm.pop();
    let container = vm.pop();
    let key = as_key(vm, key)?;
    let dict = unsafe { container.as_obj().as_ref() }
        .as_dict()
        .ok_or_else(|| VmError::Type("set target is not a dict".into()))?;
    dict.borrow_mut().set(&key, value);
    vm.push(container)
}
