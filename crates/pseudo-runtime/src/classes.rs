//! Classes, instances, fields, methods, and inline-cached dispatch (spec
//! §4.7).
//!
//! The non-cached opcodes (`OP_GET_FIELD`/`OP_SET_FIELD`/`OP_INVOKE`/...) are
//! also the cache-miss path the `*_IC`/`*_PIC` forms fall back to, so the
//! resolution logic lives once here and the cached opcodes just consult the
//! cache first.

use crate::cache::CacheEntry;
use crate::calls;
use crate::error::{VmError, VmResult};
use crate::vm::Vm;
use pseudo_core::objects::BoundMethodObj;
use pseudo_core::{Obj, Value};
use std::ptr::NonNull;

fn read_name(vm: &mut Vm) -> Box<str> {
    let idx = vm.read_byte() as usize;
    let value = vm.chunk_constant(idx);
    unsafe { value.as_obj().as_ref() }
        .as_string()
        .expect("name operand must reference a string constant")
        .as_str()
        .into()
}

fn undefined_property(name: &str) -> VmError {
    VmError::Type(format!("undefined property '{name}'"))
}

pub fn op_class(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ptr = vm.heap.alloc_class(name);
    vm.push(Value::obj(ptr))
}

/// `OP_INHERIT`: stack is `[..., superclass, subclass]`; the superclass is
/// consumed, the subclass ends up back on top.
pub fn op_inherit(vm: &mut Vm) -> VmResult<()> {
    let subclass_val = vm.pop();
    let superclass_val = vm.pop();
    let super_ptr = superclass_val.as_obj();
    let super_class = unsafe { super_ptr.as_ref() }
        .as_class()
        .ok_or_else(|| VmError::Type("superclass must be a class".into()))?;
    let sub_ptr = subclass_val.as_obj();
    let sub_class = unsafe { sub_ptr.as_ref() }
        .as_class()
        .ok_or_else(|| VmError::Type("OP_INHERIT target must be a class".into()))?;
    sub_class.borrow_mut().inherit_from(&super_class.borrow());
    sub_class.borrow_mut().superclass = Some(super_ptr);
    vm.push(subclass_val)
}

pub fn op_method(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let method = vm.pop();
    let class_val = vm.peek(0);
    let class = unsafe { class_val.as_obj().as_ref() }
        .as_class()
        .expect("OP_METHOD target must be a class");
    class.borrow_mut().define_method(&name, method);
    Ok(())
}

pub fn op_field(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let class_val = vm.peek(0);
    let class = unsafe { class_val.as_obj().as_ref() }
        .as_class()
        .expect("OP_FIELD target must be a class");
    class
        .borrow_mut()
        .declare_field(&name)
        .ok_or_else(|| VmError::Bounds("class field table is full".into()))?;
    Ok(())
}

/// `OP_CALL` on a class value (spec §4.7 "Instance construction").
pub fn construct_instance(vm: &mut Vm, class_ptr: NonNull<Obj>, arg_count: usize) -> VmResult<()> {
    let instance_ptr = vm.heap.alloc_instance(class_ptr);
    let depth = vm.stack_len() - 1 - arg_count;
    vm.set_stack_at(depth, Value::obj(instance_ptr));

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let init = class.borrow().method("init");
    match init {
        Some(init_val) => {
            let obj = unsafe { init_val.as_obj().as_ref() };
            let closure = obj
                .as_closure()
                .expect("a class method value must be a closure");
            calls::push_frame(vm, closure.function, Some(init_val.as_obj()), arg_count, true)
        }
        None => {
            if arg_count != 0 {
                return Err(VmError::Type(format!(
                    "expected 0 arguments but got {arg_count}"
                )));
            }
            Ok(())
        }
    }
}

fn resolve_field_or_method(
    vm: &mut Vm,
    receiver: Value,
    name: &str,
) -> VmResult<Value> {
    if !receiver.is_obj() {
        return Err(VmError::Type("only instances have fields".into()));
    }
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances have fields".into()))?;
    let class_ptr = inst.borrow().class;
    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let class_ref = class.borrow();
    if let Some(slot) = class_ref.field_slot(name) {
        return Ok(inst.borrow().get(slot));
    }
    if let Some(method) = class_ref.method(name) {
        let bound = vm
            .heap
            .alloc_bound_method(BoundMethodObj::new(receiver, method.as_obj()));
        return Ok(Value::obj(bound));
    }
    Err(undefined_property(name))
}

pub fn op_get_field(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let receiver = vm.pop();
    let value = resolve_field_or_method(vm, receiver, &name)?;
    vm.push(value)
}

pub fn op_set_field(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let value = vm.pop();
    let receiver = vm.pop();
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances have fields".into()))?;
    let class_ptr = inst.borrow().class;
    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let slot = class
        .borrow()
        .field_slot(&name)
        .or_else(|| class.borrow_mut().declare_field(&name))
        .ok_or_else(|| VmError::Bounds("class field table is full".into()))?;
    inst.borrow_mut().set(slot, value);
    vm.push(value)
}

pub fn op_get_field_ic(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ic_slot = vm.read_byte() as usize;
    let receiver = vm.pop();
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances have fields".into()))?;
    let class_ptr = inst.borrow().class;

    if let Some(entry) = vm.caches_mono(ic_slot).lookup(class_ptr) {
        let value = field_or_bound_method(vm, receiver, class_ptr, entry)?;
        return vm.push(value);
    }

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let class_ref = class.borrow();
    if let Some(slot) = class_ref.field_slot(&name) {
        drop(class_ref);
        vm.caches_mono(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot,
            is_method: false,
        });
        return vm.push(inst.borrow().get(slot));
    }
    if let Some(method_slot) = class_ref.method_names.iter().position(|n| &**n == &*name) {
        let method = class_ref.methods[method_slot];
        drop(class_ref);
        vm.caches_mono(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot: method_slot as u16,
            is_method: true,
        });
        let bound = vm
            .heap
            .alloc_bound_method(BoundMethodObj::new(receiver, method.as_obj()));
        return vm.push(Value::obj(bound));
    }
    Err(undefined_property(&name))
}

fn field_or_bound_method(
    vm: &mut Vm,
    receiver: Value,
    class_ptr: NonNull<Obj>,
    entry: CacheEntry,
) -> VmResult<Value> {
    if entry.is_method {
        let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
        let method = class.borrow().methods[entry.slot as usize];
        let bound = vm
            .heap
            .alloc_bound_method(BoundMethodObj::new(receiver, method.as_obj()));
        Ok(Value::obj(bound))
    } else {
        let inst = unsafe { receiver.as_obj().as_ref() }.as_instance().unwrap();
        Ok(inst.borrow().get(entry.slot))
    }
}

pub fn op_get_field_pic(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ic_slot = vm.read_byte() as usize;
    let receiver = vm.pop();
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances have fields".into()))?;
    let class_ptr = inst.borrow().class;

    if let Some(entry) = vm.caches_poly(ic_slot).lookup(class_ptr) {
        let value = field_or_bound_method(vm, receiver, class_ptr, entry)?;
        return vm.push(value);
    }

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let class_ref = class.borrow();
    if let Some(slot) = class_ref.field_slot(&name) {
        drop(class_ref);
        vm.caches_poly(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot,
            is_method: false,
        });
        return vm.push(inst.borrow().get(slot));
    }
    if let Some(method_slot) = class_ref.method_names.iter().position(|n| &**n == &*name) {
        let method = class_ref.methods[method_slot];
        drop(class_ref);
        vm.caches_poly(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot: method_slot as u16,
            is_method: true,
        });
        let bound = vm
            .heap
            .alloc_bound_method(BoundMethodObj::new(receiver, method.as_obj()));
        return vm.push(Value::obj(bound));
    }
    Err(undefined_property(&name))
}

pub fn op_set_field_ic(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ic_slot = vm.read_byte() as usize;
    let value = vm.pop();
    let receiver = vm.pop();
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances have fields".into()))?;
    let class_ptr = inst.borrow().class;

    if let Some(entry) = vm.caches_mono(ic_slot).lookup(class_ptr) {
        inst.borrow_mut().set(entry.slot, value);
        return vm.push(value);
    }

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let slot = class
        .borrow()
        .field_slot(&name)
        .or_else(|| class.borrow_mut().declare_field(&name))
        .ok_or_else(|| VmError::Bounds("class field table is full".into()))?;
    vm.caches_mono(ic_slot).store(CacheEntry {
        class: class_ptr,
        slot,
        is_method: false,
    });
    inst.borrow_mut().set(slot, value);
    vm.push(value)
}

pub fn op_set_field_pic(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ic_slot = vm.read_byte() as usize;
    let value = vm.pop();
    let receiver = vm.pop();
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances have fields".into()))?;
    let class_ptr = inst.borrow().class;

    if let Some(entry) = vm.caches_poly(ic_slot).lookup(class_ptr) {
        inst.borrow_mut().set(entry.slot, value);
        return vm.push(value);
    }

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let slot = class
        .borrow()
        .field_slot(&name)
        .or_else(|| class.borrow_mut().declare_field(&name))
        .ok_or_else(|| VmError::Bounds("class field table is full".into()))?;
    vm.caches_poly(ic_slot).store(CacheEntry {
        class: class_ptr,
        slot,
        is_method: false,
    });
    inst.borrow_mut().set(slot, value);
    vm.push(value)
}

fn invoke_by_name(vm: &mut Vm, receiver: Value, name: &str, arg_count: usize) -> VmResult<()> {
    if !receiver.is_obj() {
        return Err(VmError::Type("only instances support method calls".into()));
    }
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances support method calls".into()))?;
    let class_ptr = inst.borrow().class;
    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let class_ref = class.borrow();
    if let Some(slot) = class_ref.field_slot(name) {
        let field_value = inst.borrow().get(slot);
        drop(class_ref);
        return calls::call_value(vm, field_value, arg_count);
    }
    if let Some(method) = class_ref.method(name) {
        drop(class_ref);
        let closure = unsafe { method.as_obj().as_ref() }
            .as_closure()
            .expect("a class method value must be a closure");
        return calls::push_frame(vm, closure.function, Some(method.as_obj()), arg_count, false);
    }
    Err(undefined_property(name))
}

pub fn op_invoke(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let arg_count = vm.read_byte() as usize;
    let receiver = vm.peek(arg_count);
    invoke_by_name(vm, receiver, &name, arg_count)
}

pub fn op_invoke_ic(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ic_slot = vm.read_byte() as usize;
    let arg_count = vm.read_byte() as usize;
    let receiver = vm.peek(arg_count);
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances support method calls".into()))?;
    let class_ptr = inst.borrow().class;

    if let Some(entry) = vm.caches_mono(ic_slot).lookup(class_ptr) {
        return dispatch_cached_invoke(vm, receiver, class_ptr, entry, arg_count);
    }

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let class_ref = class.borrow();
    if let Some(slot) = class_ref.field_slot(&name) {
        drop(class_ref);
        vm.caches_mono(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot,
            is_method: false,
        });
        let field_value = inst.borrow().get(slot);
        return calls::call_value(vm, field_value, arg_count);
    }
    if let Some(method_slot) = class_ref.method_names.iter().position(|n| &**n == &*name) {
        let method = class_ref.methods[method_slot];
        drop(class_ref);
        vm.caches_mono(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot: method_slot as u16,
            is_method: true,
        });
        let closure = unsafe { method.as_obj().as_ref() }
            .as_closure()
            .expect("a class method value must be a closure");
        return calls::push_frame(vm, closure.function, Some(method.as_obj()), arg_count, false);
    }
    Err(undefined_property(&name))
}

pub fn op_invoke_pic(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let ic_slot = vm.read_byte() as usize;
    let arg_count = vm.read_byte() as usize;
    let receiver = vm.peek(arg_count);
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("only instances support method calls".into()))?;
    let class_ptr = inst.borrow().class;

    if let Some(entry) = vm.caches_poly(ic_slot).lookup(class_ptr) {
        return dispatch_cached_invoke(vm, receiver, class_ptr, entry, arg_count);
    }

    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    let class_ref = class.borrow();
    if let Some(slot) = class_ref.field_slot(&name) {
        drop(class_ref);
        vm.caches_poly(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot,
            is_method: false,
        });
        let field_value = inst.borrow().get(slot);
        return calls::call_value(vm, field_value, arg_count);
    }
    if let Some(method_slot) = class_ref.method_names.iter().position(|n| &**n == &*name) {
        let method = class_ref.methods[method_slot];
        drop(class_ref);
        vm.caches_poly(ic_slot).store(CacheEntry {
            class: class_ptr,
            slot: method_slot as u16,
            is_method: true,
        });
        let closure = unsafe { method.as_obj().as_ref() }
            .as_closure()
            .expect("a class method value must be a closure");
        return calls::push_frame(vm, closure.function, Some(method.as_obj()), arg_count, false);
    }
    Err(undefined_property(&name))
}

fn dispatch_cached_invoke(
    vm: &mut Vm,
    receiver: Value,
    class_ptr: NonNull<Obj>,
    entry: CacheEntry,
    arg_count: usize,
) -> VmResult<()> {
    if entry.is_method {
        let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
        let method = class.borrow().methods[entry.slot as usize];
        let closure = unsafe { method.as_obj().as_ref() }
            .as_closure()
            .expect("a class method value must be a closure");
        calls::push_frame(vm, closure.function, Some(method.as_obj()), arg_count, false)
    } else {
        let inst = unsafe { receiver.as_obj().as_ref() }.as_instance().unwrap();
        let field_value = inst.borrow().get(entry.slot);
        calls::call_value(vm, field_value, arg_count)
    }
}

fn superclass_of(receiver: Value) -> VmResult<NonNull<Obj>> {
    let inst = unsafe { receiver.as_obj().as_ref() }
        .as_instance()
        .ok_or_else(|| VmError::Type("'super' may only be used on instances".into()))?;
    let class_ptr = inst.borrow().class;
    let class = unsafe { class_ptr.as_ref() }.as_class().unwrap();
    class
        .borrow()
        .superclass
        .ok_or_else(|| VmError::Type("class has no superclass".into()))
}

pub fn op_get_super(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let receiver = vm.pop();
    let super_ptr = superclass_of(receiver)?;
    let super_class = unsafe { super_ptr.as_ref() }.as_class().unwrap();
    let method = super_class
        .borrow()
        .method(&name)
        .ok_or_else(|| undefined_property(&name))?;
    let bound = vm
        .heap
        .alloc_bound_method(BoundMethodObj::new(receiver, method.as_obj()));
    vm.push(Value::obj(bound))
}

pub fn op_super_invoke(vm: &mut Vm) -> VmResult<()> {
    let name = read_name(vm);
    let arg_count = vm.read_byte() as usize;
    let receiver = vm.peek(arg_count);
    let super_ptr = superclass_of(receiver)?;
    let super_class = unsafe { super_ptr.as_ref() }.as_class().unwrap();
    let method = super_class
        .borrow()
        .method(&name)
        .ok_or_else(|| undefined_property(&name))?;
    let closure = unsafe { method.as_obj().as_ref() }
        .as_closure()
        .expect("a class method value must be a closure");
    calls::push_frame(vm, closure.function, Some(method.as_obj()), arg_count, false)
}
