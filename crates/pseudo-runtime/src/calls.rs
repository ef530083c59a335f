//! Function invocation: calls, tail calls, closures, returns (spec §4.6).

use crate::classes;
use crate::error::{VmError, VmResult};
use crate::frame::{CallFrame, FRAMES_MAX};
use crate::upvalues;
use crate::vm::Vm;
use pseudo_core::objects::ClosureObj;
use pseudo_core::{Obj, Value};
use std::ptr::NonNull;

/// What happened after `OP_RETURN`: either the VM keeps running the caller,
/// or the top-level frame just returned and `run()` should stop.
pub enum ReturnSignal {
    Continue,
    Halt(Value),
}

fn function_of(ptr: NonNull<Obj>) -> &'static pseudo_core::objects::FunctionObj {
    unsafe { ptr.as_ref() }
        .as_function()
        .expect("expected a Function object")
}

/// Pushes a new call frame for `function_ptr`, whose callee+args already sit
/// on top of the stack (`OP_CALL`'s contract).
pub(crate) fn push_frame(
    vm: &mut Vm,
    function_ptr: NonNull<Obj>,
    closure_ptr: Option<NonNull<Obj>>,
    arg_count: usize,
    is_init: bool,
) -> VmResult<()> {
    let arity = function_of(function_ptr).arity as usize;
    if arg_count != arity {
        return Err(VmError::Type(format!(
            "expected {arity} arguments but got {arg_count}"
        )));
    }
    if vm.frames.len() >= FRAMES_MAX {
        return Err(VmError::StackOverflow);
    }
    let bp = vm.stack.len() - arg_count - 1;
    let code_start = function_of(function_ptr).code_start;
    vm.frames.push(CallFrame::new(function_ptr, closure_ptr, code_start, bp, is_init));
    Ok(())
}

/// Resolves and invokes a callee already sitting at stack depth `arg_count`
/// (spec §4.6 `OP_CALL`): plain function, closure, class (construction), bound
/// method, or native trampoline.
pub fn call_value(vm: &mut Vm, callee: Value, arg_count: usize) -> VmResult<()> {
    if !callee.is_obj() {
        return Err(VmError::Type(
            "can only call functions, closures, classes, or methods".into(),
        ));
    }
    let ptr = callee.as_obj();
    let obj = unsafe { ptr.as_ref() };

    if obj.as_function().is_some() {
        return push_frame(vm, ptr, None, arg_count, false);
    }
    if let Some(closure) = obj.as_closure() {
        return push_frame(vm, closure.function, Some(ptr), arg_count, false);
    }
    if obj.as_class().is_some() {
        return classes::construct_instance(vm, ptr, arg_count);
    }
    if let Some(bound) = obj.as_bound_method() {
        let depth = vm.stack.len() - 1 - arg_count;
        vm.set_stack_at(depth, bound.receiver);
        return call_value(vm, Value::obj(bound.method), arg_count);
    }
    if let Some(native) = obj.as_native() {
        if !native.accepts(arg_count) {
            return Err(VmError::Type(format!(
                "wrong number of arguments to '{}'",
                native.name
            )));
        }
        let func = vm.native_fn(native.id);
        let args_start = vm.stack.len() - arg_count;
        let args: Vec<Value> = vm.stack_slice(args_start..).to_vec();
        let result = func(vm, &args)?;
        vm.truncate_stack(args_start - 1);
        return vm.push(result);
    }
    Err(VmError::Type("value is not callable".into()))
}

pub fn op_call(vm: &mut Vm) -> VmResult<()> {
    let arg_count = vm.read_byte() as usize;
    let callee = vm.peek(arg_count);
    call_value(vm, callee, arg_count)
}

/// `OP_TAIL_CALL arg_count` (spec §4.6): reuses the current frame instead of
/// pushing a new one, so `N` tail calls use one frame slot regardless of
/// `N` (testable property 8). Falls back to a regular call for callees that
/// don't reuse a frame (class construction, natives, bound methods).
pub fn op_tail_call(vm: &mut Vm) -> VmResult<()> {
    let arg_count = vm.read_byte() as usize;
    let callee = vm.peek(arg_count);
    if !callee.is_obj() {
        return Err(VmError::Type(
            "can only call functions, closures, classes, or methods".into(),
        ));
    }
    let ptr = callee.as_obj();
    let obj = unsafe { ptr.as_ref() };

    let (function_ptr, closure_ptr) = if obj.as_function().is_some() {
        (ptr, None)
    } else if let Some(closure) = obj.as_closure() {
        (closure.function, Some(ptr))
    } else {
        return call_value(vm, callee, arg_count);
    };

    let arity = function_of(function_ptr).arity as usize;
    if arg_count != arity {
        return Err(VmError::Type(format!(
            "expected {arity} arguments but got {arg_count}"
        )));
    }

    let bp = vm.current_bp();
    vm.close_upvalues_from(bp);

    let src_start = vm.stack.len() - arg_count - 1;
    for i in 0..=arg_count {
        let v = vm.stack_at(src_start + i);
        vm.set_stack_at(bp + i, v);
    }
    vm.truncate_stack(bp + arg_count + 1);

    let code_start = function_of(function_ptr).code_start;
    let frame = vm.current_frame_mut();
    frame.function = function_ptr;
    frame.closure = closure_ptr;
    frame.ip = code_start;
    frame.is_init = false;
    Ok(())
}

/// `OP_RETURN` (spec §4.6): closes upvalues above the frame's base, applies
/// the init-method return convention, and pops the frame.
pub fn op_return(vm: &mut Vm) -> VmResult<ReturnSignal> {
    let mut result = vm.pop();
    let frame = vm.pop_frame();
    vm.close_upvalues_from(frame.bp);
    if frame.is_init {
        result = vm.stack_at(frame.bp);
    }
    vm.truncate_stack(frame.bp);
    if vm.frames_empty() {
        return Ok(ReturnSignal::Halt(result));
    }
    vm.push(result)?;
    Ok(ReturnSignal::Continue)
}

/// `OP_CLOSURE const_idx; (is_local, index) * upvalue_count` (spec §4.6).
pub fn op_closure(vm: &mut Vm) -> VmResult<()> {
    let const_idx = vm.read_byte() as usize;
    let function_value = vm.chunk_constant(const_idx);
    let function_ptr = function_value.as_obj();
    let upvalue_count = function_of(function_ptr).upvalue_count;

    let mut closure_upvalues = Vec::with_capacity(upvalue_count as usize);
    for _ in 0..upvalue_count {
        let is_local = vm.read_byte() != 0;
        let index = vm.read_byte() as usize;
        if is_local {
            let bp = vm.current_bp();
            closure_upvalues.push(upvalues::capture(&mut vm.heap, &mut vm.open_upvalues, bp + index));
        } else {
            let enclosing = vm
                .current_frame()
                .closure
                .expect("non-local upvalue capture requires an enclosing closure");
            let enclosing_closure = unsafe { enclosing.as_ref() }.as_closure().unwrap();
            closure_upvalues.push(enclosing_closure.upvalues[index]);
        }
    }

    let ptr = vm.heap.alloc_closure(ClosureObj {
        function: function_ptr,
        upvalues: closure_upvalues,
    });
    vm.push(Value::obj(ptr))
}
