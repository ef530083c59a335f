//! Generators and promises (spec §4.9).
//!
//! `resume` swaps the VM's active stack for the generator's private one and
//! pushes a single temporary frame for the generator body, then drives
//! `Vm::execute_opcode` in a loop exactly like the top-level `run()` loop
//! does. A nested call the generator body makes pushes and pops its own
//! frames on the same `vm.frames` the way any other call does, and fully
//! unwinds before the next instruction runs — so by the time anything
//! suspends (`OP_YIELD`) or the body returns, `vm.frames` is back down to
//! exactly the one frame this function pushed. That lets ordinary function
//! calls inside a generator body work with no special-casing at all.

use crate::error::{VmError, VmResult};
use crate::frame::CallFrame;
use crate::opcode::OpCode;
use crate::vm::{ControlSignal, Vm};
use pseudo_core::objects::{GeneratorObj, GeneratorState, PromiseState};
use pseudo_core::Value;

/// The result of one `next`/`send` step (spec §4.9).
struct GenStep {
    value: Value,
    done: bool,
}

fn push_step_result(vm: &mut Vm, step: GenStep) -> VmResult<()> {
    let ptr = vm.heap.alloc_array(vec![step.value, Value::bool(step.done)]);
    vm.push(Value::obj(ptr))
}

/// `OP_GENERATOR`: allocates a generator over the closure on top of the stack.
pub fn op_generator(vm: &mut Vm) -> VmResult<()> {
    let closure_val = vm.pop();
    let closure_ptr = closure_val.as_obj();
    let closure = unsafe { closure_ptr.as_ref() }
        .as_closure()
        .ok_or_else(|| VmError::Type("OP_GENERATOR operand must be a closure".into()))?;
    let function = unsafe { closure.function.as_ref() }.as_function().unwrap();
    let ptr = vm.heap.alloc_generator(GeneratorObj::new(closure_ptr, function.code_start));
    vm.push(Value::obj(ptr))
}

fn resume(vm: &mut Vm, gen_ptr: std::ptr::NonNull<pseudo_core::Obj>, sent: Option<Value>) -> VmResult<GenStep> {
    let gen = unsafe { gen_ptr.as_ref() }.as_generator().unwrap();

    {
        let g = gen.borrow();
        match g.state {
            GeneratorState::Closed => return Ok(GenStep { value: Value::NIL, done: true }),
            GeneratorState::Running => {
                return Err(VmError::Type("generator is already running".into()));
            }
            GeneratorState::Created | GeneratorState::Suspended => {}
        }
    }

    let (mut gen_stack, closure_ptr, resume_ip, is_first) = {
        let mut g = gen.borrow_mut();
        let is_first = g.state == GeneratorState::Created;
        g.state = GeneratorState::Running;
        (std::mem::take(&mut g.stack), g.closure, g.saved_ip, is_first)
    };

    if is_first {
        gen_stack.push(Value::NIL);
    } else if let Some(sent_value) = sent {
        gen_stack.push(sent_value);
    }

    let caller_stack = std::mem::replace(&mut vm.stack, gen_stack);
    let function_ptr = unsafe { closure_ptr.as_ref() }.as_closure().unwrap().function;
    vm.frames.push(CallFrame::new(function_ptr, Some(closure_ptr), resume_ip, 0, false));
    let entry_depth = vm.frames.len();

    let outcome = loop {
        vm.record_instruction();
        let byte = vm.read_byte();
        let op = match OpCode::from_byte(byte) {
            Some(op) => op,
            None => break Err(VmError::Type(format!("unknown opcode {byte}"))),
        };
        match vm.execute_opcode(op) {
            Ok(ControlSignal::Continue) => {
                if vm.frames.len() < entry_depth {
                    let value = vm.pop();
                    break Ok(GenStep { value, done: true });
                }
            }
            Ok(ControlSignal::Halt(value)) => break Ok(GenStep { value, done: true }),
            Ok(ControlSignal::Yield(value)) => break Ok(GenStep { value, done: false }),
            Err(e) => break Err(e),
        }
    };

    match &outcome {
        Ok(step) if !step.done => {
            let saved_ip = vm.current_frame().ip;
            vm.frames.pop();
            let mut g = gen.borrow_mut();
            g.stack = std::mem::replace(&mut vm.stack, caller_stack);
            g.saved_ip = saved_ip;
            g.state = GeneratorState::Suspended;
        }
        _ => {
            // Covers a normal return (already popped its own frame) as well
            // as `OP_HALT`/an error firing mid-body, which leave the
            // generator's frame (and any it never got to pop) still on the
            // stack; trimming back to `entry_depth - 1` always restores
            // exactly the caller's frames regardless of which case it was.
            vm.frames.truncate(entry_depth - 1);
            vm.stack = caller_stack;
            gen.borrow_mut().state = GeneratorState::Closed;
        }
    }

    outcome
}

pub fn op_gen_next(vm: &mut Vm) -> VmResult<()> {
    let gen_val = vm.pop();
    let gen_ptr = gen_val.as_obj();
    if unsafe { gen_ptr.as_ref() }.as_generator().is_none() {
        return Err(VmError::Type("OP_GEN_NEXT operand must be a generator".into()));
    }
    let step = resume(vm, gen_ptr, None)?;
    push_step_result(vm, step)
}

pub fn op_gen_send(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop();
    let gen_val = vm.pop();
    let gen_ptr = gen_val.as_obj();
    if unsafe { gen_ptr.as_ref() }.as_generator().is_none() {
        return Err(VmError::Type("OP_GEN_SEND operand must be a generator".into()));
    }
    let step = resume(vm, gen_ptr, Some(value))?;
    push_step_result(vm, step)
}

/// `OP_YIELD`: pops the yielded value and suspends the generator body. Only
/// meaningful while `resume` is driving the dispatch loop; at the top level
/// `run()` treats a stray `Yield` signal as a dispatcher bug.
pub fn op_yield(vm: &mut Vm) -> VmResult<ControlSignal> {
    let value = vm.pop();
    Ok(ControlSignal::Yield(value))
}

pub fn op_promise(vm: &mut Vm) -> VmResult<()> {
    let ptr = vm.heap.alloc_promise();
    vm.push(Value::obj(ptr))
}

fn as_promise(v: Value) -> VmResult<std::ptr::NonNull<pseudo_core::Obj>> {
    if !v.is_obj() {
        return Err(VmError::Type("value is not a promise".into()));
    }
    let ptr = v.as_obj();
    if unsafe { ptr.as_ref() }.as_promise().is_none() {
        return Err(VmError::Type("value is not a promise".into()));
    }
    Ok(ptr)
}

pub fn op_resolve(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop();
    let promise_val = vm.pop();
    let ptr = as_promise(promise_val)?;
    let promise = unsafe { ptr.as_ref() }.as_promise().unwrap();
    promise.borrow_mut().resolve(value);
    vm.push(promise_val)
}

pub fn op_reject(vm: &mut Vm) -> VmResult<()> {
    let value = vm.pop();
    let promise_val = vm.pop();
    let ptr = as_promise(promise_val)?;
    let promise = unsafe { ptr.as_ref() }.as_promise().unwrap();
    promise.borrow_mut().reject(value);
    vm.push(promise_val)
}

/// `OP_AWAIT` (spec §4.9): resolved promises yield their result; rejected
/// promises raise an exception through the same handler-stack unwind
/// `OP_THROW` uses; pending promises yield `nil` (no scheduler runs here).
pub fn op_await(vm: &mut Vm) -> VmResult<()> {
    let promise_val = vm.pop();
    let ptr = as_promise(promise_val)?;
    let promise = unsafe { ptr.as_ref() }.as_promise().unwrap();
    let (state, result) = {
        let p = promise.borrow();
        (p.state, p.result)
    };
    match state {
        PromiseState::Resolved => vm.push(result),
        PromiseState::Pending => vm.push(Value::NIL),
        PromiseState::Rejected => crate::exceptions::raise(vm, result),
    }
}
