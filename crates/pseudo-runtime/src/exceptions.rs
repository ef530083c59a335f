//! Handler stack, `OP_TRY`/`OP_TRY_END`/`OP_THROW`/`OP_CATCH` (spec §4.8).
//!
//! A throw with no active handler is not caught internally at all — it
//! surfaces as the ordinary `VmError::UnhandledException` path `run()`
//! already propagates for every other runtime fault (spec §7).

use crate::error::{VmError, VmResult};
use crate::frame::{Handler, HANDLERS_MAX};
use crate::upvalues;
use crate::vm::Vm;
use pseudo_core::Value;

pub fn op_try(vm: &mut Vm) -> VmResult<()> {
    let offset = vm.read_u16();
    if vm.handlers.len() >= HANDLERS_MAX {
        return Err(VmError::HandlerStackOverflow);
    }
    let catch_ip = vm.current_frame().ip + offset as usize;
    vm.handlers.push(Handler {
        catch_ip,
        saved_sp: vm.stack_len(),
        saved_frame_count: vm.frame_count(),
    });
    Ok(())
}

pub fn op_try_end(vm: &mut Vm) -> VmResult<()> {
    vm.handlers
        .pop()
        .expect("OP_TRY_END with no active handler");
    Ok(())
}

pub fn op_throw(vm: &mut Vm) -> VmResult<()> {
    let exception = vm.pop();
    raise(vm, exception)
}

/// Unwinds to the nearest handler and resumes there, or fails the whole
/// program if none is active. Shared with `OP_AWAIT` on a rejected promise
/// (spec §4.9: "on REJECTED, raises an exception").
pub(crate) fn raise(vm: &mut Vm, exception: Value) -> VmResult<()> {
    let handler = match vm.handlers.pop() {
        Some(h) => h,
        None => return Err(VmError::UnhandledException(format!("{exception:?}"))),
    };
    upvalues::close(vm.stack_slice(..), &mut vm.open_upvalues, handler.saved_sp);
    vm.truncate_frames(handler.saved_frame_count);
    vm.truncate_stack(handler.saved_sp);
    vm.set_current_exception(exception);
    vm.current_frame_mut().ip = handler.catch_ip;
    Ok(())
}

pub fn op_catch(vm: &mut Vm) -> VmResult<()> {
    let exception = vm.take_current_exception();
    vm.push(exception)
}
