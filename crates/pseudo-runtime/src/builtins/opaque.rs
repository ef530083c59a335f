//! Dispatch points for the builtins whose algorithm bodies are explicitly out
//! of scope (spec §1 OUT OF SCOPE: "Tensor/matrix/autograd kernels, HTTP/
//! regex/hashing/base64/JSON helpers: the VM dispatches to these as opaque
//! builtins; their internal algorithms are not part of the core").
//!
//! These trampolines exist so `OP_CALL` has somewhere real to dispatch to —
//! exactly like `trace::TraceHooks::lookup` always misses until a host
//! attaches a real compiler, calling one of these always returns `nil`
//! until a host wires in the actual kernel. No in-scope opcode or invariant
//! depends on what these return.

use crate::error::VmResult;
use crate::vm::Vm;
use pseudo_core::Value;

macro_rules! opaque_builtin {
    ($name:ident) => {
        pub fn $name(_vm: &mut Vm, _args: &[Value]) -> VmResult<Value> {
            Ok(Value::NIL)
        }
    };
}

opaque_builtin!(tensor_new);
opaque_builtin!(tensor_matmul);
opaque_builtin!(tensor_grad);
opaque_builtin!(http_get);
opaque_builtin!(http_post);
opaque_builtin!(regex_match);
opaque_builtin!(regex_replace);
opaque_builtin!(sha256);
opaque_builtin!(base64_encode);
opaque_builtin!(base64_decode);
opaque_builtin!(json_parse);
opaque_builtin!(json_stringify);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_builtins_are_nil_until_a_host_attaches_a_real_kernel() {
        let mut vm = Vm::new();
        assert!(tensor_matmul(&mut vm, &[]).unwrap().is_nil());
        assert!(json_parse(&mut vm, &[Value::NIL]).unwrap().is_nil());
    }
}
