//! Builtin-dispatch trampolines (spec §2 "Builtin dispatch", §1 OUT OF
//! SCOPE). Every builtin is a `NativeFn` registered with `Vm::register_native`
//! and bound into globals as a `NativeObj`, so `OP_CALL`/`OP_INVOKE` treat a
//! builtin exactly like a user-defined function (spec §4.6) — no separate
//! opcode family is needed for them.

pub mod io;
pub mod math;
pub mod opaque;

use crate::vm::{NativeFn, Vm};
use pseudo_core::objects::NativeObj;
use pseudo_core::Value;

/// One builtin's registration record: its global name, arity (`-1` for
/// variadic, matching `NativeObj::arity`), and trampoline.
struct Entry {
    name: &'static str,
    arity: i8,
    func: NativeFn,
}

const ENTRIES: &[Entry] = &[
    Entry { name: "sqrt", arity: 1, func: math::sqrt },
    Entry { name: "abs", arity: 1, func: math::abs },
    Entry { name: "floor", arity: 1, func: math::floor },
    Entry { name: "ceil", arity: 1, func: math::ceil },
    Entry { name: "min", arity: 2, func: math::min },
    Entry { name: "max", arity: 2, func: math::max },
    Entry { name: "print", arity: 1, func: io::print },
    Entry { name: "read_line", arity: 0, func: io::read_line },
    Entry { name: "file_slurp", arity: 1, func: io::file_slurp },
    Entry { name: "file_exists", arity: 1, func: io::file_exists },
    Entry { name: "file_write", arity: 2, func: io::file_write },
    Entry { name: "tensor_new", arity: -1, func: opaque::tensor_new },
    Entry { name: "tensor_matmul", arity: 2, func: opaque::tensor_matmul },
    Entry { name: "tensor_grad", arity: 1, func: opaque::tensor_grad },
    Entry { name: "http_get", arity: 1, func: opaque::http_get },
    Entry { name: "http_post", arity: 2, func: opaque::http_post },
    Entry { name: "regex_match", arity: 2, func: opaque::regex_match },
    Entry { name: "regex_replace", arity: 3, func: opaque::regex_replace },
    Entry { name: "sha256", arity: 1, func: opaque::sha256 },
    Entry { name: "base64_encode", arity: 1, func: opaque::base64_encode },
    Entry { name: "base64_decode", arity: 1, func: opaque::base64_decode },
    Entry { name: "json_parse", arity: 1, func: opaque::json_parse },
    Entry { name: "json_stringify", arity: 1, func: opaque::json_stringify },
];

/// Registers every builtin into `vm`'s native table and defines a global
/// binding for each, so a freshly constructed `Vm` can `OP_CALL` any of them
/// by name without the host doing anything else.
pub fn install(vm: &mut Vm) {
    for entry in ENTRIES {
        let id = vm.register_native(entry.func);
        let native_ptr = vm.heap.alloc_native(NativeObj::new(id, entry.name, entry.arity));
        vm.globals.define(entry.name, Value::obj(native_ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_binds_every_entry_as_a_global() {
        let mut vm = Vm::new();
        install(&mut vm);
        for entry in ENTRIES {
            assert!(vm.globals.contains(entry.name), "missing global '{}'", entry.name);
        }
    }
}
