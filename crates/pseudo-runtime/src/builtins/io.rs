//! I/O builtins (spec §7 "I/O failure in builtins ... NEVER raises; the
//! opcode returns `nil` or `false` as appropriate so that scripts can test
//! the return").

use crate::error::VmResult;
use crate::vm::Vm;
use pseudo_core::Value;
use std::io::Write;

fn as_str<'a>(v: &'a Value) -> Option<&'a str> {
    if !v.is_obj() {
        return None;
    }
    unsafe { v.as_obj().as_ref() }.as_string().map(|s| s.as_str())
}

/// `print(value)`: writes the value's debug rendering followed by a newline.
pub fn print(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    match as_str(&args[0]) {
        Some(s) => println!("{s}"),
        None => println!("{:?}", args[0]),
    }
    Ok(Value::NIL)
}

/// `read_line()`: returns the line with its trailing newline stripped, or
/// `nil` on EOF/read failure — I/O failures never raise (spec §7).
pub fn read_line(vm: &mut Vm, _args: &[Value]) -> VmResult<Value> {
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => Ok(Value::NIL),
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::obj(vm.heap.alloc_string(line)))
        }
        Err(_) => Ok(Value::NIL),
    }
}

/// `file_slurp(path)`: entire file contents, or `nil` if it can't be read.
pub fn file_slurp(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let Some(path) = as_str(&args[0]) else {
        return Ok(Value::NIL);
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Value::obj(vm.heap.alloc_string(contents))),
        Err(_) => Ok(Value::NIL),
    }
}

/// `file_exists(path)`.
pub fn file_exists(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let Some(path) = as_str(&args[0]) else {
        return Ok(Value::bool(false));
    };
    Ok(Value::bool(std::path::Path::new(path).exists()))
}

/// `file_write(path, contents)`: returns `true` on success, `false` on any
/// I/O failure (spec §7: builtins never raise).
pub fn file_write(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let (Some(path), Some(contents)) = (as_str(&args[0]), as_str(&args[1])) else {
        return Ok(Value::bool(false));
    };
    let ok = std::fs::File::create(path)
        .and_then(|mut f| f.write_all(contents.as_bytes()))
        .is_ok();
    Ok(Value::bool(ok))
}
