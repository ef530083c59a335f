//! Numeric builtins: the handful of math operations that are plain floating
//! point, not a black-boxed kernel (spec §1 OUT OF SCOPE only names
//! tensor/matrix/autograd as opaque, not scalar math).

use crate::error::{VmError, VmResult};
use crate::vm::Vm;
use pseudo_core::Value;

fn as_f64(v: Value) -> VmResult<f64> {
    if v.is_int() {
        Ok(v.as_int() as f64)
    } else if v.is_float() {
        Ok(v.as_float())
    } else {
        Err(VmError::Type("expected a number".into()))
    }
}

/// `sqrt(x)`.
pub fn sqrt(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    Ok(Value::float(as_f64(args[0])?.sqrt()))
}

/// `abs(x)`: preserves int-ness, like the VM's own `OP_NEG` does.
pub fn abs(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let v = args[0];
    if v.is_int() {
        Ok(Value::int(v.as_int().abs()))
    } else {
        Ok(Value::float(as_f64(v)?.abs()))
    }
}

/// `floor(x)`: always returns an int, truncating toward negative infinity.
pub fn floor(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    Ok(Value::int(as_f64(args[0])?.floor() as i32))
}

/// `ceil(x)`: always returns an int.
pub fn ceil(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    Ok(Value::int(as_f64(args[0])?.ceil() as i32))
}

/// `min(a, b)`.
pub fn min(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let (a, b) = (as_f64(args[0])?, as_f64(args[1])?);
    Ok(if a <= b { args[0] } else { args[1] })
}

/// `max(a, b)`.
pub fn max(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let (a, b) = (as_f64(args[0])?, as_f64(args[1])?);
    Ok(if a >= b { args[0] } else { args[1] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_of_four_is_two() {
        let mut vm = Vm::new();
        let result = sqrt(&mut vm, &[Value::int(4)]).unwrap();
        assert_eq!(result.as_float(), 2.0);
    }

    #[test]
    fn abs_preserves_int_kind() {
        let mut vm = Vm::new();
        let result = abs(&mut vm, &[Value::int(-5)]).unwrap();
        assert!(result.is_int());
        assert_eq!(result.as_int(), 5);
    }

    #[test]
    fn floor_and_ceil_truncate_toward_int() {
        let mut vm = Vm::new();
        assert_eq!(floor(&mut vm, &[Value::float(1.9)]).unwrap().as_int(), 1);
        assert_eq!(ceil(&mut vm, &[Value::float(1.1)]).unwrap().as_int(), 2);
    }
}
