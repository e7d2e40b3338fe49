//! `std.opt` — option values
//!
//! `Some(x)` shares storage with `x`; these builtins only flip and inspect
//! the overlay flag.

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{Value, ValueKind};

/// `@Some`: wraps the argument.
pub fn some(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    vm.set_ret(v.into_some());
    Ok(())
}

/// `@None`: the absent value.
pub fn none(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    vm.set_ret(Value::NONE);
    Ok(())
}

/// `@opt.or`: the wrapped value, or the fallback when absent.
pub fn or(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let lhs = vm.arg(0);
    let rhs = vm.arg(1);
    if !lhs.is_option() {
        return Err(RuntimeError::BuiltinType {
            name: "opt.or",
            expected: "option",
            got: lhs.type_name(),
        });
    }
    vm.set_ret(if lhs.some { lhs.unwrapped() } else { rhs });
    Ok(())
}

/// `@opt.unwrap`: the wrapped value; aborts on `None`.
pub fn unwrap(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    if matches!(v.kind, ValueKind::None) {
        return Err(RuntimeError::Assertion(
            "unwrap called on a Option::None value".into(),
        ));
    }
    if !v.some {
        return Err(RuntimeError::Assertion(
            "attempted to unwrap a non optional value".into(),
        ));
    }
    vm.set_ret(v.unwrapped());
    Ok(())
}

/// `@opt.expect`: like `unwrap`, with a caller-provided message.
pub fn expect(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    let msg = vm.arg(1);
    if !v.some {
        return Err(RuntimeError::Assertion(vm.display_value(msg)));
    }
    vm.set_ret(v.unwrapped());
    Ok(())
}

/// `@opt.is_some`
pub fn is_some(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    vm.set_ret(Value::bool(v.some));
    Ok(())
}

/// `@opt.is_none`
pub fn is_none(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    vm.set_ret(Value::bool(!v.some && matches!(v.kind, ValueKind::None)));
    Ok(())
}
