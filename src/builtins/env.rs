//! `std.env` — process environment

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{Value, ValueKind};

fn str_arg(vm: &Interpreter, name: &'static str, i: usize) -> Result<String, RuntimeError> {
    match vm.arg(i).kind {
        ValueKind::Str(s) => Ok(String::from_utf8_lossy(vm.str_value_bytes(s)).into_owned()),
        other => Err(RuntimeError::BuiltinType {
            name,
            expected: "str",
            got: other.type_name(),
        }),
    }
}

/// `@env.get`: `Some(value)` for a set variable, `None` otherwise.
pub fn get(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let key = str_arg(vm, "env.get", 0)?;
    let out = match std::env::var(&key) {
        Ok(value) => vm.alloc_str_value(value.as_bytes())?.into_some(),
        Err(_) => Value::NONE,
    };
    vm.set_ret(out);
    Ok(())
}

/// `@env.set`
pub fn set(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let key = str_arg(vm, "env.set", 0)?;
    let value = str_arg(vm, "env.set", 1)?;
    std::env::set_var(key, value);
    vm.set_ret(Value::NONE);
    Ok(())
}
