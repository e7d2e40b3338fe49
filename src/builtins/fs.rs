//! `std.fs` — file access
//!
//! Failures are modeled as `None`, not as runtime errors: a missing file is
//! recoverable absence from the language's point of view.

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

/// `@fs.read_file`: `Some(contents)` or `None`.
pub fn read_file(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let path = str_arg(vm, "fs.read_file", 0)?;
    let out = match std::fs::read(&path) {
        Ok(bytes) if !bytes.is_empty() => vm.alloc_str_value(&bytes)?.into_some(),
        _ => Value::NONE,
    };
    vm.set_ret(out);
    Ok(())
}

/// `@fs.write_file`: writes the content argument to the path argument.
pub fn write_file(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let path = str_arg(vm, "fs.write_file", 0)?;
    let content = match vm.arg(1).kind {
        ValueKind::Str(s) => vm.str_value_bytes(s).to_vec(),
        other => {
            return Err(RuntimeError::BuiltinType {
                name: "fs.write_file",
                expected: "str",
                got: other.type_name(),
            })
        }
    };
    let _ = std::fs::write(path, content);
    vm.set_ret(Value::NONE);
    Ok(())
}
