//! `std.conv` — conversions

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{Value, ValueKind};

/// `@conv.int`: parses the argument as a signed integer, `Some(int)` on
/// success and `None` on malformed input or overflow. Leading `+`/`-` are
/// accepted.
pub fn int(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let ValueKind::Str(s) = vm.arg(0).kind else {
        return Err(RuntimeError::BuiltinType {
            name: "conv.int",
            expected: "str",
            got: vm.arg(0).type_name(),
        });
    };
    let parsed = std::str::from_utf8(vm.str_value_bytes(s))
        .ok()
        .and_then(|text| text.parse::<i64>().ok());
    vm.set_ret(match parsed {
        Some(i) => Value::int(i).into_some(),
        None => Value::NONE,
    });
    Ok(())
}
