//! `std.math` — arithmetic beyond the operators

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{Value, ValueKind};

/// `@math.mod`: remainder with the VM's usual numeric coercion.
pub fn modulo(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let lhs = vm.arg(0);
    let rhs = vm.arg(1);
    let out = match (lhs.kind, rhs.kind) {
        (ValueKind::Int(a), ValueKind::Int(b)) => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::int(a.wrapping_rem(b))
        }
        (ValueKind::Int(_) | ValueKind::Double(_), ValueKind::Int(_) | ValueKind::Double(_)) => {
            let a = lhs.as_double().expect("checked numeric");
            let b = rhs.as_double().expect("checked numeric");
            Value::double(a % b)
        }
        _ => {
            return Err(RuntimeError::Type {
                op: "mod",
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            })
        }
    };
    vm.set_ret(out);
    Ok(())
}
