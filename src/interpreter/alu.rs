//! Arithmetic and comparison with numeric coercion
//!
//! Operand order: the left operand comes from the instruction's register,
//! the right operand from `r0` — the compiler evaluates left-to-right and
//! parks the left side. Mixed int/double operands widen to double; `ADD`
//! additionally concatenates strings.

use super::Interpreter;
use crate::bytecode::Opcode;
use crate::consts::REG_RET;
use crate::error::RuntimeError;
use crate::value::{Value, ValueKind};

/// Outcome of coercing two operands for one numeric operation.
enum Coerced {
    Int(i64, i64),
    Double(f64, f64),
}

fn coerce(lhs: Value, rhs: Value) -> Option<Coerced> {
    match (lhs.kind, rhs.kind) {
        (ValueKind::Int(a), ValueKind::Int(b)) => Some(Coerced::Int(a, b)),
        (ValueKind::Int(a), ValueKind::Double(b)) => Some(Coerced::Double(a as f64, b)),
        (ValueKind::Double(a), ValueKind::Int(b)) => Some(Coerced::Double(a, b as f64)),
        (ValueKind::Double(a), ValueKind::Double(b)) => Some(Coerced::Double(a, b)),
        _ => None,
    }
}

impl Interpreter {
    /// `ADD`: string concatenation or numeric addition.
    pub(crate) fn op_add(&mut self, arg: u32) -> Result<(), RuntimeError> {
        let lhs = self.register(arg)?;
        let rhs = self.registers[REG_RET];

        if let (ValueKind::Str(a), ValueKind::Str(b)) = (lhs.kind, rhs.kind) {
            let joined = [self.str_value_bytes(a), self.str_value_bytes(b)].concat();
            self.registers[REG_RET] = self.alloc_str_value(&joined)?;
            return Ok(());
        }

        self.registers[REG_RET] = match coerce(lhs, rhs) {
            Some(Coerced::Int(a, b)) => Value::int(a.wrapping_add(b)),
            Some(Coerced::Double(a, b)) => Value::double(a + b),
            None => return Err(Self::type_error("+", lhs, rhs)),
        };
        Ok(())
    }

    /// `SUB`, `MUL`, `DIV`.
    pub(crate) fn op_arith(&mut self, op: Opcode, arg: u32) -> Result<(), RuntimeError> {
        let lhs = self.register(arg)?;
        let rhs = self.registers[REG_RET];
        let glyph = match op {
            Opcode::Sub => "-",
            Opcode::Mul => "*",
            _ => "/",
        };
        let coerced = coerce(lhs, rhs).ok_or_else(|| Self::type_error(glyph, lhs, rhs))?;

        self.registers[REG_RET] = match (op, coerced) {
            (Opcode::Sub, Coerced::Int(a, b)) => Value::int(a.wrapping_sub(b)),
            (Opcode::Sub, Coerced::Double(a, b)) => Value::double(a - b),
            (Opcode::Mul, Coerced::Int(a, b)) => Value::int(a.wrapping_mul(b)),
            (Opcode::Mul, Coerced::Double(a, b)) => Value::double(a * b),
            (_, Coerced::Int(a, b)) => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Value::int(a.wrapping_div(b))
            }
            (_, Coerced::Double(a, b)) => Value::double(a / b),
        };
        Ok(())
    }

    /// `LT` / `GT`: numeric-only ordering.
    pub(crate) fn op_compare(&mut self, op: Opcode, arg: u32) -> Result<(), RuntimeError> {
        let lhs = self.register(arg)?;
        let rhs = self.registers[REG_RET];
        let glyph = if op == Opcode::Lt { "<" } else { ">" };
        let (a, b) = match coerce(lhs, rhs) {
            Some(Coerced::Int(a, b)) => (a as f64, b as f64),
            Some(Coerced::Double(a, b)) => (a, b),
            None => return Err(Self::type_error(glyph, lhs, rhs)),
        };
        let outcome = if op == Opcode::Lt { a < b } else { a > b };
        self.registers[REG_RET] = Value::bool(outcome);
        Ok(())
    }
}
