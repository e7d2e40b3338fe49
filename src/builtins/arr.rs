//! `std.arr` — array construction

use crate::error::RuntimeError;
use crate::heap::List;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn int_arg(vm: &Interpreter, name: &'static str, i: usize) -> Result<i64, RuntimeError> {
    vm.arg(i).as_int().ok_or(RuntimeError::BuiltinType {
        name,
        expected: "number",
        got: vm.arg(i).type_name(),
    })
}

/// `@arr.range`: the integers `[start, end)` as an array; empty when
/// `end < start`.
pub fn range(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let start = int_arg(vm, "arr.range", 0)?;
    let end = int_arg(vm, "arr.range", 1)?;
    let list = if end < start {
        List::new()
    } else {
        (start..end).map(Value::int).collect()
    };
    let out = vm.alloc_list_value(list)?;
    vm.set_ret(out);
    Ok(())
}

/// `@arr.new`: an empty array preallocated for the given element count.
pub fn new(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let cap = int_arg(vm, "arr.new", 0)?.max(0) as usize;
    let out = vm.alloc_list_value(List::with_capacity(cap))?;
    vm.set_ret(out);
    Ok(())
}
