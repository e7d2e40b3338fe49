//! `std.str` — string helpers
//!
//! Multi-allocation builtins run the collection guard once up front and
//! then allocate directly: a cycle only ever happens inside the guard, so
//! references created during the batch stay valid until it returns.

use crate::error::RuntimeError;
use crate::heap::List;
use crate::interpreter::Interpreter;
use crate::value::{StrRef, Value, ValueKind};

fn str_arg(vm: &Interpreter, name: &'static str, i: usize) -> Result<StrRef, RuntimeError> {
    match vm.arg(i).kind {
        ValueKind::Str(s) => Ok(s),
        other => Err(RuntimeError::BuiltinType {
            name,
            expected: "str",
            got: other.type_name(),
        }),
    }
}

/// `@str.append`: concatenation of all arguments.
pub fn append(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    if vm.arg_count() < 2 {
        return Err(RuntimeError::BuiltinArity {
            name: "str.append",
            expected: "at least 2",
            got: vm.arg_count(),
        });
    }
    let mut joined = Vec::new();
    for i in 0..vm.arg_count() {
        let s = str_arg(vm, "str.append", i)?;
        joined.extend_from_slice(vm.str_value_bytes(s));
    }
    let out = vm.alloc_str_value(&joined)?;
    vm.set_ret(out);
    Ok(())
}

/// `@str.lines`: the argument split on newlines, as an array of strings.
pub fn lines(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let s = str_arg(vm, "str.lines", 0)?;
    let lines: Vec<Vec<u8>> = vm
        .str_value_bytes(s)
        .split(|b| *b == b'\n')
        .map(<[u8]>::to_vec)
        .collect();
    // a trailing newline does not produce an empty last element
    let count = match lines.last() {
        Some(last) if last.is_empty() => lines.len() - 1,
        _ => lines.len(),
    };

    vm.gc_guard();
    let mut list = List::with_capacity(count);
    for line in &lines[..count] {
        list.push(Value::str(StrRef::Heap(vm.heap.alloc_str(line)?)));
    }
    let out = Value::array(vm.heap.alloc_list(list)?);
    vm.set_ret(out);
    Ok(())
}

/// `@str.slice`: the byte range `[start, end)` of the argument.
pub fn slice(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let s = str_arg(vm, "str.slice", 0)?;
    let start = vm.arg(1).as_int().ok_or(RuntimeError::BuiltinType {
        name: "str.slice",
        expected: "number",
        got: vm.arg(1).type_name(),
    })?;
    let end = vm.arg(2).as_int().ok_or(RuntimeError::BuiltinType {
        name: "str.slice",
        expected: "number",
        got: vm.arg(2).type_name(),
    })?;

    let len = vm.str_value_bytes(s).len() as i64;
    if start < 0 || end < start || end > len {
        return Err(RuntimeError::IndexOutOfBounds { idx: end, len: len as usize });
    }
    let bytes = vm.str_value_bytes(s)[start as usize..end as usize].to_vec();
    let out = vm.alloc_str_value(&bytes)?;
    vm.set_ret(out);
    Ok(())
}
