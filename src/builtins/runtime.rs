//! `std.runtime` — introspection

use crate::error::RuntimeError;
use crate::heap::Map;
use crate::interpreter::Interpreter;
use crate::value::{Value, ValueKind};

/// `@runtime.type`: the type name of the argument. Ints and doubles both
/// report as `number`; anything option-flavored reports as `option`.
pub fn type_of(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    let name = if v.is_option() {
        "option"
    } else {
        match v.kind {
            ValueKind::None => "option",
            ValueKind::Str(_) => "str",
            ValueKind::Int(_) | ValueKind::Double(_) => "number",
            ValueKind::Bool(_) => "bool",
            ValueKind::Array(_) => "array",
            ValueKind::Obj(_) => "obj",
        }
    };
    let out = vm.intern_value(name);
    vm.set_ret(out);
    Ok(())
}

/// `@runtime.assert`: aborts unless the argument is `true`.
pub fn assert(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let v = vm.arg(0);
    if !matches!(v.kind, ValueKind::Bool(true)) || v.some {
        return Err(RuntimeError::Assertion(vm.display_value(v)));
    }
    vm.set_ret(v);
    Ok(())
}

/// `@runtime.gc.stats`: heap counters as `{current, allocated}`.
pub fn gc_stats(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    let stats = vm.heap_stats();
    let current_key = vm.intern_str_ref("current");
    let allocated_key = vm.intern_str_ref("allocated");

    let mut map = Map::with_capacity(2);
    map.insert(
        current_key,
        vm.str_value_hash(current_key),
        Value::int(stats.current as i64),
    );
    map.insert(
        allocated_key,
        vm.str_value_hash(allocated_key),
        Value::int(stats.allocated as i64),
    );
    let out = vm.alloc_map_value(map)?;
    vm.set_ret(out);
    Ok(())
}
