//! `std.fmt` — output

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn render_args(vm: &Interpreter) -> String {
    (0..vm.arg_count())
        .map(|i| vm.display_value(vm.arg(i)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `@print`: arguments joined with `' '`, no trailing newline.
pub fn print(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    print!("{}", render_args(vm));
    vm.set_ret(Value::NONE);
    Ok(())
}

/// `@println`: arguments joined with `' '`, newline-terminated.
pub fn println(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    println!("{}", render_args(vm));
    vm.set_ret(Value::NONE);
    Ok(())
}
