//! Embedding API
//!
//! A [`Pg`] instance carries a configuration and a builtin table and turns
//! source into runnable VMs. Teardown is `Drop`; all pipeline state
//! (arena, bytecode, globals, heap) lives inside the produced
//! [`Interpreter`] and dies with it.
//!
//! ```no_run
//! use purple_garden::prelude::*;
//!
//! let pg = Pg::init(Config::default());
//! let state = pg.exec_str("(+ 2 2)").expect("runs");
//! ```

use crate::arena::Interner;
use crate::builtins::{BuiltinFn, Builtins};
use crate::compiler;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::io;
use crate::parser::Parser;
use crate::state::ProgramState;

use std::path::Path;

/// Embedding configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Heap ceiling in bytes. An allocation that would exceed it even
    /// after a collection cycle aborts the VM.
    pub max_memory: Option<usize>,
    /// Strip the std tree down to `Some`/`None`/`len`.
    pub disable_std_namespace: bool,
    /// Never run collection cycles; the heap only grows. The CLI's
    /// block-allocator mode sets this together with `max_memory`.
    pub disable_gc: bool,
    /// Start with an empty builtin table.
    pub remove_default_builtins: bool,
}

/// An embedded purple-garden instance.
#[derive(Debug)]
pub struct Pg {
    config: Config,
    builtins: Builtins,
}

impl Pg {
    /// Instance with the standard library selected by `config`.
    ///
    /// # Panics
    /// Panics when the built-in standard library fails to register — that
    /// is a bug in the library itself, not in host input.
    pub fn init(config: Config) -> Self {
        let builtins = Builtins::std(&config).expect("std namespace registers cleanly");
        Self { config, builtins }
    }

    /// Registers a host builtin under `name`. Name-hash collisions fail.
    pub fn register_builtin(&mut self, name: &str, func: BuiltinFn) -> Result<(), Error> {
        self.builtins.register(name, func)?;
        Ok(())
    }

    /// Compiles `src` into a ready-to-run VM without executing it. The
    /// CLI uses this to disassemble and to report per-phase memory usage.
    pub fn prepare(&self, src: &str) -> Result<Interpreter, Error> {
        let nodes = Parser::new(src)?.parse()?;
        let mut interner = Interner::new();
        let program = compiler::compile(&nodes, &mut interner, &self.builtins)?;
        Ok(Interpreter::new(
            program,
            interner,
            self.builtins.clone(),
            &self.config,
        ))
    }

    /// Compiles and runs `src`.
    pub fn exec_str(&self, src: &str) -> Result<ProgramState, Error> {
        let mut vm = self.prepare(src)?;
        Ok(vm.run()?)
    }

    /// Compiles and runs the file at `path`.
    pub fn exec_file(&self, path: &Path) -> Result<ProgramState, Error> {
        let src = io::read_source(path)?;
        self.exec_str(&src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::value::{Value, ValueKind};

    #[test]
    fn exec_str_runs_to_completion() {
        let pg = Pg::init(Config::default());
        let state = pg.exec_str("(+ 2 2)").expect("runs");
        assert!(matches!(
            state.return_value().kind,
            ValueKind::Int(4)
        ));
    }

    #[test]
    fn host_builtins_participate_in_dispatch() {
        fn double(vm: &mut Interpreter) -> Result<(), RuntimeError> {
            let v = vm.arg(0).as_int().unwrap_or(0);
            vm.set_ret(Value::int(v * 2));
            Ok(())
        }
        let mut pg = Pg::init(Config::default());
        pg.register_builtin("double", double).expect("registers");
        let state = pg.exec_str("(@double 21)").expect("runs");
        assert!(matches!(state.return_value().kind, ValueKind::Int(42)));
    }

    #[test]
    fn builtin_collision_fails_registration() {
        fn noop(vm: &mut Interpreter) -> Result<(), RuntimeError> {
            vm.set_ret(Value::NONE);
            Ok(())
        }
        let mut pg = Pg::init(Config::default());
        assert!(pg.register_builtin("len", noop).is_err());
    }

    #[test]
    fn runtime_failures_surface_as_errors() {
        let pg = Pg::init(Config::default());
        assert!(matches!(
            pg.exec_str("(/ 1 0)"),
            Err(Error::Runtime(RuntimeError::DivisionByZero))
        ));
        assert!(matches!(
            pg.exec_str("(@assert false)"),
            Err(Error::Runtime(RuntimeError::Assertion(_)))
        ));
    }
}
