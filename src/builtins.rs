//! Builtin registry and standard library tree
//!
//! Builtins are native functions invoked through the `SYS` instruction. All
//! of them obey one ABI: read `arg_count` arguments starting at register
//! `arg_offset`, leave the result in `r0`, never touch the program counter,
//! the frame chain or the bytecode.
//!
//! Namespaces form a tree. Every function registers under its full dotted
//! path (`std.fmt.println`), an alias without the `std.` prefix
//! (`fmt.println`) and, for functions sitting directly under the root, the
//! bare name (`println`). Resolution happens at compile time by hashing the
//! written path into the flat table index carried by `SYS`.

use crate::consts::MAX_BUILTIN_SIZE;
use crate::error::{CompileError, RuntimeError};
use crate::interpreter::Interpreter;
use crate::pg::Config;
use crate::value::fnv1a;

use std::collections::HashMap;

pub mod arr;
pub mod conv;
pub mod env;
pub mod fmt;
pub mod fs;
pub mod math;
pub mod opt;
pub mod runtime;
pub mod strops;

/// The builtin calling signature. Arguments are read through
/// [`Interpreter::arg`], the result is written with [`Interpreter::set_ret`].
pub type BuiltinFn = fn(&mut Interpreter) -> Result<(), RuntimeError>;

/// One entry of the flat builtin table.
#[derive(Clone)]
pub struct Builtin {
    /// Primary registered path, for diagnostics and disassembly.
    pub name: String,
    /// The native function.
    pub func: BuiltinFn,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// Name-hashed dispatch table of native functions.
#[derive(Debug, Default, Clone)]
pub struct Builtins {
    table: Vec<Builtin>,
    by_hash: HashMap<u64, (u32, String)>,
}

/// One node of the declarative namespace tree.
enum StdNode {
    Package(&'static str, Vec<StdNode>),
    Function(&'static str, BuiltinFn),
}

use StdNode::{Function, Package};

fn std_tree() -> StdNode {
    Package(
        "std",
        vec![
            Package(
                "fmt",
                vec![
                    Function("print", fmt::print),
                    Function("println", fmt::println),
                ],
            ),
            Package(
                "runtime",
                vec![
                    Function("type", runtime::type_of),
                    Function("assert", runtime::assert),
                    Package("gc", vec![Function("stats", runtime::gc_stats)]),
                ],
            ),
            Package(
                "opt",
                vec![
                    Function("or", opt::or),
                    Function("unwrap", opt::unwrap),
                    Function("expect", opt::expect),
                    Function("is_some", opt::is_some),
                    Function("is_none", opt::is_none),
                ],
            ),
            Package("math", vec![Function("mod", math::modulo)]),
            Package("conv", vec![Function("int", conv::int)]),
            Package(
                "str",
                vec![
                    Function("append", strops::append),
                    Function("lines", strops::lines),
                    Function("slice", strops::slice),
                ],
            ),
            Package(
                "arr",
                vec![Function("range", arr::range), Function("new", arr::new)],
            ),
            Package(
                "env",
                vec![Function("get", env::get), Function("set", env::set)],
            ),
            Package(
                "fs",
                vec![
                    Function("read_file", fs::read_file),
                    Function("write_file", fs::write_file),
                ],
            ),
            Function("assert", runtime::assert),
            Function("println", fmt::println),
            Function("Some", opt::some),
            Function("None", opt::none),
            Function("len", builtin_len),
        ],
    )
}

fn std_tree_reduced() -> StdNode {
    Package(
        "std",
        vec![
            Function("Some", opt::some),
            Function("None", opt::none),
            Function("len", builtin_len),
        ],
    )
}

impl Builtins {
    /// Empty table; nothing resolves until something is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the standard library, honoring the embedding
    /// configuration.
    pub fn std(config: &Config) -> Result<Self, CompileError> {
        let mut builtins = Self::new();
        if config.remove_default_builtins {
            return Ok(builtins);
        }
        let tree = if config.disable_std_namespace {
            std_tree_reduced()
        } else {
            std_tree()
        };
        builtins.register_tree(&tree, &mut Vec::new())?;
        Ok(builtins)
    }

    fn register_tree(
        &mut self,
        node: &StdNode,
        path: &mut Vec<&'static str>,
    ) -> Result<(), CompileError> {
        match node {
            Package(name, children) => {
                path.push(name);
                for child in children {
                    self.register_tree(child, path)?;
                }
                path.pop();
            }
            Function(name, func) => {
                let full = path
                    .iter()
                    .copied()
                    .chain(std::iter::once(*name))
                    .collect::<Vec<_>>()
                    .join(".");
                let idx = self.register(&full, *func)?;
                // the `std.`-less alias; for root functions this is the
                // bare name itself
                if let Some(stripped) = full.strip_prefix("std.") {
                    self.alias(stripped, idx)?;
                }
            }
        }
        Ok(())
    }

    /// Registers `func` under `name`. Fails when the table is full or the
    /// name hash collides with an existing registration.
    pub fn register(&mut self, name: &str, func: BuiltinFn) -> Result<u32, CompileError> {
        if self.table.len() >= MAX_BUILTIN_SIZE {
            return Err(CompileError::TooManyBuiltins(MAX_BUILTIN_SIZE));
        }
        if self.by_hash.contains_key(&fnv1a(name.as_bytes())) {
            return Err(CompileError::BuiltinCollision(name.to_owned()));
        }
        let idx = self.table.len() as u32;
        self.table.push(Builtin {
            name: name.to_owned(),
            func,
        });
        self.alias(name, idx)?;
        Ok(idx)
    }

    /// Makes `name` resolve to the existing table entry `idx`.
    fn alias(&mut self, name: &str, idx: u32) -> Result<(), CompileError> {
        let hash = fnv1a(name.as_bytes());
        if self.by_hash.contains_key(&hash) {
            return Err(CompileError::BuiltinCollision(name.to_owned()));
        }
        self.by_hash.insert(hash, (idx, name.to_owned()));
        Ok(())
    }

    /// Table index for the builtin written as `path`, if registered.
    pub fn resolve(&self, path: &str) -> Option<u32> {
        let hash = fnv1a(path.as_bytes());
        let (idx, name) = self.by_hash.get(&hash)?;
        // a hash hit with different bytes would be a registration-time
        // collision; double check so a compile never dispatches wrongly
        (name == path).then_some(*idx)
    }

    /// The function at table index `idx`.
    pub fn get(&self, idx: u32) -> Option<BuiltinFn> {
        self.table.get(idx as usize).map(|b| b.func)
    }

    /// Primary name of the builtin at `idx`, for disassembly.
    pub fn name(&self, idx: u32) -> Option<&str> {
        self.table.get(idx as usize).map(|b| b.name.as_str())
    }

    /// Registered entry count.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// `@len`: length of a string, array or object.
pub fn builtin_len(vm: &mut Interpreter) -> Result<(), RuntimeError> {
    use crate::value::{Value, ValueKind};
    if vm.arg_count() != 1 {
        return Err(RuntimeError::BuiltinArity {
            name: "len",
            expected: "1",
            got: vm.arg_count(),
        });
    }
    let arg = vm.arg(0);
    let len = match arg.kind {
        ValueKind::Str(s) => vm.str_value_bytes(s).len(),
        ValueKind::Array(r) => vm.heap().list(r).len(),
        ValueKind::Obj(r) => vm.heap().map(r).len(),
        _ => {
            return Err(RuntimeError::BuiltinType {
                name: "len",
                expected: "str, array or obj",
                got: arg.type_name(),
            })
        }
    };
    vm.set_ret(Value::int(len as i64));
    Ok(())
}
