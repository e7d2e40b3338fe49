//! [`Interpreter`] implementation
//!
//! The VM owns every piece of mutable runtime state: the register file, the
//! frame chain, the global pool, the heap and the builtin table. It is
//! single-threaded; a GC cycle only ever happens at an allocation point and
//! pauses the world.

use crate::arena::{Interner, Stats};
use crate::builtins::Builtins;
use crate::bytecode::Opcode;
use crate::compiler::Program;
use crate::consts::{REG_RET, VM_REGISTER_COUNT};
use crate::error::RuntimeError;
use crate::heap::Heap;
use crate::value::{StrRef, Value, ValueKind};

use strum::EnumCount;

mod alu;
mod constructors;
mod executor;
mod flow;
mod frame;
mod memory;

pub use frame::{Frame, FramePool};

/// VM interpreter.
///
/// Fetches `(op, arg)` pairs from the flat bytecode and dispatches them
/// against its register file, the current frame's variable table and the
/// heap. Hosts usually drive it through [`crate::pg::Pg`] rather than
/// directly.
#[derive(Debug)]
pub struct Interpreter {
    pub(crate) pc: usize,
    pub(crate) registers: [Value; VM_REGISTER_COUNT],
    pub(crate) program: Program,
    pub(crate) frames: Vec<Frame>,
    pub(crate) pool: FramePool,
    pub(crate) arg_count: usize,
    pub(crate) arg_offset: usize,
    pub(crate) size_hint: usize,
    pub(crate) heap: Heap,
    pub(crate) interner: Interner,
    pub(crate) builtins: Builtins,
    pub(crate) counters: [u64; Opcode::COUNT],
}

impl Interpreter {
    /// The current state of the registers.
    pub const fn registers(&self) -> &[Value] {
        &self.registers
    }

    /// The final value of the accumulator.
    pub fn return_register(&self) -> Value {
        self.registers[REG_RET]
    }

    /// The compiled program this VM executes.
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Read access to the heap, mainly for builtins and tests.
    pub const fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The pipeline arena holding interned strings; the disassembler
    /// renders global constants through it.
    pub const fn interner_ref(&self) -> &Interner {
        &self.interner
    }

    /// Heap usage counters.
    pub fn heap_stats(&self) -> Stats {
        self.heap.stats()
    }

    /// Pipeline arena usage counters.
    pub fn arena_stats(&self) -> Stats {
        self.interner.stats()
    }

    /// Executed-instruction counters, indexed by opcode.
    pub const fn counters(&self) -> &[u64; Opcode::COUNT] {
        &self.counters
    }

    /* builtin ABI */

    /// Number of arguments the current builtin invocation received.
    pub const fn arg_count(&self) -> usize {
        self.arg_count
    }

    /// Argument `i` of the current builtin invocation.
    pub fn arg(&self, i: usize) -> Value {
        self.registers
            .get(self.arg_offset + i)
            .copied()
            .unwrap_or(Value::NONE)
    }

    /// Writes a builtin's result into the accumulator.
    pub fn set_ret(&mut self, v: Value) {
        self.registers[REG_RET] = v;
    }

    /* string resolution */

    /// The bytes behind any string view.
    pub fn str_value_bytes(&self, s: StrRef) -> &[u8] {
        match s {
            StrRef::Interned(id) => self.interner.bytes(id),
            StrRef::Heap(r) => self.heap.str_bytes(r),
        }
    }

    /// The construction-time hash of any string view.
    pub fn str_value_hash(&self, s: StrRef) -> u64 {
        match s {
            StrRef::Interned(id) => self.interner.hash(id),
            StrRef::Heap(r) => self.heap.str_obj(r).hash,
        }
    }

    /// Interns `s` into the pipeline arena. Used by builtins handing out
    /// static names.
    pub fn intern_str_ref(&mut self, s: &str) -> StrRef {
        StrRef::Interned(self.interner.intern(s))
    }

    /// Interns `s` into the pipeline arena and returns it as a value.
    pub fn intern_value(&mut self, s: &str) -> Value {
        Value::str(self.intern_str_ref(s))
    }

    /* equality */

    /// Equality as the `EQ` instruction sees it: matching option flags and
    /// tags, bitwise-equal scalars, byte-equal strings, identity for
    /// containers.
    pub fn value_eq(&self, a: Value, b: Value) -> bool {
        if a.some != b.some {
            return false;
        }
        match (a.kind, b.kind) {
            (ValueKind::None, ValueKind::None) => true,
            (ValueKind::Bool(x), ValueKind::Bool(y)) => x == y,
            (ValueKind::Int(x), ValueKind::Int(y)) => x == y,
            (ValueKind::Double(x), ValueKind::Double(y)) => x == y,
            (ValueKind::Str(x), ValueKind::Str(y)) => {
                self.str_value_hash(x) == self.str_value_hash(y)
                    && self.str_value_bytes(x) == self.str_value_bytes(y)
            }
            (ValueKind::Array(x), ValueKind::Array(y)) => x == y,
            (ValueKind::Obj(x), ValueKind::Obj(y)) => x == y,
            _ => false,
        }
    }

    /// Content equality, containers included. Test utility; the `=`
    /// operator stays shallow.
    pub fn deep_eq(&self, a: Value, b: Value) -> bool {
        if a.some != b.some {
            return false;
        }
        match (a.kind, b.kind) {
            (ValueKind::Array(x), ValueKind::Array(y)) => {
                let (xs, ys) = (self.heap.list(x), self.heap.list(y));
                xs.len() == ys.len()
                    && xs.iter().zip(ys.iter()).all(|(ex, ey)| self.deep_eq(ex, ey))
            }
            (ValueKind::Obj(x), ValueKind::Obj(y)) => {
                let (xs, ys) = (self.heap.map(x), self.heap.map(y));
                xs.len() == ys.len()
                    && xs.iter().all(|entry| {
                        ys.get(entry.hash)
                            .is_some_and(|other| self.deep_eq(entry.value, other))
                    })
            }
            _ => self.value_eq(a, b),
        }
    }

    /* rendering */

    /// Renders `v` the way `@println` prints it.
    pub fn display_value(&self, v: Value) -> String {
        let mut out = String::new();
        self.render(v, &mut out);
        out
    }

    fn render(&self, v: Value, out: &mut String) {
        use std::fmt::Write;
        if v.some {
            out.push_str("Option::Some(");
        }
        match v.kind {
            ValueKind::None => out.push_str("Option::None"),
            ValueKind::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            ValueKind::Int(i) => {
                let _ = write!(out, "{i}");
            }
            ValueKind::Double(d) => {
                let _ = write!(out, "{d}");
            }
            ValueKind::Str(s) => {
                out.push_str(&String::from_utf8_lossy(self.str_value_bytes(s)));
            }
            ValueKind::Array(r) => {
                out.push('[');
                let list = self.heap.list(r);
                for (i, element) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.render(element, out);
                }
                out.push(']');
            }
            ValueKind::Obj(r) => {
                out.push('{');
                for (i, entry) in self.heap.map(r).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&String::from_utf8_lossy(self.str_value_bytes(entry.key)));
                    out.push_str(": ");
                    self.render(entry.value, out);
                }
                out.push('}');
            }
        }
        if v.some {
            out.push(')');
        }
    }

    /// Type error for a binary operator over `lhs` and `rhs`.
    pub(crate) fn type_error(op: &'static str, lhs: Value, rhs: Value) -> RuntimeError {
        RuntimeError::Type {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }
    }

    /// Reads a general-purpose register, bounds checked.
    pub(crate) fn register(&self, r: u32) -> Result<Value, RuntimeError> {
        self.registers
            .get(r as usize)
            .copied()
            .ok_or(RuntimeError::InvalidRegister(r))
    }
}
