//! Ways of constructing an [`Interpreter`]

use super::{FramePool, Interpreter};
use crate::arena::Interner;
use crate::builtins::Builtins;
use crate::bytecode::Opcode;
use crate::compiler::Program;
use crate::consts::VM_REGISTER_COUNT;
use crate::heap::Heap;
use crate::pg::Config;
use crate::value::Value;

use strum::EnumCount;

impl Interpreter {
    /// Interpreter over a compiled program.
    ///
    /// `interner` must be the one the program was compiled with — the
    /// global pool's string constants point into it, and it has to outlive
    /// the run (the region lives inside the VM, spec-wise the "pipeline
    /// arena").
    pub fn new(program: Program, interner: Interner, builtins: Builtins, config: &Config) -> Self {
        Self {
            pc: 0,
            registers: [Value::NONE; VM_REGISTER_COUNT],
            program,
            frames: Vec::new(),
            pool: FramePool::new(),
            arg_count: 1,
            arg_offset: 0,
            size_hint: 0,
            heap: Heap::new(!config.disable_gc, config.max_memory),
            interner,
            builtins,
            counters: [0; Opcode::COUNT],
        }
    }
}
