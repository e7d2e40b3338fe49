//! Fetch-decode-execute loop

use super::Interpreter;
use crate::bytecode::{decode_args, Opcode};
use crate::consts::REG_RET;
use crate::error::RuntimeError;
use crate::state::{ExecuteState, ProgramState};
use crate::value::ValueKind;

use tracing::trace;

impl Interpreter {
    /// Runs the program to completion. The root frame comes off the free
    /// list; the terminal state is the program counter walking off the end
    /// of the bytecode with the root frame current.
    pub fn run(&mut self) -> Result<ProgramState, RuntimeError> {
        self.arg_count = 1;
        self.arg_offset = 0;
        if self.frames.is_empty() {
            let root = self.pool.take();
            self.frames.push(root);
        }

        while self.pc < self.program.bytecode.len() {
            let word = self.program.bytecode[self.pc];
            let arg = self.program.bytecode[self.pc + 1];
            let op = Opcode::try_from(word).map_err(|_| RuntimeError::InvalidOpcode(word))?;
            self.counters[word as usize] += 1;
            trace!(pc = self.pc, %op, arg, "vm: dispatch");

            match self.step(op, arg)? {
                ExecuteState::Proceed => self.pc += 2,
                ExecuteState::Jump(target) => self.pc = target,
            }
        }

        Ok(ProgramState::Return(self.registers[REG_RET]))
    }

    fn step(&mut self, op: Opcode, arg: u32) -> Result<ExecuteState, RuntimeError> {
        match op {
            Opcode::Loadg => {
                self.registers[REG_RET] = self
                    .program
                    .globals
                    .get(arg as usize)
                    .copied()
                    .ok_or(RuntimeError::InvalidGlobal(arg))?;
            }
            Opcode::Load => self.registers[REG_RET] = self.register(arg)?,
            Opcode::Store => {
                self.register(arg)?;
                self.registers[arg as usize] = self.registers[REG_RET];
            }
            Opcode::Loadv => self.op_loadv(arg)?,
            Opcode::Var => self.op_var(arg)?,
            Opcode::Add => self.op_add(arg)?,
            Opcode::Sub | Opcode::Mul | Opcode::Div => self.op_arith(op, arg)?,
            Opcode::Eq => {
                let rhs = self.registers[REG_RET];
                let lhs = self.register(arg)?;
                self.registers[REG_RET] = crate::value::Value::bool(self.value_eq(lhs, rhs));
            }
            Opcode::Lt | Opcode::Gt => self.op_compare(op, arg)?,
            Opcode::Idx => self.op_idx(arg)?,
            Opcode::Size => self.size_hint = arg as usize,
            Opcode::New => self.op_new(arg)?,
            Opcode::Append => self.op_append(arg)?,
            Opcode::Args => {
                let (count, offset) = decode_args(arg);
                self.arg_count = count;
                self.arg_offset = offset;
            }
            Opcode::Sys => self.op_sys(arg)?,
            Opcode::Call => return self.op_call(arg),
            Opcode::Leave => return self.op_leave(),
            Opcode::Jmp => return Ok(ExecuteState::Jump(arg as usize)),
            Opcode::Jmpf => {
                if matches!(self.registers[REG_RET].kind, ValueKind::Bool(false)) {
                    return Ok(ExecuteState::Jump(arg as usize));
                }
            }
            Opcode::Assert => {
                let v = self.registers[REG_RET];
                if !matches!(v.kind, ValueKind::Bool(true)) || v.some {
                    return Err(RuntimeError::Assertion(self.display_value(v)));
                }
            }
        }
        Ok(ExecuteState::Proceed)
    }

    fn op_loadv(&mut self, slot: u32) -> Result<(), RuntimeError> {
        let at = slot as usize;
        if at >= crate::consts::VARIABLE_TABLE_SIZE {
            return Err(RuntimeError::UndefinedVariable(slot));
        }
        // walk the frame chain outward on a local miss
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.get(at) {
                self.registers[REG_RET] = v;
                return Ok(());
            }
        }
        Err(RuntimeError::UndefinedVariable(slot))
    }

    fn op_var(&mut self, slot: u32) -> Result<(), RuntimeError> {
        let at = slot as usize;
        if at >= crate::consts::VARIABLE_TABLE_SIZE {
            return Err(RuntimeError::UndefinedVariable(slot));
        }
        let v = self.registers[REG_RET];
        let frame = self.frames.last_mut().expect("a frame is always current");
        frame.set(at, v);
        Ok(())
    }
}
