//! Call flow: `CALL`, `LEAVE`, `SYS`
//!
//! `CALL` pops a frame off the free list, records the resumption address
//! and seeds the frame's leading variable slots with the announced argument
//! window, so function prologues can bind parameters statically. `LEAVE`
//! clears the frame back into the pool.

use super::Interpreter;
use crate::consts::CALL_ARG_SLOTS;
use crate::error::RuntimeError;
use crate::state::ExecuteState;

impl Interpreter {
    pub(crate) fn op_sys(&mut self, arg: u32) -> Result<(), RuntimeError> {
        let func = self
            .builtins
            .get(arg)
            .ok_or(RuntimeError::InvalidBuiltin(arg))?;
        func(self)?;
        self.arg_count = 1;
        self.arg_offset = 0;
        Ok(())
    }

    pub(crate) fn op_call(&mut self, arg: u32) -> Result<ExecuteState, RuntimeError> {
        let mut frame = self.pool.take();
        frame.return_pc = self.pc + 2;
        // seed argument slots from the marshalled register window
        for i in 0..self.arg_count.min(CALL_ARG_SLOTS) {
            frame.set(i, self.register((self.arg_offset + i) as u32)?);
        }
        self.frames.push(frame);
        self.arg_count = 1;
        self.arg_offset = 0;
        Ok(ExecuteState::Jump(arg as usize))
    }

    pub(crate) fn op_leave(&mut self) -> Result<ExecuteState, RuntimeError> {
        if self.frames.len() <= 1 {
            return Err(RuntimeError::UnexpectedLeave);
        }
        let frame = self.frames.pop().expect("checked above");
        let resume = frame.return_pc;
        self.pool.recycle(frame);
        Ok(ExecuteState::Jump(resume))
    }
}
