//! Heap-facing instructions and the collection trigger
//!
//! Every allocation funnels through [`Interpreter::gc_guard`], which runs a
//! collection cycle when heap pressure calls for one. The guard rewrites
//! the register file and the frame chain, so handlers re-read operand
//! references after it.

use super::Interpreter;
use crate::bytecode::NewKind;
use crate::consts::REG_RET;
use crate::error::RuntimeError;
use crate::heap::{List, Map, Roots};
use crate::value::{StrRef, Value, ValueKind};

impl Interpreter {
    /// Runs a collection cycle if the heap asks for one. Called before
    /// every allocation; the world is paused for the duration.
    pub(crate) fn gc_guard(&mut self) {
        if self.heap.needs_cycle() {
            let Self {
                heap,
                registers,
                frames,
                ..
            } = self;
            heap.cycle(Roots {
                registers: registers.as_mut_slice(),
                frames: frames.as_mut_slice(),
            });
        }
    }

    /// A fresh heap string value over `bytes`.
    pub fn alloc_str_value(&mut self, bytes: &[u8]) -> Result<Value, RuntimeError> {
        self.gc_guard();
        Ok(Value::str(StrRef::Heap(self.heap.alloc_str(bytes)?)))
    }

    /// Moves `list` onto the heap as an array value.
    pub fn alloc_list_value(&mut self, list: List) -> Result<Value, RuntimeError> {
        self.gc_guard();
        Ok(Value::array(self.heap.alloc_list(list)?))
    }

    /// Moves `map` onto the heap as an object value.
    pub fn alloc_map_value(&mut self, map: Map) -> Result<Value, RuntimeError> {
        self.gc_guard();
        Ok(Value::obj(self.heap.alloc_map(map)?))
    }

    /// `NEW`: allocates an array or map into `r0`, consuming the size hint.
    pub(crate) fn op_new(&mut self, arg: u32) -> Result<(), RuntimeError> {
        let kind = NewKind::try_from(arg).map_err(|_| RuntimeError::InvalidOpcode(arg))?;
        let hint = std::mem::take(&mut self.size_hint);
        let v = match kind {
            NewKind::Array => self.alloc_list_value(List::with_capacity(hint))?,
            NewKind::Obj => self.alloc_map_value(Map::with_capacity(hint))?,
        };
        self.registers[REG_RET] = v;
        Ok(())
    }

    /// `APPEND`: appends `r0` to the array in the target register, or feeds
    /// the key/value protocol of an object under construction.
    pub(crate) fn op_append(&mut self, arg: u32) -> Result<(), RuntimeError> {
        self.gc_guard();
        let target = self.register(arg)?;
        let value = self.registers[REG_RET];
        match target.kind {
            ValueKind::Array(r) => {
                self.heap.list_mut(r).push(value);
                self.heap.note_append(r);
            }
            ValueKind::Obj(r) => match self.heap.map(r).pending_key {
                None => {
                    let ValueKind::Str(key) = value.kind else {
                        return Err(Self::type_error("append", target, value));
                    };
                    let hash = self.str_value_hash(key);
                    self.heap.map_mut(r).pending_key = Some((key, hash));
                }
                Some((key, hash)) => {
                    let map = self.heap.map_mut(r);
                    map.pending_key = None;
                    map.insert(key, hash, value);
                    self.heap.note_append(r);
                }
            },
            _ => return Err(Self::type_error("append", target, value)),
        }
        Ok(())
    }

    /// `IDX`: arrays index by integer, objects by string key.
    pub(crate) fn op_idx(&mut self, arg: u32) -> Result<(), RuntimeError> {
        let target = self.register(arg)?;
        let index = self.registers[REG_RET];
        let result = match (target.kind, index.kind) {
            (ValueKind::Array(r), ValueKind::Int(i)) => {
                let list = self.heap.list(r);
                usize::try_from(i)
                    .ok()
                    .and_then(|at| list.get(at))
                    .ok_or(RuntimeError::IndexOutOfBounds {
                        idx: i,
                        len: list.len(),
                    })?
            }
            (ValueKind::Obj(r), ValueKind::Str(key)) => {
                let hash = self.str_value_hash(key);
                self.heap.map(r).get(hash).ok_or_else(|| {
                    RuntimeError::KeyNotFound(
                        String::from_utf8_lossy(self.str_value_bytes(key)).into_owned(),
                    )
                })?
            }
            _ => {
                return Err(RuntimeError::BadIndex {
                    target: target.type_name(),
                    index: index.type_name(),
                })
            }
        };
        self.registers[REG_RET] = result;
        Ok(())
    }
}
