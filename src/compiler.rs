//! Bytecode compiler
//!
//! Folds the AST into a flat instruction stream plus the global constant
//! pool. Expression results always land in `r0`; temporaries get registers
//! from an in-use map and are released as soon as the consuming instruction
//! was emitted. Atoms are deduplicated into the global pool by structural
//! identity, so two identical literals share one slot.

use crate::arena::{InternId, Interner};
use crate::ast::{Atom, Node};
use crate::builtins::Builtins;
use crate::bytecode::{encode_args, BytecodeBuilder, NewKind, Opcode};
use crate::consts::{
    CALL_ARG_SLOTS, GLOBAL_FALSE, GLOBAL_NONE, GLOBAL_SIZE, GLOBAL_TRUE, REGISTER_SPILL_SLOTS,
    VARIABLE_SLOT_BASE, VARIABLE_TABLE_SIZE, VM_REGISTER_COUNT,
};
use crate::error::CompileError;
use crate::value::{fnv1a, StrRef, Value};

use std::collections::{HashMap, HashSet};

/// Metadata of a compiled user function, kept for `CALL` resolution, arity
/// checks and disassembly.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Source name.
    pub name: String,
    /// Address of the function body.
    pub bytecode_index: usize,
    /// Declared parameter count.
    pub argument_count: usize,
    /// Body size in words, including the terminating `LEAVE`.
    pub size: usize,
}

/// A compiled program: everything the VM needs, plus function metadata for
/// the disassembler.
#[derive(Debug)]
pub struct Program {
    /// Flat `(op, arg)` word stream.
    pub bytecode: Vec<u32>,
    /// Global constant pool. Slots 0, 1, 2 hold `false`, `true`, `None`.
    pub globals: Vec<Value>,
    /// Compiled user functions.
    pub functions: Vec<FunctionInfo>,
}

/// Structural identity of a global pool constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GlobalKey {
    Int(i64),
    Double(u64),
    Str(InternId),
}

/// Compiler context: register bookkeeping, global pool deduplication,
/// variable slot assignment and the function table.
pub struct Ctx<'a> {
    bcb: BytecodeBuilder,
    registers: [bool; VM_REGISTER_COUNT],
    globals: Vec<Value>,
    global_index: HashMap<GlobalKey, u32>,
    /// Global variable-slot namespace: one name, one slot, program-wide.
    /// Keeps `LOADV`'s parent-frame walk sound.
    var_slots: HashMap<String, u32>,
    slot_owner: HashMap<u32, String>,
    functions: HashMap<String, usize>,
    function_infos: Vec<FunctionInfo>,
    /// Lexically visible names, for use-before-bind diagnostics.
    scopes: Vec<HashSet<String>>,
    builtins: &'a Builtins,
    interner: &'a mut Interner,
}

/// Compiles `nodes` into a [`Program`], interning literals into `interner`
/// and resolving `@` paths against `builtins`.
pub fn compile(
    nodes: &[Node],
    interner: &mut Interner,
    builtins: &Builtins,
) -> Result<Program, CompileError> {
    let mut ctx = Ctx {
        bcb: BytecodeBuilder::new(),
        registers: [false; VM_REGISTER_COUNT],
        globals: vec![Value::FALSE, Value::TRUE, Value::NONE],
        global_index: HashMap::new(),
        var_slots: HashMap::new(),
        slot_owner: HashMap::new(),
        functions: HashMap::new(),
        function_infos: Vec::new(),
        scopes: vec![HashSet::new()],
        builtins,
        interner,
    };
    for node in nodes {
        ctx.node(node)?;
    }
    Ok(Program {
        bytecode: ctx.bcb.into_words(),
        globals: ctx.globals,
        functions: ctx.function_infos,
    })
}

impl Ctx<'_> {
    /* register bookkeeping */

    fn alloc_register(&mut self) -> Result<u32, CompileError> {
        for r in 1..VM_REGISTER_COUNT {
            if !self.registers[r] {
                self.registers[r] = true;
                return Ok(r as u32);
            }
        }
        Err(CompileError::OutOfRegisters)
    }

    fn alloc_block(&mut self, count: usize) -> Result<u32, CompileError> {
        'base: for base in 1..VM_REGISTER_COUNT.saturating_sub(count) {
            for r in base..base + count {
                if self.registers[r] {
                    continue 'base;
                }
            }
            for r in base..base + count {
                self.registers[r] = true;
            }
            return Ok(base as u32);
        }
        Err(CompileError::OutOfRegisters)
    }

    fn free_register(&mut self, r: u32) {
        self.registers[r as usize] = false;
    }

    fn free_block(&mut self, base: u32, count: usize) {
        for r in base as usize..base as usize + count {
            self.registers[r] = false;
        }
    }

    /* global pool */

    fn global(&mut self, key: GlobalKey, value: Value) -> Result<u32, CompileError> {
        if let Some(idx) = self.global_index.get(&key) {
            return Ok(*idx);
        }
        if self.globals.len() >= GLOBAL_SIZE {
            return Err(CompileError::TooManyGlobals(GLOBAL_SIZE));
        }
        let idx = self.globals.len() as u32;
        self.globals.push(value);
        self.global_index.insert(key, idx);
        Ok(idx)
    }

    fn atom_global(&mut self, atom: &Atom) -> Result<u32, CompileError> {
        match atom {
            Atom::Bool(true) => Ok(GLOBAL_TRUE),
            Atom::Bool(false) => Ok(GLOBAL_FALSE),
            Atom::Int(i) => self.global(GlobalKey::Int(*i), Value::int(*i)),
            Atom::Double(d) => self.global(GlobalKey::Double(d.to_bits()), Value::double(*d)),
            Atom::Str(s) => {
                let id = self.interner.intern(s);
                self.global(GlobalKey::Str(id), Value::str(StrRef::Interned(id)))
            }
        }
    }

    /* variable slots */

    /// Slot assigned to `name`, assigning a fresh one on first sight.
    /// Slots derive from the name hash; clashes are resolved here, at
    /// compile time, by probing. Slots below [`VARIABLE_SLOT_BASE`] belong
    /// to the argument-seeding and register-spill regions and are never
    /// assigned to names.
    fn bind_slot(&mut self, name: &str) -> Result<u32, CompileError> {
        if let Some(slot) = self.var_slots.get(name) {
            return Ok(*slot);
        }
        let span = (VARIABLE_TABLE_SIZE - VARIABLE_SLOT_BASE) as u64;
        let base = fnv1a(name.as_bytes()) % span;
        for probe in 0..span {
            let slot = (VARIABLE_SLOT_BASE as u64 + (base + probe) % span) as u32;
            if !self.slot_owner.contains_key(&slot) {
                self.var_slots.insert(name.to_owned(), slot);
                self.slot_owner.insert(slot, name.to_owned());
                return Ok(slot);
            }
        }
        Err(CompileError::VariableTableFull(name.to_owned()))
    }

    fn is_visible(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn mark_visible(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned());
        }
    }

    /* lowering */

    fn node(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Atom(atom) => {
                let idx = self.atom_global(atom)?;
                self.bcb.emit(Opcode::Loadg, idx);
                Ok(())
            }
            Node::Ident(name) => self.load_variable(name),
            Node::Bin { op, args } => {
                if args.len() != 2 {
                    return Err(CompileError::MalformedForm {
                        form: "operator",
                        reason: "operators take exactly two operands",
                    });
                }
                self.node(&args[0])?;
                let r = self.alloc_register()?;
                self.bcb.emit(Opcode::Store, r);
                self.node(&args[1])?;
                self.bcb.emit(op.opcode(), r);
                self.free_register(r);
                Ok(())
            }
            Node::Call { name, args } => self.call(name, args),
            Node::Builtin { path, args } => self.builtin(path, args),
            Node::Array(elements) => {
                self.bcb.emit(Opcode::Size, elements.len() as u32);
                self.bcb.emit(Opcode::New, NewKind::Array as u32);
                let r = self.alloc_register()?;
                self.bcb.emit(Opcode::Store, r);
                for element in elements {
                    self.node(element)?;
                    self.bcb.emit(Opcode::Append, r);
                }
                self.bcb.emit(Opcode::Load, r);
                self.free_register(r);
                Ok(())
            }
            Node::Object(entries) => {
                self.bcb.emit(Opcode::Size, entries.len() as u32);
                self.bcb.emit(Opcode::New, NewKind::Obj as u32);
                let r = self.alloc_register()?;
                self.bcb.emit(Opcode::Store, r);
                for (key, value) in entries {
                    self.object_key(key)?;
                    self.bcb.emit(Opcode::Append, r);
                    self.node(value)?;
                    self.bcb.emit(Opcode::Append, r);
                }
                self.bcb.emit(Opcode::Load, r);
                self.free_register(r);
                Ok(())
            }
            Node::List(_) => Err(CompileError::MalformedForm {
                form: "list",
                reason: "only valid as a `@match` arm",
            }),
        }
    }

    fn load_variable(&mut self, name: &str) -> Result<(), CompileError> {
        if !self.is_visible(name) {
            return Err(CompileError::UnboundIdentifier(name.to_owned()));
        }
        let slot = self.bind_slot(name)?;
        self.bcb.emit(Opcode::Loadv, slot);
        Ok(())
    }

    /// Object keys are string constants: literals or bare identifiers.
    fn object_key(&mut self, key: &Node) -> Result<(), CompileError> {
        let text = match key {
            Node::Atom(Atom::Str(s)) => s.clone(),
            Node::Ident(name) => name.clone(),
            _ => {
                return Err(CompileError::MalformedForm {
                    form: "object literal",
                    reason: "keys must be strings or identifiers",
                })
            }
        };
        let idx = self.atom_global(&Atom::Str(text))?;
        self.bcb.emit(Opcode::Loadg, idx);
        Ok(())
    }

    /// `(name arg…)`: user function call; `(name)` falls back to a variable
    /// load when no such function exists.
    fn call(&mut self, name: &str, args: &[Node]) -> Result<(), CompileError> {
        let Some(func) = self.functions.get(name).copied() else {
            if args.is_empty() {
                return self.load_variable(name);
            }
            return Err(CompileError::UnknownFunction(name.to_owned()));
        };
        let info = &self.function_infos[func];
        if info.argument_count != args.len() {
            return Err(CompileError::ArityMismatch {
                name: name.to_owned(),
                expected: info.argument_count,
                got: args.len(),
            });
        }
        let addr = info.bytecode_index as u32;

        // the register file is shared across frames: park every live
        // temporary in the caller's frame and reload it after the return
        let live: Vec<u32> = (1..VM_REGISTER_COUNT)
            .filter(|r| self.registers[*r])
            .map(|r| r as u32)
            .collect();
        for r in &live {
            self.bcb.emit(Opcode::Load, *r);
            self.bcb.emit(Opcode::Var, spill_slot(*r));
        }

        self.marshal(args)?;
        self.bcb.emit(Opcode::Call, addr);

        if !live.is_empty() {
            let ret = self.alloc_register()?;
            self.bcb.emit(Opcode::Store, ret);
            for r in &live {
                self.bcb.emit(Opcode::Loadv, spill_slot(*r));
                self.bcb.emit(Opcode::Store, *r);
            }
            self.bcb.emit(Opcode::Load, ret);
            self.free_register(ret);
        }
        Ok(())
    }

    /// Compiles each argument into `r0`, stores it into a fresh contiguous
    /// register block and announces the window with `ARGS`.
    fn marshal(&mut self, args: &[Node]) -> Result<(), CompileError> {
        if args.len() > CALL_ARG_SLOTS {
            return Err(CompileError::MalformedForm {
                form: "call",
                reason: "too many arguments",
            });
        }
        if args.is_empty() {
            self.bcb.emit(Opcode::Args, encode_args(0, 0));
            return Ok(());
        }
        let base = self.alloc_block(args.len())?;
        for (i, arg) in args.iter().enumerate() {
            self.node(arg)?;
            self.bcb.emit(Opcode::Store, base + i as u32);
        }
        self.bcb
            .emit(Opcode::Args, encode_args(args.len() as u16, base as u16));
        self.free_block(base, args.len());
        Ok(())
    }

    fn builtin(&mut self, path: &str, args: &[Node]) -> Result<(), CompileError> {
        match path {
            "let" => return self.form_let(args),
            "fn" => return self.form_fn(args),
            "match" => return self.form_match(args),
            "assert" => return self.form_assert(args),
            "idx" => return self.form_idx(args),
            "None" => {
                self.bcb.emit(Opcode::Loadg, GLOBAL_NONE);
                return Ok(());
            }
            _ => {}
        }

        let Some(idx) = self.builtins.resolve(path) else {
            return Err(CompileError::UnknownBuiltin(path.to_owned()));
        };
        if args.len() == 1 {
            // single argument: already in r0, the default window applies
            self.node(&args[0])?;
        } else {
            self.marshal(args)?;
        }
        self.bcb.emit(Opcode::Sys, idx);
        Ok(())
    }

    /// `(@let name value)`
    fn form_let(&mut self, args: &[Node]) -> Result<(), CompileError> {
        let [Node::Ident(name), value] = args else {
            return Err(CompileError::MalformedForm {
                form: "@let",
                reason: "expected a name and a value",
            });
        };
        self.node(value)?;
        let slot = self.bind_slot(name)?;
        self.bcb.emit(Opcode::Var, slot);
        self.mark_visible(name);
        Ok(())
    }

    /// `(@fn name[param…] body…)`
    ///
    /// Emits a jump over the body so sequential execution skips it, binds
    /// each parameter at entry and terminates with `LEAVE`. The function is
    /// recorded before its body compiles, so it can call itself.
    fn form_fn(&mut self, args: &[Node]) -> Result<(), CompileError> {
        let (name, params, body) = match args {
            [Node::Ident(name), Node::Array(params), body @ ..] if !body.is_empty() => {
                (name, params, body)
            }
            _ => {
                return Err(CompileError::MalformedForm {
                    form: "@fn",
                    reason: "expected a name, a parameter list and a body",
                })
            }
        };
        let param_names: Vec<&String> = params
            .iter()
            .map(|p| match p {
                Node::Ident(name) => Ok(name),
                _ => Err(CompileError::MalformedForm {
                    form: "@fn",
                    reason: "parameters must be identifiers",
                }),
            })
            .collect::<Result<_, _>>()?;
        if param_names.len() > CALL_ARG_SLOTS {
            return Err(CompileError::MalformedForm {
                form: "@fn",
                reason: "too many parameters",
            });
        }

        let over = self.bcb.emit(Opcode::Jmp, 0);
        let entry = self.bcb.len();

        self.functions.insert(name.clone(), self.function_infos.len());
        self.function_infos.push(FunctionInfo {
            name: name.clone(),
            bytecode_index: entry,
            argument_count: param_names.len(),
            size: 0,
        });
        self.mark_visible(name);
        let info_idx = self.function_infos.len() - 1;

        self.scopes.push(HashSet::new());
        // `CALL` seeded argument i into variable slot i; rebind it to the
        // parameter's hashed slot
        for (i, param) in param_names.iter().enumerate() {
            let slot = self.bind_slot(param)?;
            self.bcb.emit(Opcode::Loadv, i as u32);
            self.bcb.emit(Opcode::Var, slot);
            self.mark_visible(param);
        }
        for node in body {
            self.node(node)?;
        }
        self.bcb.emit(Opcode::Leave, 0);
        self.scopes.pop();

        self.function_infos[info_idx].size = self.bcb.len() - entry;
        self.bcb.patch(over, self.bcb.len() as u32);
        Ok(())
    }

    /// `(@match cond (pattern body…)… (_ body…)?)`
    fn form_match(&mut self, args: &[Node]) -> Result<(), CompileError> {
        let [cond, arms @ ..] = args else {
            return Err(CompileError::MalformedForm {
                form: "@match",
                reason: "expected a condition",
            });
        };
        self.node(cond)?;
        if arms.is_empty() {
            // no arms: the condition value is the result
            return Ok(());
        }

        let rc = self.alloc_register()?;
        self.bcb.emit(Opcode::Store, rc);
        let mut end_jumps = Vec::new();
        let mut saw_default = false;

        for arm in arms {
            if saw_default {
                return Err(CompileError::MalformedForm {
                    form: "@match",
                    reason: "the default arm must be last",
                });
            }
            let (pattern, body) = arm_parts(arm)?;
            if matches!(&pattern, Node::Ident(name) if name == "_") {
                saw_default = true;
                for node in &body {
                    self.node(node)?;
                }
                end_jumps.push(self.bcb.emit(Opcode::Jmp, 0));
                continue;
            }
            self.node(&pattern)?;
            self.bcb.emit(Opcode::Eq, rc);
            let miss = self.bcb.emit(Opcode::Jmpf, 0);
            for node in &body {
                self.node(node)?;
            }
            end_jumps.push(self.bcb.emit(Opcode::Jmp, 0));
            self.bcb.patch(miss, self.bcb.len() as u32);
        }

        if !saw_default {
            // nothing matched: fall back to the condition value
            self.bcb.emit(Opcode::Load, rc);
        }
        let end = self.bcb.len() as u32;
        for at in end_jumps {
            self.bcb.patch(at, end);
        }
        self.free_register(rc);
        Ok(())
    }

    /// `(@idx target index)`: arrays index by integer, objects by string.
    fn form_idx(&mut self, args: &[Node]) -> Result<(), CompileError> {
        let [target, index] = args else {
            return Err(CompileError::MalformedForm {
                form: "@idx",
                reason: "expected a target and an index",
            });
        };
        self.node(target)?;
        let r = self.alloc_register()?;
        self.bcb.emit(Opcode::Store, r);
        self.node(index)?;
        self.bcb.emit(Opcode::Idx, r);
        self.free_register(r);
        Ok(())
    }

    /// `(@assert expr)`
    fn form_assert(&mut self, args: &[Node]) -> Result<(), CompileError> {
        let [expr] = args else {
            return Err(CompileError::MalformedForm {
                form: "@assert",
                reason: "expected exactly one expression",
            });
        };
        self.node(expr)?;
        self.bcb.emit(Opcode::Assert, 0);
        Ok(())
    }
}

/// Frame slot register `r` spills into around a call.
const fn spill_slot(r: u32) -> u32 {
    REGISTER_SPILL_SLOTS as u32 + r - 1
}

/// Splits a match arm into pattern and body. Arms surface as call nodes
/// when the pattern is an identifier (`(_ body)`) and would be rejected as
/// expressions otherwise, so both shapes are unpacked here.
fn arm_parts(arm: &Node) -> Result<(Node, Vec<Node>), CompileError> {
    match arm {
        Node::List(items) if !items.is_empty() => {
            Ok((items[0].clone(), items[1..].to_vec()))
        }
        Node::Call { name, args } => Ok((Node::Ident(name.clone()), args.clone())),
        _ => Err(CompileError::MalformedForm {
            form: "@match",
            reason: "an arm is `(pattern body…)`",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pg::Config;

    fn compile_src(src: &str) -> Result<(Program, Interner), CompileError> {
        let nodes = crate::parser::Parser::new(src)
            .expect("lexes")
            .parse()
            .expect("parses");
        let mut interner = Interner::new();
        let builtins = Builtins::std(&Config::default()).expect("std registers");
        compile(&nodes, &mut interner, &builtins).map(|p| (p, interner))
    }

    fn ops(program: &Program) -> Vec<Opcode> {
        program
            .bytecode
            .chunks(2)
            .map(|pair| Opcode::try_from(pair[0]).expect("valid opcode"))
            .collect()
    }

    #[test]
    fn identical_literals_share_one_global_slot() {
        let (program, _) = compile_src("(@len \"hello\") (@len \"hello\")").expect("compiles");
        // singletons + one shared string
        assert_eq!(program.globals.len(), 4);
    }

    #[test]
    fn booleans_use_the_interned_singletons() {
        let (program, _) = compile_src("(@assert true)").expect("compiles");
        assert_eq!(
            program.bytecode[..2],
            [Opcode::Loadg as u32, GLOBAL_TRUE]
        );
    }

    #[test]
    fn binary_operator_reserves_and_frees_a_register() {
        let (program, _) = compile_src("(+ 1 2) (+ 3 4)").expect("compiles");
        let words = &program.bytecode;
        // both operators use the same temporary register
        assert_eq!(words[3], words[11]);
        assert_eq!(
            ops(&program),
            vec![
                Opcode::Loadg,
                Opcode::Store,
                Opcode::Loadg,
                Opcode::Add,
                Opcode::Loadg,
                Opcode::Store,
                Opcode::Loadg,
                Opcode::Add,
            ]
        );
    }

    #[test]
    fn function_definition_jumps_over_its_body() {
        let (program, _) = compile_src("(@fn id[x] x) (id 1)").expect("compiles");
        assert_eq!(program.functions.len(), 1);
        let info = &program.functions[0];
        assert_eq!(info.name, "id");
        assert_eq!(info.argument_count, 1);
        // the leading jump skips exactly the recorded body
        assert_eq!(program.bytecode[0], Opcode::Jmp as u32);
        assert_eq!(
            program.bytecode[1] as usize,
            info.bytecode_index + info.size
        );
        // body ends in LEAVE
        let leave_at = info.bytecode_index + info.size - 2;
        assert_eq!(program.bytecode[leave_at], Opcode::Leave as u32);
    }

    #[test]
    fn calls_are_arity_checked() {
        assert!(matches!(
            compile_src("(@fn id[x] x) (id 1 2)"),
            Err(CompileError::ArityMismatch { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn unbound_identifiers_are_rejected() {
        assert!(matches!(
            compile_src("(+ missing 1)"),
            Err(CompileError::UnboundIdentifier(name)) if name == "missing"
        ));
    }

    #[test]
    fn zero_arg_call_of_a_variable_loads_it() {
        let (program, _) = compile_src("(@let name \"user\") (name)").expect("compiles");
        assert_eq!(
            ops(&program),
            vec![Opcode::Loadg, Opcode::Var, Opcode::Loadv]
        );
        // the load reads the slot the let bound
        assert_eq!(program.bytecode[3], program.bytecode[5]);
    }

    #[test]
    fn same_name_resolves_to_the_same_slot_everywhere() {
        let (program, _) =
            compile_src("(@let a 1) (@fn f[a] a) (a)").expect("compiles");
        let words = &program.bytecode;
        let var_slot = words[3];
        // the prologue rebind targets the shared slot
        let prologue_var = words
            .chunks(2)
            .filter(|pair| pair[0] == Opcode::Var as u32)
            .nth(1)
            .expect("prologue VAR")[1];
        assert_eq!(var_slot, prologue_var);
    }

    #[test]
    fn distinct_names_get_distinct_slots_above_the_arg_window() {
        let (program, _) = compile_src("(@let a 1) (@let b 2)").expect("compiles");
        let a_slot = program.bytecode[3];
        let b_slot = program.bytecode[7];
        assert_ne!(a_slot, b_slot);
        assert!(a_slot as usize >= CALL_ARG_SLOTS);
        assert!(b_slot as usize >= CALL_ARG_SLOTS);
    }

    #[test]
    fn match_without_arms_keeps_the_condition() {
        let (program, _) = compile_src("(@match true)").expect("compiles");
        assert_eq!(ops(&program), vec![Opcode::Loadg]);
    }

    #[test]
    fn match_arms_compare_and_jump() {
        let (program, _) =
            compile_src("(@let n 1) (@match n (0 \"zero\") (_ \"other\"))").expect("compiles");
        let ops = ops(&program);
        assert!(ops.contains(&Opcode::Eq));
        assert!(ops.contains(&Opcode::Jmpf));
        assert!(ops.contains(&Opcode::Jmp));
    }

    #[test]
    fn array_literal_appends_into_a_temporary() {
        let (program, _) = compile_src("[1 2]").expect("compiles");
        assert_eq!(
            ops(&program),
            vec![
                Opcode::Size,
                Opcode::New,
                Opcode::Store,
                Opcode::Loadg,
                Opcode::Append,
                Opcode::Loadg,
                Opcode::Append,
                Opcode::Load,
            ]
        );
    }

    #[test]
    fn multi_arg_builtin_announces_its_window() {
        let (program, _) = compile_src("(@println 1 2)").expect("compiles");
        let ops = ops(&program);
        assert!(ops.contains(&Opcode::Args));
        assert_eq!(*ops.last().unwrap(), Opcode::Sys);
    }

    #[test]
    fn single_arg_builtin_skips_the_window() {
        let (program, _) = compile_src("(@len \"x\")").expect("compiles");
        assert_eq!(ops(&program), vec![Opcode::Loadg, Opcode::Sys]);
    }

    #[test]
    fn unknown_builtin_is_a_compile_error() {
        assert!(matches!(
            compile_src("(@nope 1)"),
            Err(CompileError::UnknownBuiltin(path)) if path == "nope"
        ));
    }
}
