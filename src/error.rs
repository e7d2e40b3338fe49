//! Pipeline error implementation
//!
//! Every stage owns its error enum; [`Error`] wraps them for hosts that only
//! care about "did the program run".

use std::io;

use thiserror::Error;

/// Top-level error for the whole pipeline, from reading source to the last
/// executed instruction.
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be tokenized or did not form valid trees.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// The AST could not be lowered to bytecode.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    /// Execution aborted.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
    /// I/O and OS related errors.
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit code a host should surface for this error.
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Tokenizer and parser errors. Carry the source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A byte the lexer has no rule for.
    #[error("unexpected character `{ch}` at {line}:{col}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
    /// A string literal ran into the end of the input.
    #[error("unterminated string starting at {line}:{col}")]
    UnterminatedString {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
    /// The parser expected something else here.
    #[error("unexpected token `{token}` at {line}:{col}: {expected}")]
    UnexpectedToken {
        /// Token the parser saw.
        token: String,
        /// What would have been valid.
        expected: &'static str,
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
    /// The input ended inside an open form.
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(&'static str),
}

/// Lowering errors raised by the bytecode compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// `@name` did not resolve to a builtin or compile-time form.
    #[error("unknown builtin `@{0}`")]
    UnknownBuiltin(String),
    /// A call head did not resolve to a defined function.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// An identifier was used before any `@let` or parameter bound it.
    #[error("unbound identifier `{0}`")]
    UnboundIdentifier(String),
    /// A user function was called with the wrong number of arguments.
    #[error("`{name}` takes {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Declared parameter count.
        expected: usize,
        /// Arguments at the call site.
        got: usize,
    },
    /// The global constant pool is full.
    #[error("too many globals (limit {0})")]
    TooManyGlobals(usize),
    /// Expression nesting exhausted the register file.
    #[error("out of registers")]
    OutOfRegisters,
    /// Two identifiers hash into the same variable-table slot and probing
    /// could not separate them.
    #[error("variable table exhausted while binding `{0}`")]
    VariableTableFull(String),
    /// A builtin registration collided on its name hash.
    #[error("builtin name hash collision for `{0}`")]
    BuiltinCollision(String),
    /// The flat builtin table is full.
    #[error("too many builtins (limit {0})")]
    TooManyBuiltins(usize),
    /// A special form was syntactically malformed.
    #[error("malformed `{form}`: {reason}")]
    MalformedForm {
        /// The special form, e.g. `@fn`.
        form: &'static str,
        /// Human readable explanation.
        reason: &'static str,
    },
}

/// Runtime errors. All of these abort the VM; there is no user-visible
/// exception mechanism — recoverable absence is modeled by `Option` values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// An operator was applied to operands it has no rule for.
    #[error("can not perform `{lhs}` {op} `{rhs}`")]
    Type {
        /// Operator mnemonic.
        op: &'static str,
        /// Left operand type name.
        lhs: &'static str,
        /// Right operand type name.
        rhs: &'static str,
    },
    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// `ASSERT` saw something other than `true`.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// `LOADV` found no binding in the frame chain.
    #[error("undefined variable (slot {0})")]
    UndefinedVariable(u32),
    /// Array access past the end.
    #[error("index {idx} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index.
        idx: i64,
        /// Array length.
        len: usize,
    },
    /// Map access with an absent key.
    #[error("key `{0}` not found")]
    KeyNotFound(String),
    /// Indexing with an incompatible subject or key type.
    #[error("can not index into `{target}` with `{index}`")]
    BadIndex {
        /// Type name of the indexed value.
        target: &'static str,
        /// Type name of the index.
        index: &'static str,
    },
    /// The instruction word is not a known opcode.
    #[error("unimplemented instruction `{0}`")]
    InvalidOpcode(u32),
    /// An instruction referenced a register outside the file.
    #[error("invalid register {0}")]
    InvalidRegister(u32),
    /// `LOADG` referenced a slot outside the global pool.
    #[error("invalid global {0}")]
    InvalidGlobal(u32),
    /// `SYS` referenced a slot outside the builtin table.
    #[error("invalid builtin {0}")]
    InvalidBuiltin(u32),
    /// `LEAVE` executed with no frame to return to.
    #[error("leave outside of a call")]
    UnexpectedLeave,
    /// A builtin was invoked with an argument count it does not accept.
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    BuiltinArity {
        /// Builtin name.
        name: &'static str,
        /// Accepted argument count.
        expected: &'static str,
        /// Arguments provided via `ARGS`.
        got: usize,
    },
    /// A builtin was invoked with an argument of the wrong type.
    #[error("`{name}`: expected `{expected}`, got `{got}`")]
    BuiltinType {
        /// Builtin name.
        name: &'static str,
        /// Accepted argument type.
        expected: &'static str,
        /// Type name of the offending argument.
        got: &'static str,
    },
    /// The heap could not satisfy an allocation even after a collection
    /// cycle.
    #[error("out of memory: {requested} bytes requested, {limit} byte limit")]
    OutOfMemory {
        /// Size of the failing request.
        requested: usize,
        /// Configured ceiling.
        limit: usize,
    },
}
