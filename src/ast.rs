//! AST consumed by the bytecode compiler

use crate::bytecode::Opcode;

/// A literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    /// String literal or quoted symbol.
    Str(String),
    /// Whole number.
    Int(i64),
    /// Floating point number.
    Double(f64),
    /// `true` / `false`.
    Bool(bool),
}

/// Binary operators. The discriminants double as opcodes, so lowering an
/// operator is a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BinOp {
    /// `+`
    Add = 2,
    /// `-`
    Sub = 3,
    /// `*`
    Mul = 4,
    /// `/`
    Div = 5,
    /// `=`
    Eq = 6,
    /// `<`
    Lt = 7,
    /// `>`
    Gt = 8,
}

impl BinOp {
    /// The instruction implementing this operator.
    pub const fn opcode(self) -> Opcode {
        match self {
            BinOp::Add => Opcode::Add,
            BinOp::Sub => Opcode::Sub,
            BinOp::Mul => Opcode::Mul,
            BinOp::Div => Opcode::Div,
            BinOp::Eq => Opcode::Eq,
            BinOp::Lt => Opcode::Lt,
            BinOp::Gt => Opcode::Gt,
        }
    }

    /// Operator glyph for diagnostics.
    pub const fn glyph(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
        }
    }
}

/// One node of the source tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Strings, numbers, booleans.
    Atom(Atom),
    /// An identifier in value position; compiles to a variable load.
    Ident(String),
    /// `(+ a b)` and friends.
    Bin {
        /// The operator.
        op: BinOp,
        /// Operands; the compiler enforces exactly two.
        args: Vec<Node>,
    },
    /// `(name arg…)`: user function call, or a variable load for `(name)`.
    Call {
        /// Callee name.
        name: String,
        /// Argument expressions.
        args: Vec<Node>,
    },
    /// `(@path arg…)`: builtin invocation or compile-time form.
    Builtin {
        /// Dotted path after the `@`.
        path: String,
        /// Argument expressions.
        args: Vec<Node>,
    },
    /// `[e…]` list literal.
    Array(Vec<Node>),
    /// `{k: v, …}` object literal.
    Object(Vec<(Node, Node)>),
    /// A parenthesized form headed by a literal, e.g. a `@match` arm like
    /// `(0 "zero")`. Not a standalone expression.
    List(Vec<Node>),
}
