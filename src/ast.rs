//! Syntax tree produced by the [`Parser`](crate::parser::Parser) and walked by
//! the resolver and the interpreter.
//!
//! Nodes that name a binding (`Variable`, `Assign`, `This`, `Super`) carry an
//! [`ExprId`].  Ids are unique per syntactic occurrence, so two identical
//! expressions at different places in the source are still told apart by the
//! resolver's side table.

use std::rc::Rc;

use crate::token::Token;

/// Stable identity of a binding expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

impl ExprId {
    /// The id that follows this one.
    pub fn next(self) -> ExprId {
        ExprId(self.0 + 1)
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// `true` / `false`.
    Bool(bool),

    /// The `nil` literal.
    Nil,
}

/// Every kind of *expression* in Lox.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression: `!isReady`, `-42`.
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix arithmetic, comparison or equality: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function‑, method‑ or class call.
    Call {
        callee: Box<Expr>,
        /// The closing `)` ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `this` inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

/// A function or method declaration.  Shared by every function value created
/// from it, so the body is never cloned at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Every kind of *statement*.  `for` loops never appear here: the parser
/// lowers them to `While` inside a `Block`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print expr;`
    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword (for error locations).
        keyword: Token,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
