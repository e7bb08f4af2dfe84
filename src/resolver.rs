//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return` / `this` / `super`, self‑inheritance).  Errors are collected and
//!    the walk carries on, so every problem in the tree is reported at once.
//! 3. Record, for *each* binding expression, how many scopes out its
//!    declaration lives.  Names found in no local scope are globals and get no
//!    entry: the interpreter looks those up in the global environment.

use std::collections::HashMap;

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};

/// Binding distances keyed by expression identity.
pub type Locals = HashMap<ExprId, usize>;

/// What kind of function body we are in.  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body we are in.  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    locals: Locals,
    errors: Vec<LoxError>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements and return the binding table, or every
    /// static error found.
    pub fn resolve(&mut self, statements: &[Stmt]) -> std::result::Result<Locals, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        let locals: Locals = std::mem::take(&mut self.locals);
        let errors: Vec<LoxError> = std::mem::take(&mut self.errors);

        if errors.is_empty() {
            info!("Resolved {} local binding(s)", locals.len());
            Ok(locals)
        } else {
            info!("Resolve failed with {} error(s)", errors.len());
            Err(errors)
        }
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // name is visible inside its own body, for recursion
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
    ) {
        let enclosing_class: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.bind_implicit("super");
        }

        self.begin_scope();
        self.bind_implicit("this");

        for method in methods {
            let kind: FunctionType = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => self.error(keyword, "Can't use 'super' outside of a class."),
                ClassType::Class => {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.")
                }
                ClassType::Subclass => self.resolve_local(*id, keyword),
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Bind `this` / `super` in the innermost scope.
    fn bind_implicit(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        debug!("Resolve error at line {}: {}", token.line, message);
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it unrecorded
    /// (global) if no local scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
