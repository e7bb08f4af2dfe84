use crate::ast::{Expr, LiteralValue, Stmt};

/// Converts syntax trees to the Crafting‑Interpreters prefix form, e.g.
/// `(* (- 123.0) (group 45.67))`.  Debug aid for the `parse` command.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    /// One statement, nested statements inline.
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::sequence("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                let head = format!("fun {}({})", decl.name.lexeme, params.join(" "));
                Self::sequence(&head, &decl.body)
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(" < ");
                    s.push_str(&Self::print(superclass));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(&Stmt::Function(method.clone())));
                }
                s.push(')');
                s
            }
        }
    }

    fn sequence(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::scan_tokens;

    fn parse(source: &str) -> Vec<Stmt> {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty());
        Parser::new(&tokens).parse().expect("source parses")
    }

    #[test]
    fn prints_nested_expression() {
        let program = parse("-123 * (45.67);");
        assert_eq!(
            AstPrinter::print_stmt(&program[0]),
            "(; (* (- 123.0) (group 45.67)))"
        );
    }

    #[test]
    fn prints_desugared_for_loop() {
        let program = parse("for (var i = 0; i < 2; i = i + 1) print i;");
        assert_eq!(
            AstPrinter::print_stmt(&program[0]),
            "(block (var i 0.0) (while (< i 2.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn prints_class_with_superclass() {
        let program = parse("class B < A { go() { return super.go(); } }");
        assert_eq!(
            AstPrinter::print_stmt(&program[0]),
            "(class B < A (fun go() (return (call (super go)))))"
        );
    }
}
