use treelox::ast::{Expr, Stmt};
use treelox::parser::Parser;
use treelox::resolver::{Locals, Resolver};
use treelox::scanner::scan_tokens;

fn parse(source: &str) -> Vec<Stmt> {
    let (tokens, errors) = scan_tokens(source);
    assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
    Parser::new(&tokens).parse().expect("source parses")
}

fn resolve(source: &str) -> Result<Locals, Vec<String>> {
    let program = parse(source);
    Resolver::new()
        .resolve(&program)
        .map_err(|errors| errors.iter().map(ToString::to_string).collect())
}

fn resolve_errors(source: &str) -> Vec<String> {
    resolve(source).expect_err("resolution should fail")
}

#[test]
fn globals_get_no_entry() {
    let locals = resolve("var a = 1; print a;").expect("resolves");
    assert!(locals.is_empty());
}

#[test]
fn hop_counts_follow_nesting() {
    let program = parse("{ var a = 1; { { print a; } } }");
    let locals = Resolver::new().resolve(&program).expect("resolves");

    // Dig out the `a` inside the innermost block.
    let Stmt::Block(outer) = &program[0] else { panic!() };
    let Stmt::Block(middle) = &outer[1] else { panic!() };
    let Stmt::Block(inner) = &middle[0] else { panic!() };
    let Stmt::Print(Expr::Variable { id, .. }) = &inner[0] else { panic!() };

    assert_eq!(locals.get(id), Some(&2));
}

#[test]
fn closures_resolve_through_function_scopes() {
    let locals = resolve(
        "fun makeCounter() { var i = 0; fun count() { i = i + 1; return i; } return count; }",
    )
    .expect("resolves");

    // `i` read and assigned from inside `count` (1 hop), `count` read in
    // makeCounter's body (0 hops).
    let mut distances: Vec<usize> = locals.values().copied().collect();
    distances.sort_unstable();
    assert_eq!(distances, [0, 1, 1, 1]);
}

#[test]
fn local_self_reference_in_initializer_is_an_error() {
    assert_eq!(
        resolve_errors("{ var a = a; }"),
        ["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );
}

#[test]
fn global_self_reference_is_allowed() {
    assert!(resolve("var a = a;").is_ok());
}

#[test]
fn duplicate_local_declaration_is_an_error() {
    assert_eq!(
        resolve_errors("fun f() { var a = 1; var a = 2; }"),
        ["[line 1] Error at 'a': Already a variable with this name in this scope."]
    );
}

#[test]
fn return_rules() {
    assert_eq!(
        resolve_errors("return 1;"),
        ["[line 1] Error at 'return': Can't return from top-level code."]
    );
    assert_eq!(
        resolve_errors("class A { init() { return 1; } }"),
        ["[line 1] Error at 'return': Can't return a value from an initializer."]
    );
    assert!(resolve("class A { init() { return; } }").is_ok());
}

#[test]
fn this_and_super_need_a_class() {
    assert_eq!(
        resolve_errors("print this;"),
        ["[line 1] Error at 'this': Can't use 'this' outside of a class."]
    );
    assert_eq!(
        resolve_errors("fun f() { super.go(); }"),
        ["[line 1] Error at 'super': Can't use 'super' outside of a class."]
    );
    assert_eq!(
        resolve_errors("class A { go() { super.go(); } }"),
        ["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
    );
}

#[test]
fn class_cannot_inherit_from_itself() {
    assert_eq!(
        resolve_errors("class A < A {}"),
        ["[line 1] Error at 'A': A class can't inherit from itself."]
    );
}

#[test]
fn errors_do_not_stop_resolution() {
    let errors = resolve_errors("return;\n{ var b = b; }\nprint this;");
    assert_eq!(errors.len(), 3);
    assert!(errors[0].starts_with("[line 1]"));
    assert!(errors[1].starts_with("[line 2]"));
    assert!(errors[2].starts_with("[line 3]"));
}

#[test]
fn resolving_twice_gives_the_same_table() {
    let program = parse(
        "class A { m() { return this; } }\n\
         class B < A { m() { var x = super.m(); { print x; } return x; } }\n\
         fun f(a) { fun g() { return a; } return g; }",
    );

    let mut resolver = Resolver::new();
    let first = resolver.resolve(&program).expect("resolves");
    let second = resolver.resolve(&program).expect("resolves");
    let fresh = Resolver::new().resolve(&program).expect("resolves");

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(first, fresh);
}
