use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox::error::Failure;
use treelox::value::Value;
use treelox::Lox;

/// Output sink the test keeps a handle on after giving it to the session.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8(bytes).expect("output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn session() -> (Lox, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (Lox::with_output(Box::new(buffer.clone())), buffer)
}

fn run(source: &str) -> String {
    let (mut lox, buffer) = session();
    if let Err(failure) = lox.run_script(source) {
        panic!("program failed: {}", failure);
    }
    buffer.take()
}

/// Runs `source` expecting a failure; returns the output printed before it
/// and the failure itself.
fn run_failing(source: &str) -> (String, Failure) {
    let (mut lox, buffer) = session();
    let failure = lox.run_script(source).expect_err("program should fail");
    (buffer.take(), failure)
}

#[test]
fn arithmetic_and_printing() {
    assert_eq!(run("print 6 * 7;"), "42\n");
    assert_eq!(run("print 1 + 2 * 3 - 4 / 2;"), "5\n");
    assert_eq!(run("print 2.5 * 2;"), "5\n");
    assert_eq!(run("print 1 / 4;"), "0.25\n");
    assert_eq!(run("print -(3);"), "-3\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn mixed_plus_operands_are_a_runtime_error() {
    let (_, failure) = run_failing("print \"a\" + 1;");
    assert_eq!(failure.exit_code(), 70);
    assert_eq!(
        failure.to_string(),
        "Operands must be two numbers or two strings.\n[line 1]"
    );
}

#[test]
fn comparison_needs_numbers() {
    let (_, failure) = run_failing("print 1;\nprint \"a\" < 2;");
    assert_eq!(failure.to_string(), "Operands must be numbers.\n[line 2]");

    let (_, failure) = run_failing("print -\"x\";");
    assert_eq!(failure.to_string(), "Operand must be a number.\n[line 1]");
}

#[test]
fn truthiness_and_logic() {
    let source = r#"
        print !nil;
        print !0;
        print !"";
        print nil or "fallback";
        print false and undefined;
        print 1 == 1.0;
        print "a" != "a";
        print nil == false;
        if (0) print "yes"; else print "no";
        if (nil) print "yes"; else print "no";
    "#;
    assert_eq!(
        run(source),
        "true\nfalse\nfalse\nfallback\nfalse\ntrue\nfalse\nfalse\nyes\nno\n"
    );
}

#[test]
fn scoping_and_shadowing() {
    let source = r#"
        var a = "global";
        {
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        }
        print a;
    "#;
    assert_eq!(run(source), "inner\nouter\nglobal\n");
}

#[test]
fn closures_see_their_defining_scope() {
    let source = r#"
        var a = "global";
        {
            fun showA() { print a; }
            showA();
            var a = "block";
            showA();
        }
    "#;
    assert_eq!(run(source), "global\nglobal\n");
}

#[test]
fn counter_closure_keeps_state() {
    let source = r#"
        fun makeCounter() {
            var i = 0;
            fun count() {
                i = i + 1;
                print i;
            }
            return count;
        }
        var counter = makeCounter();
        counter();
        counter();
    "#;
    assert_eq!(run(source), "1\n2\n");
}

#[test]
fn loops_and_recursion() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 2) + fib(n - 1);
        }
        for (var i = 0; i < 8; i = i + 1) {
            print fib(i);
        }
        var n = 3;
        while (n > 0) n = n - 1;
        print n;
    "#;
    assert_eq!(run(source), "0\n1\n1\n2\n3\n5\n8\n13\n0\n");
}

#[test]
fn return_unwinds_out_of_loops() {
    let source = r#"
        fun first() {
            while (true) {
                for (var i = 0; ; i = i + 1) {
                    if (i == 3) return i;
                }
            }
        }
        print first();
        fun nothing() { return; }
        print nothing();
    "#;
    assert_eq!(run(source), "3\nnil\n");
}

#[test]
fn callables_render_by_kind() {
    let source = r#"
        fun f() {}
        class C {}
        print f;
        print C;
        print C();
        print clock;
    "#;
    assert_eq!(run(source), "<fn f>\nC\nC instance\n<native fn>\n");
}

#[test]
fn arity_is_checked() {
    let (_, failure) = run_failing("fun f() {}\nf(1);");
    assert_eq!(failure.to_string(), "Expected 0 arguments but got 1.\n[line 2]");

    let (_, failure) = run_failing("class P { init(x, y) {} }\nP(1);");
    assert_eq!(failure.to_string(), "Expected 2 arguments but got 1.\n[line 2]");
}

#[test]
fn only_callables_can_be_called() {
    let (_, failure) = run_failing("\"not a function\"();");
    assert_eq!(
        failure.to_string(),
        "Can only call functions and classes.\n[line 1]"
    );
}

#[test]
fn fields_and_methods() {
    let source = r#"
        class Point {
            init(x, y) {
                this.x = x;
                this.y = y;
            }
            sum() { return this.x + this.y; }
        }
        var p = Point(1, 2);
        print p.sum();
        p.x = 10;
        print p.sum();
        var m = p.sum;
        print m();
    "#;
    assert_eq!(run(source), "3\n12\n12\n");
}

#[test]
fn fields_shadow_methods() {
    let source = r#"
        class A { m() { return "method"; } }
        var a = A();
        print a.m();
        a.m = "field";
        print a.m;
    "#;
    assert_eq!(run(source), "method\nfield\n");
}

#[test]
fn init_always_returns_the_instance() {
    let source = r#"
        class Foo {
            init() {
                this.n = 1;
                return;
            }
        }
        var foo = Foo();
        var again = foo.init();
        print again == foo;
        print again.n;
    "#;
    assert_eq!(run(source), "true\n1\n");
}

#[test]
fn property_errors() {
    let (_, failure) = run_failing("class A {}\nprint A().missing;");
    assert_eq!(failure.to_string(), "Undefined property 'missing'.\n[line 2]");

    let (_, failure) = run_failing("var x = 1;\nprint x.y;");
    assert_eq!(failure.to_string(), "Only instances have properties.\n[line 2]");

    let (_, failure) = run_failing("var x = 1;\nx.y = 2;");
    assert_eq!(failure.to_string(), "Only instances have fields.\n[line 2]");
}

#[test]
fn inheritance_and_super() {
    let source = r#"
        class A {
            method() { print "A"; }
            inherited() { print "from A"; }
        }
        class B < A {
            method() {
                print "B";
                super.method();
            }
        }
        var b = B();
        b.method();
        b.inherited();
    "#;
    assert_eq!(run(source), "B\nA\nfrom A\n");
}

#[test]
fn super_is_bound_where_the_class_is_declared() {
    let source = r#"
        class A { say() { print "A"; } }
        class B < A { say() { super.say(); } }
        class C < B { say() { print "C"; super.say(); } }
        C().say();
    "#;
    assert_eq!(run(source), "C\nA\n");
}

#[test]
fn superclass_must_be_a_class() {
    let (_, failure) = run_failing("var NotAClass = 1;\nclass Sub < NotAClass {}");
    assert_eq!(failure.exit_code(), 70);
    assert_eq!(failure.to_string(), "Superclass must be a class.\n[line 2]");
}

#[test]
fn undefined_variables() {
    let (_, failure) = run_failing("print missing;");
    assert_eq!(failure.to_string(), "Undefined variable 'missing'.\n[line 1]");

    let (_, failure) = run_failing("missing = 1;");
    assert_eq!(failure.to_string(), "Undefined variable 'missing'.\n[line 1]");
}

#[test]
fn runtime_error_keeps_earlier_output() {
    let (output, failure) = run_failing("print 1;\nprint nil + 1;\nprint 3;");
    assert_eq!(output, "1\n");
    assert_eq!(failure.exit_code(), 70);
}

#[test]
fn static_errors_prevent_execution() {
    let (output, failure) = run_failing("print 1;\nprint ;");
    assert_eq!(output, "");
    assert_eq!(failure.exit_code(), 65);
    assert_eq!(failure.to_string(), "[line 2] Error at ';': Expect expression.");

    let (output, failure) = run_failing("print 1;\nreturn 2;");
    assert_eq!(output, "");
    assert_eq!(failure.exit_code(), 65);

    let (_, failure) = run_failing("var ok = 1;\nprint @ 1;\nprint ;");
    assert_eq!(failure.exit_code(), 65);
    assert_eq!(failure.errors().len(), 2);
}

#[test]
fn division_by_zero_follows_floating_point() {
    assert_eq!(run("print 1 / 0;"), "inf\n");
    assert_eq!(run("print -1 / 0;"), "-inf\n");
    assert_eq!(run("var n = 0 / 0; print n == n;"), "false\n");
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(run("print clock() > 1000000000;"), "true\n");
}

#[test]
fn host_natives_are_callable() {
    let (mut lox, buffer) = session();
    lox.define_native("double", 1, |args: &[Value]| match args {
        [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
        _ => Err("double expects a number.".to_string()),
    });

    lox.run_script("print double(21);").expect("runs");
    assert_eq!(buffer.take(), "42\n");

    let failure = lox.run_script("\ndouble(\"x\");").expect_err("native error");
    assert_eq!(failure.to_string(), "double expects a number.\n[line 2]");
}

#[test]
fn repl_lines_share_state() {
    let (mut lox, buffer) = session();

    lox.run_line("var count = 1;").expect("declares");
    lox.run_line("fun bump() { count = count + 1; return count; }")
        .expect("declares function");
    lox.run_line("{ var local = bump(); print local; }").expect("runs");
    lox.run_line("class K { get() { return count; } }").expect("declares class");
    lox.run_line("print K().get();").expect("runs");

    assert_eq!(buffer.take(), "2\n2\n");
}

#[test]
fn repl_recovers_after_errors() {
    let (mut lox, buffer) = session();

    lox.run_line("var a = 1;").expect("declares");
    assert_eq!(lox.run_line("print a +;").map_err(|f| f.exit_code()), Err(65));
    assert_eq!(lox.run_line("print a + nil;").map_err(|f| f.exit_code()), Err(70));

    lox.run_line("print a;").expect("session still usable");
    assert_eq!(buffer.take(), "1\n");
}

#[test]
fn environment_is_restored_after_a_failing_block() {
    let (mut lox, buffer) = session();

    lox.run_line("var x = \"global\";").expect("declares");
    lox.run_line("{ var x = \"shadow\"; print nil + 1; }")
        .expect_err("block fails");
    lox.run_line("print x;").expect("runs");

    assert_eq!(buffer.take(), "global\n");
}

#[test]
fn deep_recursion_in_closures_keeps_distinct_frames() {
    let source = r#"
        fun adder(n) {
            fun add(m) { return n + m; }
            return add;
        }
        var add2 = adder(2);
        var add5 = adder(5);
        print add2(1);
        print add5(1);
    "#;
    assert_eq!(run(source), "3\n6\n");
}
