//! End-to-end module execution: parse → compile → run → read back.

use wgsl_exec::{DecodedValue, ErrorKind, ExecConfig, WgslExec};

fn run(source: &str) -> WgslExec {
    let mut exec = WgslExec::new(source).expect("module compiles");
    exec.execute(&ExecConfig::default()).expect("module runs");
    exec
}

fn number(exec: &WgslExec, name: &str) -> f64 {
    exec.get_variable_value(name)
        .and_then(|v| v.as_f64())
        .unwrap_or_else(|| panic!("no numeric value for '{name}'"))
}

/// The canonical scenario: a module-scope `let` folds to its value.
#[test]
fn test_let_foo_is_three() {
    let exec = run("let foo = 1 + 2;");
    assert_eq!(exec.get_variable_value("foo"), Some(DecodedValue::Number(3.0)));
}

/// Module declarations run in source order and see earlier ones.
#[test]
fn test_declarations_in_source_order() {
    let exec = run(
        r#"
        const base = 10;
        let doubled = base * 2;
        var<private> total: i32 = doubled + 1;
        "#,
    );
    assert_eq!(number(&exec, "doubled"), 20.0);
    assert_eq!(number(&exec, "total"), 21.0);
}

/// Integer division by zero yields the dividend; remainder yields zero.
#[test]
fn test_integer_division_edge_cases() {
    let exec = run(
        r#"
        let zero = 0;
        let q = 7 / zero;
        let r = 7 % zero;
        let wrapped = 2147483647 + i32(1);
        "#,
    );
    assert_eq!(number(&exec, "q"), 7.0);
    assert_eq!(number(&exec, "r"), 0.0);
    assert_eq!(number(&exec, "wrapped"), i32::MIN as f64);
}

/// Struct values read back as member lists in declaration order.
#[test]
fn test_struct_read_back() {
    let exec = run(
        r#"
        struct Particle {
            pos: vec3<f32>,
            mass: f32,
        }
        let p = Particle(vec3(1.0, 2.0, 3.0), 4.0);
        "#,
    );
    let expected = DecodedValue::List(vec![
        DecodedValue::List(vec![
            DecodedValue::Number(1.0),
            DecodedValue::Number(2.0),
            DecodedValue::Number(3.0),
        ]),
        DecodedValue::Number(4.0),
    ]);
    assert_eq!(exec.get_variable_value("p"), Some(expected));
}

/// Matrices read back column by column.
#[test]
fn test_matrix_read_back() {
    let exec = run("let m = mat2x2<f32>(vec2(1.0, 2.0), vec2(3.0, 4.0)) * 2.0;");
    let value = exec.get_variable_value("m").unwrap();
    assert_eq!(value.flatten(), vec![2.0, 4.0, 6.0, 8.0]);
    assert_eq!(value.as_list().map(|l| l.len()), Some(2));
}

/// Function calls with parameters, nested calls and recursion-free chains.
#[test]
fn test_nested_function_calls() {
    let exec = run(
        r#"
        fn square(x: f32) -> f32 { return x * x; }
        fn hyp(a: f32, b: f32) -> f32 { return sqrt(square(a) + square(b)); }
        let h = hyp(3.0, 4.0);
        "#,
    );
    assert_eq!(number(&exec, "h"), 5.0);
}

/// Overrides take supplied constants by name, falling back to defaults.
#[test]
fn test_override_constants() {
    let source = r#"
        override gain: f32 = 1.0;
        override offset: f32 = 0.5;
        let out = 2.0 * gain + offset;
    "#;
    let mut exec = WgslExec::new(source).unwrap();
    exec.execute(&ExecConfig::default().with_constant("gain", 3.0))
        .unwrap();
    assert_eq!(number(&exec, "out"), 6.5);
}

/// `const_assert` failures abort the run with their line.
#[test]
fn test_const_assert_failure() {
    let mut exec = WgslExec::new("const a = 1;\nconst_assert a == 2;").unwrap();
    let err = exec.execute(&ExecConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.line, 2);
}

/// Undeclared functions are binding errors reported at the call line.
#[test]
fn test_undeclared_function() {
    let mut exec = WgslExec::new("let a = 1;\n\nlet b = nowhere(a);").unwrap();
    let err = exec.execute(&ExecConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Binding);
    assert_eq!(err.line, 3);
}

/// Unsupported builtins fail loudly instead of approximating.
#[test]
fn test_unimplemented_builtin() {
    let mut exec = WgslExec::new("fn f(x: f32) -> f32 { return dpdx(x); }\nlet y = f(1.0);").unwrap();
    let err = exec.execute(&ExecConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unimplemented);
    assert_eq!(err.line, 1);
}

/// Parse failures surface as `Parse` errors from `new`.
#[test]
fn test_parse_error() {
    let err = WgslExec::new("let = ;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

/// Running twice starts from a clean module scope.
#[test]
fn test_execute_is_repeatable() {
    let mut exec = WgslExec::new("var<private> n: i32 = 1;\nlet m = n + 1;").unwrap();
    exec.execute(&ExecConfig::default()).unwrap();
    exec.execute(&ExecConfig::default()).unwrap();
    assert_eq!(number(&exec, "m"), 2.0);
}

/// Operands left of a call are read before the call runs.
#[test]
fn test_operand_read_before_call() {
    let exec = run(
        r#"
        var<private> counter = 0;
        fn inc() -> i32 { counter += 1; return 10; }
        fn pair(a: i32, b: i32) -> i32 { return a * 100 + b; }
        let a = counter + inc();
        fn f() -> i32 { return counter * 1000 + inc(); }
        let b = f();
        fn g() -> i32 { return pair(counter, inc()); }
        let c = g();
        "#,
    );
    assert_eq!(number(&exec, "a"), 10.0);
    assert_eq!(number(&exec, "b"), 1010.0);
    assert_eq!(number(&exec, "c"), 210.0);
}

/// The right side of `&&` and `||` runs only when it decides the result.
#[test]
fn test_short_circuit_skips_call() {
    let exec = run(
        r#"
        var<private> calls = 0;
        fn bump(v: bool) -> bool { calls += 1; return v; }
        fn f() -> i32 {
            let a = false && bump(true);
            let b = true || bump(false);
            let c = true && bump(false);
            let d = false || bump(true);
            if ((a || b) && !c && d) { return calls; }
            return -1;
        }
        let result = f();
        "#,
    );
    assert_eq!(number(&exec, "result"), 2.0);
}

/// Whole-array assignment between different element types is rejected.
#[test]
fn test_array_assignment_checks_element_type() {
    let mut exec = WgslExec::new(
        "fn f() -> i32 {\n    var a: array<f32, 2>;\n    a = array<u32, 2>(1u, 2u);\n    return 0;\n}\nlet r = f();",
    )
    .unwrap();
    let err = exec.execute(&ExecConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.line, 3);
}

/// An untyped `array(..)` initializer takes the declared element type.
#[test]
fn test_untyped_array_initializer_takes_declared_type() {
    let exec = run(
        r#"
        fn f() -> f32 {
            var a: array<f32, 2> = array(1, 2);
            return a[0] + a[1] * 0.5;
        }
        let r = f();
        "#,
    );
    assert_eq!(number(&exec, "r"), 2.0);
}
