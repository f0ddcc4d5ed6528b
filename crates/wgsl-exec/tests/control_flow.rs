//! Structured control flow lowered to command streams.

use wgsl_exec::{ExecConfig, WgslExec};

fn eval_fn(body: &str) -> f64 {
    let source = format!("fn f() -> i32 {{\n{body}\n}}\nlet result = f();");
    let mut exec = WgslExec::new(&source).expect("module compiles");
    exec.execute(&ExecConfig::default()).expect("module runs");
    exec.get_variable_value("result")
        .and_then(|v| v.as_f64())
        .expect("numeric result")
}

#[test]
fn test_if_else_chain() {
    let body = r#"
        var out = 0;
        for (var i = 0; i < 4; i++) {
            if (i == 0) { out += 1; }
            else if (i == 1) { out += 10; }
            else { out += 100; }
        }
        return out;
    "#;
    assert_eq!(eval_fn(body), 211.0);
}

#[test]
fn test_while_with_break_and_continue() {
    let body = r#"
        var i = 0;
        var sum = 0;
        while (true) {
            i++;
            if (i > 10) { break; }
            if (i % 2 == 0) { continue; }
            sum += i;
        }
        return sum;
    "#;
    assert_eq!(eval_fn(body), 25.0);
}

/// `continue` in a `for` still runs the update expression.
#[test]
fn test_for_continue_runs_update() {
    let body = r#"
        var n = 0;
        for (var i = 0; i < 5; i += 1) {
            if (i == 2) { continue; }
            n += 1;
        }
        return n;
    "#;
    assert_eq!(eval_fn(body), 4.0);
}

/// `loop` with a `continuing` block and `break if`.
#[test]
fn test_loop_continuing_break_if() {
    let body = r#"
        var i = 0;
        var acc = 0;
        loop {
            acc += i;
            continuing {
                i += 1;
                break if i >= 4;
            }
        }
        return acc;
    "#;
    assert_eq!(eval_fn(body), 6.0);
}

/// A taken `break if` leaves without running `continuing`.
#[test]
fn test_break_if_skips_continuing() {
    let body = r#"
        var i = 0;
        var ran = 0;
        loop {
            i += 1;
            break if i >= 3;
            continuing { ran += 1; }
        }
        return ran * 10 + i;
    "#;
    assert_eq!(eval_fn(body), 23.0);
}

/// `continue` inside `loop` jumps to the continuing block.
#[test]
fn test_loop_continue_enters_continuing() {
    let body = r#"
        var i = 0;
        var odd = 0;
        loop {
            if (i >= 6) { break; }
            if (i % 2 == 0) { continue; }
            odd += 1;
            continuing { i += 1; }
        }
        return odd;
    "#;
    assert_eq!(eval_fn(body), 3.0);
}

#[test]
fn test_switch_cases_and_default() {
    let body = r#"
        var out = 0;
        for (var i = 0; i < 5; i++) {
            switch i {
                case 0, 1: { out += 1; }
                case 2: { out += 10; break; }
                default: { out += 100; }
            }
        }
        return out;
    "#;
    assert_eq!(eval_fn(body), 212.0);
}

/// `break` inside a switch leaves the switch, not the enclosing loop.
#[test]
fn test_break_in_switch_stays_in_loop() {
    let body = r#"
        var count = 0;
        for (var i = 0; i < 3; i++) {
            switch i {
                default: { break; }
            }
            count += 1;
        }
        return count;
    "#;
    assert_eq!(eval_fn(body), 3.0);
}

/// Early return from nested loops unwinds every block frame.
#[test]
fn test_return_from_nested_loops() {
    let body = r#"
        for (var i = 0; i < 10; i++) {
            for (var j = 0; j < 10; j++) {
                if (i * j == 12) { return i * 100 + j; }
            }
        }
        return -1;
    "#;
    assert_eq!(eval_fn(body), 206.0);
}

/// Locals declared inside a loop body are fresh each iteration.
#[test]
fn test_loop_locals_are_per_iteration() {
    let body = r#"
        var total = 0;
        for (var i = 0; i < 3; i++) {
            var local = 0;
            local += i;
            total += local;
        }
        return total;
    "#;
    assert_eq!(eval_fn(body), 3.0);
}

/// Calls in loop conditions are re-evaluated every iteration.
#[test]
fn test_call_in_loop_condition() {
    let source = r#"
        var<private> calls = 0;
        fn below(i: i32, n: i32) -> bool { calls += 1; return i < n; }
        fn f() -> i32 {
            var i = 0;
            while (below(i, 3)) { i++; }
            return calls;
        }
        let result = f();
    "#;
    let mut exec = WgslExec::new(source).unwrap();
    exec.execute(&ExecConfig::default()).unwrap();
    assert_eq!(exec.get_variable_value("result").and_then(|v| v.as_f64()), Some(4.0));
}
