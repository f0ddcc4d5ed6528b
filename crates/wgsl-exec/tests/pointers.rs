//! Pointers share storage with the variable they point into.

use wgsl_exec::{DecodedValue, ExecConfig, WgslExec};

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

/// Writes through a pointer to a struct field land in the struct, and
/// writes to the struct are visible through the pointer.
#[test]
fn test_pointer_to_struct_member_aliases() {
    let exec = run(
        r#"
        struct Pair { a: i32, b: i32 }
        fn f() -> vec2<i32> {
            var pair = Pair(1, 2);
            let p = &pair.b;
            *p = 20;
            let seen_by_struct = pair.b;
            pair.b = 30;
            let seen_by_pointer = *p;
            return vec2(seen_by_struct, seen_by_pointer);
        }
        let r = f();
        "#,
    );
    assert_eq!(exec.get_variable_value("r").unwrap().flatten(), vec![20.0, 30.0]);
}

/// `ptr<function, T>` parameters write back into the caller's variable.
#[test]
fn test_pointer_parameter_writes_back() {
    let exec = run(
        r#"
        fn bump(p: ptr<function, i32>, by: i32) {
            *p = *p + by;
        }
        fn f() -> i32 {
            var x = 5;
            bump(&x, 3);
            bump(&x, 4);
            return x;
        }
        let r = f();
        "#,
    );
    assert_eq!(number(&exec, "r"), 12.0);
}

/// Members of a struct pointer are reachable without an explicit deref.
#[test]
fn test_struct_pointer_member_access() {
    let exec = run(
        r#"
        struct Body { pos: vec2<f32>, vel: vec2<f32> }
        fn advance(body: ptr<function, Body>, dt: f32) {
            body.pos += body.vel * dt;
            (*body).vel.y -= 1.0;
        }
        fn f() -> Body {
            var b = Body(vec2(0.0, 0.0), vec2(2.0, 4.0));
            advance(&b, 0.5);
            return b;
        }
        let r = f();
        "#,
    );
    let r = exec.get_variable_value("r").unwrap();
    assert_eq!(r.flatten(), vec![1.0, 2.0, 2.0, 3.0]);
}

/// A pointer to an array element follows the element, not a copy.
#[test]
fn test_pointer_to_array_element() {
    let exec = run(
        r#"
        fn f() -> array<u32, 3> {
            var values = array<u32, 3>(1u, 2u, 3u);
            let last = &values[2];
            *last *= 10u;
            values[0] = *last;
            return values;
        }
        let r = f();
        "#,
    );
    assert_eq!(
        exec.get_variable_value("r"),
        Some(DecodedValue::List(vec![
            DecodedValue::Number(30.0),
            DecodedValue::Number(2.0),
            DecodedValue::Number(30.0),
        ]))
    );
}

/// Private module variables are reachable through `ptr<private, T>`.
#[test]
fn test_private_pointer() {
    let exec = run(
        r#"
        var<private> total: f32;
        fn add(dst: ptr<private, f32>, v: f32) { *dst += v; }
        fn f() -> f32 {
            add(&total, 1.5);
            add(&total, 2.0);
            return total;
        }
        let r = f();
        "#,
    );
    assert_eq!(number(&exec, "r"), 3.5);
}
