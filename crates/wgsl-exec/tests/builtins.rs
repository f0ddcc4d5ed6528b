//! Standard-library functions called from WGSL source.

use wgsl_exec::{ErrorKind, ExecConfig, WgslExec};

fn run(source: &str) -> WgslExec {
    let mut exec = WgslExec::new(source).expect("module compiles");
    exec.execute(&ExecConfig::default()).expect("module runs");
    exec
}

fn flat(exec: &WgslExec, name: &str) -> Vec<f64> {
    exec.get_variable_value(name)
        .unwrap_or_else(|| panic!("'{name}' is not declared"))
        .flatten()
}

#[test]
fn test_cross_of_unit_axes() {
    let exec = run("let c = cross(vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0));");
    assert_eq!(flat(&exec, "c"), vec![0.0, 0.0, 1.0]);
}

/// `cross` on anything but three lanes is a type error at the call line.
#[test]
fn test_cross_rejects_vec2() {
    let mut exec = WgslExec::new("let a = 1;\nlet c = cross(vec2(1.0, 0.0), vec2(0.0, 1.0));").unwrap();
    let err = exec.execute(&ExecConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.line, 2);
}

/// A componentwise builtin on a vector equals the builtin mapped over
/// its lanes.
#[test]
fn test_componentwise_matches_per_lane() {
    let unary = ["abs", "sign", "floor", "ceil", "fract", "sqrt", "exp", "log", "sin", "cos", "round", "trunc", "inverseSqrt", "saturate"];
    for name in unary {
        let source = format!(
            "const v = vec3<f32>(0.25, 1.5, 4.75);\n\
             let whole = {name}(v);\n\
             let lanes = vec3<f32>({name}(v.x), {name}(v.y), {name}(v.z));\n\
             let same = all(whole == lanes);"
        );
        let exec = run(&source);
        assert_eq!(flat(&exec, "whole"), flat(&exec, "lanes"), "{name}");
        assert_eq!(flat(&exec, "same"), vec![1.0], "{name}");
    }
}

/// Binary and ternary builtins broadcast scalars and preserve lane types.
#[test]
fn test_multi_argument_componentwise() {
    let exec = run(
        r#"
        let m = max(vec3<i32>(1, 5, -2), vec3<i32>(3, 2, -7));
        let c = clamp(vec4<u32>(0u, 5u, 10u, 15u), vec4<u32>(2u), vec4<u32>(12u));
        let p = pow(vec2<f32>(2.0, 3.0), vec2<f32>(3.0, 2.0));
        let s = smoothstep(0.0, 1.0, 0.5);
        let mx = mix(vec2(0.0, 10.0), vec2(10.0, 20.0), 0.25);
        "#,
    );
    assert_eq!(flat(&exec, "m"), vec![3.0, 5.0, -2.0]);
    assert_eq!(flat(&exec, "c"), vec![2.0, 5.0, 10.0, 12.0]);
    assert_eq!(flat(&exec, "p"), vec![8.0, 9.0]);
    assert_eq!(flat(&exec, "s"), vec![0.5]);
    assert_eq!(flat(&exec, "mx"), vec![2.5, 12.5]);
}

/// `dot`, `length` and `distance` reduce to a scalar.
#[test]
fn test_geometric_reductions() {
    let exec = run(
        r#"
        let d = dot(vec3(1.0, 2.0, 3.0), vec3(4.0, 5.0, 6.0));
        let l = length(vec2(3.0, 4.0));
        let dist = distance(vec2(1.0, 1.0), vec2(4.0, 5.0));
        let n = normalize(vec2(0.0, 2.0));
        "#,
    );
    assert_eq!(flat(&exec, "d"), vec![32.0]);
    assert_eq!(flat(&exec, "l"), vec![5.0]);
    assert_eq!(flat(&exec, "dist"), vec![5.0]);
    assert_eq!(flat(&exec, "n"), vec![0.0, 1.0]);
}

#[test]
fn test_matrix_builtins() {
    let exec = run(
        r#"
        const m = mat2x2<f32>(1.0, 2.0, 3.0, 4.0);
        let det = determinant(m);
        let t = transpose(mat2x3<f32>(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        "#,
    );
    assert_eq!(flat(&exec, "det"), vec![-2.0]);
    assert_eq!(flat(&exec, "t"), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

/// `frexp` and `modf` return structs whose members are addressable.
#[test]
fn test_result_structs() {
    let exec = run(
        r#"
        let parts = frexp(12.0f);
        let f = parts.fract;
        let e = parts.exp;
        let split = modf(vec2<f32>(1.25, -2.5));
        let whole = split.whole;
        "#,
    );
    assert_eq!(flat(&exec, "f"), vec![0.75]);
    assert_eq!(flat(&exec, "e"), vec![4.0]);
    assert_eq!(flat(&exec, "whole"), vec![1.0, -2.0]);
}

#[test]
fn test_bit_builtins() {
    let exec = run(
        r#"
        let ones = countOneBits(0xF0F0u);
        let lead = firstLeadingBit(0x100u);
        let trail = firstTrailingBit(0x100u);
        let ext = extractBits(0xABCDu, 4u, 8u);
        let rev = reverseBits(1u);
        "#,
    );
    assert_eq!(flat(&exec, "ones"), vec![8.0]);
    assert_eq!(flat(&exec, "lead"), vec![8.0]);
    assert_eq!(flat(&exec, "trail"), vec![8.0]);
    assert_eq!(flat(&exec, "ext"), vec![0xBC as f64]);
    assert_eq!(flat(&exec, "rev"), vec![2147483648.0]);
}

#[test]
fn test_packing_builtins() {
    let exec = run(
        r#"
        let packed = pack4x8unorm(vec4<f32>(1.0, 0.0, 0.0, 1.0));
        let back = unpack4x8unorm(packed);
        let bytes = pack4xU8(vec4<u32>(1u, 2u, 3u, 4u));
        "#,
    );
    assert_eq!(flat(&exec, "packed"), vec![0xFF0000FFu32 as f64]);
    assert_eq!(flat(&exec, "back"), vec![1.0, 0.0, 0.0, 1.0]);
    assert_eq!(flat(&exec, "bytes"), vec![0x04030201u32 as f64]);
}

/// Atomics are fetch-and-op: each call returns the value before it.
#[test]
fn test_atomic_fetch_and_op() {
    let exec = run(
        r#"
        var<private> counter: atomic<u32>;
        fn f() -> vec4<u32> {
            atomicStore(&counter, 5u);
            let before_add = atomicAdd(&counter, 3u);
            let before_max = atomicMax(&counter, 20u);
            let before_sub = atomicSub(&counter, 1u);
            return vec4(before_add, before_max, before_sub, atomicLoad(&counter));
        }
        let r = f();
        "#,
    );
    assert_eq!(flat(&exec, "r"), vec![5.0, 8.0, 20.0, 19.0]);
}

#[test]
fn test_atomic_compare_exchange() {
    let exec = run(
        r#"
        var<private> slot: atomic<i32>;
        fn f() -> vec3<i32> {
            atomicStore(&slot, 7);
            let miss = atomicCompareExchangeWeak(&slot, 1, 100);
            let hit = atomicCompareExchangeWeak(&slot, 7, 100);
            return vec3(miss.old_value, hit.old_value, atomicLoad(&slot));
        }
        let r = f();
        "#,
    );
    assert_eq!(flat(&exec, "r"), vec![7.0, 7.0, 100.0]);
}

/// Derivative and sampling builtins are reported, never approximated.
#[test]
fn test_unimplemented_builtins_fail_loudly() {
    for call in ["dpdx(1.0)", "fwidth(1.0)", "subgroupAdd(1.0)"] {
        let source = format!("fn f() -> f32 {{ return {call}; }}\nlet r = f();");
        let mut exec = WgslExec::new(&source).unwrap();
        let err = exec.execute(&ExecConfig::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unimplemented, "{call}");
    }
}
