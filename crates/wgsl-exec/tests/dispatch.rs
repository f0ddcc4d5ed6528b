//! Compute dispatch over bound buffers.

use wgsl_exec::{
    bind_groups, BindGroups, BindingResource, ByteBuffer, DispatchOrder, ErrorKind, ExecConfig,
    WgslExec,
};

fn storage(words: usize) -> (ByteBuffer, BindGroups) {
    let buffer = ByteBuffer::from_slice(&vec![0u32; words]);
    let groups = bind_groups([(0, 0, BindingResource::Buffer(buffer.clone()))]);
    (buffer, groups)
}

/// Every invocation writes its own slot of a shared buffer.
#[test]
fn test_dispatch_fills_buffer() {
    let source = r#"
        @group(0) @binding(0) var<storage, read_write> out: array<u32>;

        @compute @workgroup_size(4)
        fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
            out[gid.x] = gid.x * gid.x;
        }
    "#;
    let (buffer, groups) = storage(8);
    let mut exec = WgslExec::new(source).unwrap();
    exec.dispatch_workgroups("main", [2, 1, 1], &groups, &ExecConfig::default())
        .unwrap();
    assert_eq!(buffer.read_as::<u32>(), vec![0, 1, 4, 9, 16, 25, 36, 49]);
}

/// `local_invocation_index` flattens x fastest: (1, 2, 3) in a (2, 3, 4)
/// workgroup is 23.
#[test]
fn test_local_invocation_index_flattening() {
    let source = r#"
        @group(0) @binding(0) var<storage, read_write> out: array<u32, 24>;

        @compute @workgroup_size(2, 3, 4)
        fn main(
            @builtin(local_invocation_id) lid: vec3<u32>,
            @builtin(local_invocation_index) index: u32,
        ) {
            out[index] = lid.x * 100u + lid.y * 10u + lid.z;
        }
    "#;
    let (buffer, groups) = storage(24);
    let mut exec = WgslExec::new(source).unwrap();
    exec.dispatch_workgroups("main", [1, 1, 1], &groups, &ExecConfig::default())
        .unwrap();
    let out = buffer.read_as::<u32>();
    assert_eq!(out[23], 123);
    assert_eq!(out[1], 100);
    assert_eq!(out[2], 10);
}

/// Builtin inputs gathered in a struct parameter.
#[test]
fn test_builtin_struct_parameter() {
    let source = r#"
        struct Ids {
            @builtin(workgroup_id) group: vec3<u32>,
            @builtin(local_invocation_id) local: vec3<u32>,
        }
        @group(0) @binding(0) var<storage, read_write> out: array<u32>;

        @compute @workgroup_size(2)
        fn main(ids: Ids) {
            out[ids.group.x * 2u + ids.local.x] = ids.group.x + 10u;
        }
    "#;
    let (buffer, groups) = storage(6);
    let mut exec = WgslExec::new(source).unwrap();
    exec.dispatch_workgroups("main", [3, 1, 1], &groups, &ExecConfig::default())
        .unwrap();
    assert_eq!(buffer.read_as::<u32>(), vec![10, 10, 11, 11, 12, 12]);
}

/// A kernel without cross-invocation dependencies gives the same buffer
/// whatever order invocations run in.
#[test]
fn test_dispatch_order_does_not_change_results() {
    let source = r#"
        @group(0) @binding(0) var<storage, read> input: array<f32>;
        @group(0) @binding(1) var<storage, read_write> output: array<f32>;

        fn shade(v: f32) -> f32 { return clamp(v * 2.0 - 1.0, 0.0, 4.0); }

        @compute @workgroup_size(2, 2)
        fn main(@builtin(global_invocation_id) gid: vec3<u32>,
                @builtin(num_workgroups) groups: vec3<u32>) {
            let width = groups.x * 2u;
            let i = gid.y * width + gid.x;
            var acc = 0.0;
            for (var k = 0u; k <= i % 3u; k++) {
                acc += shade(input[i]);
            }
            output[i] = acc;
        }
    "#;
    let input: Vec<f32> = (0..16).map(|i| i as f32 * 0.375).collect();
    let mut results = Vec::new();
    for order in [DispatchOrder::Forward, DispatchOrder::Reverse] {
        let output = ByteBuffer::from_slice(&[0f32; 16]);
        let groups = bind_groups([
            (0, 0, BindingResource::Buffer(ByteBuffer::from_slice(&input))),
            (0, 1, BindingResource::Buffer(output.clone())),
        ]);
        let mut exec = WgslExec::new(source).unwrap();
        exec.dispatch_workgroups_ordered("main", [2, 2, 1], &groups, &ExecConfig::default(), order)
            .unwrap();
        results.push(output.read_as::<f32>());
    }
    assert_eq!(results[0], results[1]);
    assert!(results[0].iter().any(|v| *v > 0.0));
}

/// `atomicMax` across invocations returns the prior value and leaves the
/// maximum behind.
#[test]
fn test_atomic_max_across_invocations() {
    let source = r#"
        struct Result { best: atomic<u32>, seen: array<u32, 8> }
        @group(0) @binding(0) var<storage, read_write> result: Result;

        @compute @workgroup_size(8)
        fn main(@builtin(local_invocation_index) i: u32) {
            let candidate = (i * 5u) % 8u;
            result.seen[i] = atomicMax(&result.best, candidate);
        }
    "#;
    let (buffer, groups) = storage(9);
    let mut exec = WgslExec::new(source).unwrap();
    exec.dispatch_workgroups("main", [1, 1, 1], &groups, &ExecConfig::default())
        .unwrap();
    let words = buffer.read_as::<u32>();
    // candidates in order: 0 5 2 7 4 1 6 3
    assert_eq!(words[0], 7);
    assert_eq!(&words[1..], &[0, 0, 5, 5, 7, 7, 7, 7]);
}

/// `var<workgroup>` is zeroed per workgroup and `var<private>` per
/// invocation.
#[test]
fn test_workgroup_and_private_storage_lifetimes() {
    let source = r#"
        var<workgroup> arrivals: atomic<u32>;
        var<private> visits: u32;
        @group(0) @binding(0) var<storage, read_write> out: array<u32>;

        @compute @workgroup_size(4)
        fn main(@builtin(workgroup_id) wid: vec3<u32>,
                @builtin(global_invocation_id) gid: vec3<u32>) {
            visits += 1u;
            let before = atomicAdd(&arrivals, 1u);
            out[gid.x] = before * 10u + visits;
        }
    "#;
    let (buffer, groups) = storage(8);
    let mut exec = WgslExec::new(source).unwrap();
    exec.dispatch_workgroups("main", [2, 1, 1], &groups, &ExecConfig::default())
        .unwrap();
    assert_eq!(buffer.read_as::<u32>(), vec![1, 11, 21, 31, 1, 11, 21, 31]);
}

/// Workgroup sizes may name overrides supplied at dispatch time.
#[test]
fn test_override_workgroup_size() {
    let source = r#"
        override WIDTH: u32 = 2u;
        @group(0) @binding(0) var<storage, read_write> out: array<u32>;

        @compute @workgroup_size(WIDTH)
        fn main(@builtin(local_invocation_index) i: u32,
                @builtin(workgroup_id) wid: vec3<u32>) {
            out[wid.x * WIDTH + i] = WIDTH;
        }
    "#;
    let (buffer, groups) = storage(8);
    let mut exec = WgslExec::new(source).unwrap();
    let config = ExecConfig::default().with_constant("WIDTH", 4.0);
    exec.dispatch_workgroups("main", [2, 1, 1], &groups, &config)
        .unwrap();
    assert_eq!(buffer.read_as::<u32>(), vec![4; 8]);
}

/// `arrayLength` reports the element count of the bound buffer.
#[test]
fn test_array_length_of_runtime_array() {
    let source = r#"
        @group(0) @binding(0) var<storage, read_write> data: array<u32>;

        @compute @workgroup_size(1)
        fn main() {
            let n = arrayLength(&data);
            for (var i = 0u; i < n; i++) {
                data[i] = n - i;
            }
        }
    "#;
    let (buffer, groups) = storage(5);
    let mut exec = WgslExec::new(source).unwrap();
    exec.dispatch_workgroups("main", [1, 1, 1], &groups, &ExecConfig::default())
        .unwrap();
    assert_eq!(buffer.read_as::<u32>(), vec![5, 4, 3, 2, 1]);
}

/// A resource the shader declares but the host did not bind.
#[test]
fn test_missing_binding_is_reported() {
    let source = r#"
        @group(0) @binding(0) var<storage, read_write> out: array<u32>;
        @group(0) @binding(1) var<uniform> scale: u32;

        @compute @workgroup_size(1)
        fn main() { out[0] = scale; }
    "#;
    let (_, groups) = storage(1);
    let mut exec = WgslExec::new(source).unwrap();
    let err = exec
        .dispatch_workgroups("main", [1, 1, 1], &groups, &ExecConfig::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Binding);
    assert_eq!(err.line, 3);
}

/// Writing past the end of a bound buffer is a bounds error, and no
/// further invocations run.
#[test]
fn test_out_of_bounds_write_stops_dispatch() {
    let source = r#"
        @group(0) @binding(0) var<storage, read_write> out: array<u32>;

        @compute @workgroup_size(4)
        fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
            out[gid.x] = 1u;
        }
    "#;
    let (buffer, groups) = storage(2);
    let mut exec = WgslExec::new(source).unwrap();
    let err = exec
        .dispatch_workgroups("main", [1, 1, 1], &groups, &ExecConfig::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Bounds);
    assert_eq!(err.line, 6);
    assert_eq!(buffer.read_as::<u32>(), vec![1, 1]);
}

#[test]
fn test_dispatch_requires_compute_entry() {
    let source = r#"
        @fragment
        fn fs() -> @location(0) vec4<f32> { return vec4(1.0); }
    "#;
    let mut exec = WgslExec::new(source).unwrap();
    let err = exec
        .dispatch_workgroups("fs", [1, 1, 1], &BindGroups::new(), &ExecConfig::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Type);

    let err = exec
        .dispatch_workgroups("missing", [1, 1, 1], &BindGroups::new(), &ExecConfig::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Binding);
}
