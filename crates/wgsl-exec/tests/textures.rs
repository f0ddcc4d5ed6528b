//! Texture resources: loads, stores and queries through bound textures.

use wgsl_exec::{
    bind_groups, BindGroups, BindingResource, ByteBuffer, ErrorKind, ExecConfig, TexelFormat,
    TextureDescriptor, WgslExec,
};

fn texture(width: u32, height: u32, format: TexelFormat, bytes: Vec<u8>) -> (ByteBuffer, BindingResource) {
    let descriptor = TextureDescriptor::new_2d(width, height, format);
    assert_eq!(bytes.len(), descriptor.byte_len());
    let buffer = ByteBuffer::new(bytes);
    let resource = BindingResource::Texture {
        buffer: buffer.clone(),
        descriptor,
    };
    (buffer, resource)
}

fn dispatch(source: &str, groups: &BindGroups) -> wgsl_exec::Result<()> {
    let mut exec = WgslExec::new(source)?;
    exec.dispatch_workgroups("main", [1, 1, 1], groups, &ExecConfig::default())
}

/// Loads decode `rgba8unorm` texels to normalized floats.
#[test]
fn test_load_rgba8unorm() {
    let source = r#"
        @group(0) @binding(0) var tex: texture_2d<f32>;
        @group(0) @binding(1) var<storage, read_write> out: array<f32>;

        @compute @workgroup_size(2, 2)
        fn main(@builtin(local_invocation_id) lid: vec3<u32>) {
            let texel = textureLoad(tex, lid.xy, 0);
            out[lid.y * 2u + lid.x] = texel.r + texel.a * 10.0;
        }
    "#;
    let bytes = vec![
        0, 0, 0, 255, 51, 0, 0, 255, //
        102, 0, 0, 0, 255, 0, 0, 255,
    ];
    let (_, tex) = texture(2, 2, TexelFormat::Rgba8Unorm, bytes);
    let out = ByteBuffer::from_slice(&[0f32; 4]);
    let groups = bind_groups([(0, 0, tex), (0, 1, BindingResource::Buffer(out.clone()))]);
    dispatch(source, &groups).unwrap();
    assert_eq!(out.read_as::<f32>(), vec![10.0, 10.2, 0.4, 11.0]);
}

/// A load outside `[0, width) x [0, height)` fails instead of returning a
/// default texel.
#[test]
fn test_load_out_of_bounds() {
    let source = r#"
        @group(0) @binding(0) var tex: texture_2d<f32>;

        @compute @workgroup_size(1)
        fn main() {
            let texel = textureLoad(tex, vec2<i32>(2, 0), 0);
        }
    "#;
    let (_, tex) = texture(2, 2, TexelFormat::Rgba8Unorm, vec![0; 16]);
    let err = dispatch(source, &bind_groups([(0, 0, tex)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Bounds);
    assert_eq!(err.line, 6);

    let source = source.replace("vec2<i32>(2, 0)", "vec2<i32>(0, -1)");
    let (_, tex) = texture(2, 2, TexelFormat::Rgba8Unorm, vec![0; 16]);
    let err = dispatch(&source, &bind_groups([(0, 0, tex)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Bounds);
}

/// Storage texture writes land in the host's texel buffer.
#[test]
fn test_store_to_storage_texture() {
    let source = r#"
        @group(0) @binding(0) var img: texture_storage_2d<r32float, write>;

        @compute @workgroup_size(3, 2)
        fn main(@builtin(local_invocation_id) lid: vec3<u32>) {
            let dims = textureDimensions(img);
            let v = f32(lid.y * dims.x + lid.x) * 0.5;
            textureStore(img, lid.xy, vec4<f32>(v, 0.0, 0.0, 1.0));
        }
    "#;
    let (buffer, img) = texture(3, 2, TexelFormat::R32Float, vec![0; 24]);
    dispatch(source, &bind_groups([(0, 0, img)])).unwrap();
    assert_eq!(buffer.read_as::<f32>(), vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);
}

/// Unsigned integer formats load as `vec4<u32>`.
#[test]
fn test_uint_texture_load() {
    let source = r#"
        @group(0) @binding(0) var tex: texture_2d<u32>;
        @group(0) @binding(1) var<storage, read_write> out: array<u32>;

        @compute @workgroup_size(1)
        fn main() {
            let texel = textureLoad(tex, vec2(1, 0), 0);
            out[0] = texel.x;
            out[1] = textureNumLevels(tex);
        }
    "#;
    let (_, tex) = texture(2, 1, TexelFormat::R32Uint, bytemuck::cast_slice(&[7u32, 99]).to_vec());
    let out = ByteBuffer::from_slice(&[0u32; 2]);
    let groups = bind_groups([(0, 0, tex), (0, 1, BindingResource::Buffer(out.clone()))]);
    dispatch(source, &groups).unwrap();
    assert_eq!(out.read_as::<u32>(), vec![99, 1]);
}

/// Loads from mip levels above zero are reported as unsupported.
#[test]
fn test_mip_level_load_unimplemented() {
    let source = r#"
        @group(0) @binding(0) var tex: texture_2d<f32>;

        @compute @workgroup_size(1)
        fn main() {
            let texel = textureLoad(tex, vec2(0, 0), 1);
        }
    "#;
    let (_, tex) = texture(2, 2, TexelFormat::Rgba8Unorm, vec![0; 16]);
    let err = dispatch(source, &bind_groups([(0, 0, tex)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unimplemented);
}

/// `textureSample` needs derivatives and is not available.
#[test]
fn test_texture_sample_unimplemented() {
    let source = r#"
        @group(0) @binding(0) var tex: texture_2d<f32>;
        @group(0) @binding(1) var samp: sampler;

        @compute @workgroup_size(1)
        fn main() {
            let c = textureSample(tex, samp, vec2(0.5, 0.5));
        }
    "#;
    let (_, tex) = texture(1, 1, TexelFormat::Rgba8Unorm, vec![0; 4]);
    let groups = bind_groups([(0, 0, tex), (0, 1, BindingResource::Sampler)]);
    let err = dispatch(source, &groups).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unimplemented);
}
