//! Texture queries, loads, stores and level-0 nearest sampling.

use super::{arg, Builtin};
use crate::data::{Data, Scalar, TextureData};
use crate::error::{ExecError, Result};
use wgsl_reflect::{SampleKind, TextureClass, TextureDimension};

pub fn call(builtin: Builtin, name: &str, args: &[Data]) -> Result<Data> {
    let texture = texture_arg(name, arg(name, args, 0)?)?;
    match builtin {
        Builtin::TextureDimensions => dimensions(texture, args.get(1)),
        Builtin::TextureNumLayers => Ok(u32_scalar(texture.size()[2].max(1))),
        Builtin::TextureNumLevels => Ok(u32_scalar(texture.descriptor.mip_level_count)),
        Builtin::TextureNumSamples => Ok(u32_scalar(texture.descriptor.sample_count)),
        Builtin::TextureLoad => load(texture, name, args),
        Builtin::TextureStore => store(texture, name, args),
        Builtin::TextureSampleLevel => {
            let coords = arg(name, args, 2)?;
            let mut rest = 3;
            let layer = if texture.dimension().is_arrayed() {
                rest += 1;
                Some(index_arg(name, args, 3)?)
            } else {
                None
            };
            let level = arg(name, args, rest)?.as_scalar()?.as_f64();
            if level != 0.0 {
                return Err(ExecError::unimplemented(format!(
                    "{name} at mip level {level} is not supported"
                )));
            }
            sample_nearest(texture, coords, layer)
        }
        Builtin::TextureSampleBaseClampToEdge => sample_nearest(texture, arg(name, args, 2)?, None),
        _ => Err(ExecError::internal(format!("'{name}' is not a texture builtin"))),
    }
}

fn texture_arg<'a>(name: &str, value: &'a Data) -> Result<&'a TextureData> {
    match value {
        Data::Texture(texture) => Ok(texture),
        other => Err(ExecError::type_error(format!(
            "'{name}' expects a texture, found {}",
            other.type_name()
        ))),
    }
}

fn u32_scalar(v: u32) -> Data {
    Data::Scalar(Scalar::U32(v))
}

fn index_arg(name: &str, args: &[Data], index: usize) -> Result<i64> {
    arg(name, args, index)?.as_scalar()?.as_index()
}

fn dimensions(texture: &TextureData, level: Option<&Data>) -> Result<Data> {
    let level = match level {
        Some(level) => level.as_scalar()?.as_index()?,
        None => 0,
    };
    if level < 0 || level >= texture.descriptor.mip_level_count.max(1) as i64 {
        return Err(ExecError::bounds(format!("mip level {level} out of range")));
    }
    let [w, h, d] = texture.size().map(|extent| (extent >> level).max(1));
    Ok(match texture.dimension() {
        TextureDimension::D1 => u32_scalar(w),
        TextureDimension::D3 => Data::Vector(vec![Scalar::U32(w), Scalar::U32(h), Scalar::U32(d)]),
        _ => Data::Vector(vec![Scalar::U32(w), Scalar::U32(h)]),
    })
}

/// Integer texel coordinates from a coordinate argument, with the array
/// layer in the third slot for arrayed textures.
fn texel_coords(value: &Data, layer: Option<i64>) -> Result<[i64; 3]> {
    let mut coords = [0i64; 3];
    for (axis, lane) in value.lanes()?.iter().take(3).enumerate() {
        coords[axis] = lane.as_index()?;
    }
    if let Some(layer) = layer {
        coords[2] = layer;
    }
    Ok(coords)
}

/// Shape decoded channels as the texture's declared result type.
fn texel_result(texture: &TextureData, texel: [Scalar; 4]) -> Data {
    if texture.is_depth() {
        return Data::Scalar(Scalar::F32(texel[0].as_f64() as f32));
    }
    let lanes = texel
        .iter()
        .map(|s| match texture.sample_kind() {
            SampleKind::Sint => Scalar::I32(s.as_i64() as i32),
            SampleKind::Uint => Scalar::U32(s.as_i64() as u32),
            _ => Scalar::F32(s.as_f64() as f32),
        })
        .collect();
    Data::Vector(lanes)
}

fn load(texture: &TextureData, name: &str, args: &[Data]) -> Result<Data> {
    let coords = arg(name, args, 1)?;
    let mut next = 2;
    let layer = if texture.dimension().is_arrayed() {
        next += 1;
        Some(index_arg(name, args, 2)?)
    } else {
        None
    };
    let is_storage = matches!(
        texture.view.as_ref().map(|v| &v.class),
        Some(TextureClass::Storage { .. })
    );
    if !is_storage {
        if let Some(extra) = args.get(next) {
            let index = extra.as_scalar()?.as_index()?;
            if index != 0 {
                let what = match texture.view.as_ref().map(|v| &v.class) {
                    Some(TextureClass::Multisampled(_)) | Some(TextureClass::Depth { multisampled: true }) => {
                        "sample index"
                    }
                    _ => "mip level",
                };
                return Err(ExecError::unimplemented(format!(
                    "{name} with {what} {index} is not supported"
                )));
            }
        }
    }
    let texel = texture.load(texel_coords(coords, layer)?)?;
    Ok(texel_result(texture, texel))
}

fn store(texture: &TextureData, name: &str, args: &[Data]) -> Result<Data> {
    let coords = arg(name, args, 1)?;
    let (layer, value) = if texture.dimension().is_arrayed() {
        (Some(index_arg(name, args, 2)?), arg(name, args, 3)?)
    } else {
        (None, arg(name, args, 2)?)
    };
    texture.store(texel_coords(coords, layer)?, value.lanes()?)?;
    Ok(Data::Void)
}

fn sample_nearest(texture: &TextureData, coords: &Data, layer: Option<i64>) -> Result<Data> {
    let uvw: Vec<f64> = coords.lanes()?.iter().map(|s| s.as_f64()).collect();
    let count = texture.dimension().coordinate_count().min(uvw.len());
    let mut texel = texture.nearest_texel(&uvw[..count]);
    if let Some(layer) = layer {
        texel[2] = layer;
    }
    let value = texture.load(texel)?;
    Ok(texel_result(texture, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ByteBuffer, TextureDescriptor};
    use crate::error::ErrorKind;
    use wgsl_reflect::TexelFormat;

    fn rgba8(width: u32, height: u32) -> Data {
        let descriptor = TextureDescriptor::new_2d(width, height, TexelFormat::Rgba8Unorm);
        let buffer = ByteBuffer::zeroed(descriptor.byte_len());
        Data::Texture(TextureData::new(buffer, descriptor))
    }

    fn coords(x: i32, y: i32) -> Data {
        Data::Vector(vec![Scalar::I32(x), Scalar::I32(y)])
    }

    #[test]
    fn test_dimensions() {
        let dims = call(Builtin::TextureDimensions, "textureDimensions", &[rgba8(4, 2)]).unwrap();
        match dims {
            Data::Vector(lanes) => assert_eq!(lanes, vec![Scalar::U32(4), Scalar::U32(2)]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_store_then_load() {
        let texture = rgba8(2, 2);
        let red = Data::Vector(vec![Scalar::F32(1.0), Scalar::F32(0.0), Scalar::F32(0.0), Scalar::F32(1.0)]);
        call(Builtin::TextureStore, "textureStore", &[texture.clone(), coords(1, 1), red]).unwrap();
        let texel = call(
            Builtin::TextureLoad,
            "textureLoad",
            &[texture, coords(1, 1), Data::Scalar(Scalar::I32(0))],
        )
        .unwrap();
        match texel {
            Data::Vector(lanes) => assert_eq!(lanes[0], Scalar::F32(1.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_out_of_bounds() {
        let err = call(
            Builtin::TextureLoad,
            "textureLoad",
            &[rgba8(2, 2), coords(2, 0), Data::Scalar(Scalar::I32(0))],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Bounds);
    }

    #[test]
    fn test_nonzero_mip_level_unimplemented() {
        let err = call(
            Builtin::TextureLoad,
            "textureLoad",
            &[rgba8(2, 2), coords(0, 0), Data::Scalar(Scalar::I32(1))],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unimplemented);
    }

    #[test]
    fn test_sample_base_clamp_to_edge() {
        let texture = rgba8(2, 1);
        let white = Data::Vector(vec![Scalar::F32(1.0); 4]);
        call(Builtin::TextureStore, "textureStore", &[texture.clone(), coords(1, 0), white]).unwrap();
        let uv = Data::Vector(vec![Scalar::F32(1.5), Scalar::F32(0.5)]);
        let sampled = call(
            Builtin::TextureSampleBaseClampToEdge,
            "textureSampleBaseClampToEdge",
            &[texture, Data::Sampler { comparison: false }, uv],
        )
        .unwrap();
        match sampled {
            Data::Vector(lanes) => assert_eq!(lanes[1], Scalar::F32(1.0)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
