//! Texture storage and texel codecs.
//!
//! Texels are addressed linearly: `z * bytes_per_row * height + y *
//! bytes_per_row + x * texel_size`. Decoding always yields four channels;
//! missing ones read as `(0, 0, 0, 1)`.

use super::buffer::ByteBuffer;
use super::f16::{f16_to_f32, f32_to_f16};
use super::Scalar;
use crate::error::{ExecError, Result};
use wgsl_reflect::{SampleKind, TexelFormat, TextureClass, TextureDimension, TextureType};

/// Shape and format of a bound texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// Width, height and depth (or array layers).
    pub size: [u32; 3],
    pub format: TexelFormat,
    pub mip_level_count: u32,
    pub sample_count: u32,
    /// Row pitch in bytes; tightly packed when `None`.
    pub bytes_per_row: Option<u32>,
}

impl TextureDescriptor {
    pub fn new_2d(width: u32, height: u32, format: TexelFormat) -> Self {
        Self {
            size: [width, height, 1],
            format,
            mip_level_count: 1,
            sample_count: 1,
            bytes_per_row: None,
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
            .unwrap_or(self.size[0] * self.format.bytes_per_texel())
    }

    /// Bytes needed to hold mip level 0.
    pub fn byte_len(&self) -> usize {
        self.bytes_per_row() as usize * self.size[1] as usize * self.size[2].max(1) as usize
    }
}

/// A texture resource: raw texel bytes plus their descriptor.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub buffer: ByteBuffer,
    pub descriptor: TextureDescriptor,
    /// Declared shader type, once bound to a variable.
    pub view: Option<TextureType>,
}

impl TextureData {
    pub fn new(buffer: ByteBuffer, descriptor: TextureDescriptor) -> Self {
        Self {
            buffer,
            descriptor,
            view: None,
        }
    }

    pub fn with_view(mut self, view: TextureType) -> Self {
        self.view = Some(view);
        self
    }

    pub fn dimension(&self) -> TextureDimension {
        match &self.view {
            Some(view) => view.dimension,
            None if self.descriptor.size[2] > 1 => TextureDimension::D3,
            None => TextureDimension::D2,
        }
    }

    pub fn is_depth(&self) -> bool {
        matches!(
            self.view,
            Some(TextureType {
                class: TextureClass::Depth { .. },
                ..
            })
        ) || self.descriptor.format.sample_kind() == SampleKind::Depth
    }

    /// Channel type a load returns: the declared sampled type, otherwise
    /// what the format stores.
    pub fn sample_kind(&self) -> SampleKind {
        let declared = match &self.view {
            Some(TextureType {
                class: TextureClass::Sampled(s) | TextureClass::Multisampled(s),
                ..
            }) => Some(*s),
            _ => None,
        };
        match declared {
            Some(wgsl_reflect::ScalarType::I32) => SampleKind::Sint,
            Some(wgsl_reflect::ScalarType::U32) => SampleKind::Uint,
            Some(_) => SampleKind::Float,
            None => self.descriptor.format.sample_kind(),
        }
    }

    /// Empty texture used when a module runs without bindings.
    pub fn empty(format: TexelFormat) -> Self {
        Self::new(ByteBuffer::default(), TextureDescriptor::new_2d(0, 0, format))
    }

    pub fn size(&self) -> [u32; 3] {
        self.descriptor.size
    }

    pub fn format(&self) -> TexelFormat {
        self.descriptor.format
    }

    fn texel_offset(&self, coords: [i64; 3]) -> Result<usize> {
        let size = self.descriptor.size;
        let in_bounds = coords
            .iter()
            .zip(size)
            .all(|(c, extent)| *c >= 0 && *c < extent.max(1) as i64);
        if !in_bounds || size[0] == 0 || size[1] == 0 {
            return Err(ExecError::bounds(format!(
                "texel ({}, {}, {}) outside texture of size {}x{}x{}",
                coords[0], coords[1], coords[2], size[0], size[1], size[2]
            )));
        }
        let bytes_per_row = self.descriptor.bytes_per_row() as usize;
        let texel = self.descriptor.format.bytes_per_texel() as usize;
        let [x, y, z] = coords.map(|c| c as usize);
        Ok(z * bytes_per_row * size[1] as usize + y * bytes_per_row + x * texel)
    }

    /// Read and decode one texel.
    pub fn load(&self, coords: [i64; 3]) -> Result<[Scalar; 4]> {
        let offset = self.texel_offset(coords)?;
        let format = self.descriptor.format;
        let bytes = self
            .buffer
            .read_bytes(offset, format.bytes_per_texel() as usize)?;
        decode_texel(format, &bytes)
    }

    /// Encode and write one texel.
    pub fn store(&self, coords: [i64; 3], value: &[Scalar]) -> Result<()> {
        let offset = self.texel_offset(coords)?;
        let bytes = encode_texel(self.descriptor.format, value)?;
        self.buffer.write_bytes(offset, &bytes)
    }

    /// Texel nearest to normalized coordinates, clamped to the edge.
    pub fn nearest_texel(&self, uvw: &[f64]) -> [i64; 3] {
        let size = self.descriptor.size;
        let mut coords = [0i64; 3];
        for (axis, u) in uvw.iter().take(3).enumerate() {
            let extent = size[axis].max(1) as f64;
            coords[axis] = (u * extent).floor().clamp(0.0, extent - 1.0) as i64;
        }
        coords
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Encoding {
    Unorm,
    Snorm,
    Uint,
    Sint,
    Float,
}

/// Channel count, bytes per channel and encoding for byte-aligned formats.
fn channel_layout(format: TexelFormat) -> Option<(usize, usize, Encoding)> {
    use Encoding::*;
    use TexelFormat::*;
    Some(match format {
        R8Unorm => (1, 1, Unorm),
        R8Snorm => (1, 1, Snorm),
        R8Uint => (1, 1, Uint),
        R8Sint => (1, 1, Sint),
        R16Uint => (1, 2, Uint),
        R16Sint => (1, 2, Sint),
        R16Float => (1, 2, Float),
        Rg8Unorm => (2, 1, Unorm),
        Rg8Snorm => (2, 1, Snorm),
        Rg8Uint => (2, 1, Uint),
        Rg8Sint => (2, 1, Sint),
        R32Uint => (1, 4, Uint),
        R32Sint => (1, 4, Sint),
        R32Float => (1, 4, Float),
        Rg16Uint => (2, 2, Uint),
        Rg16Sint => (2, 2, Sint),
        Rg16Float => (2, 2, Float),
        Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb => (4, 1, Unorm),
        Rgba8Snorm => (4, 1, Snorm),
        Rgba8Uint => (4, 1, Uint),
        Rgba8Sint => (4, 1, Sint),
        Rg32Uint => (2, 4, Uint),
        Rg32Sint => (2, 4, Sint),
        Rg32Float => (2, 4, Float),
        Rgba16Uint => (4, 2, Uint),
        Rgba16Sint => (4, 2, Sint),
        Rgba16Float => (4, 2, Float),
        Rgba32Uint => (4, 4, Uint),
        Rgba32Sint => (4, 4, Sint),
        Rgba32Float => (4, 4, Float),
        Depth16Unorm => (1, 2, Unorm),
        Depth32Float => (1, 4, Float),
        Rgb10a2Unorm | Rgb10a2Uint | Rg11b10Ufloat | Rgb9e5Ufloat | Depth24Plus => return None,
    })
}

fn read_uint(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Unsigned small float sharing the `f16` exponent: the top `bits` of the
/// positive `f16` encoding.
fn small_float_to_f32(value: u32, bits: u32) -> f32 {
    f16_to_f32((value << (15 - bits)) as u16)
}

fn f32_to_small_float(value: f32, bits: u32) -> u32 {
    let half = f32_to_f16(value.max(0.0)) as u32;
    (half >> (15 - bits)) & ((1 << bits) - 1)
}

fn decode_rgb9e5(packed: u32) -> [f64; 3] {
    let exponent = (packed >> 27) as i32 - 15 - 9;
    let scale = 2f64.powi(exponent);
    [0, 9, 18].map(|shift| ((packed >> shift) & 0x1ff) as f64 * scale)
}

fn encode_rgb9e5(rgb: [f64; 3]) -> u32 {
    const MAX: f64 = 65408.0;
    let rgb = rgb.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, MAX) });
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    let mut exponent = (max.log2().floor() as i32).max(-16) + 1 + 15;
    let mut denom = 2f64.powi(exponent - 15 - 9);
    if (max / denom).round() >= 512.0 {
        denom *= 2.0;
        exponent += 1;
    }
    let [r, g, b] = rgb.map(|c| ((c / denom).round() as u32).min(0x1ff));
    ((exponent as u32) << 27) | (b << 18) | (g << 9) | r
}

fn float_lanes(values: [f64; 4]) -> [Scalar; 4] {
    values.map(|v| Scalar::F32(v as f32))
}

/// Decode the bytes of one texel into four channels.
pub fn decode_texel(format: TexelFormat, bytes: &[u8]) -> Result<[Scalar; 4]> {
    use TexelFormat::*;
    if let Some((channels, width, encoding)) = channel_layout(format) {
        let mut out = match format.sample_kind() {
            SampleKind::Uint => [Scalar::U32(0), Scalar::U32(0), Scalar::U32(0), Scalar::U32(1)],
            SampleKind::Sint => [Scalar::I32(0), Scalar::I32(0), Scalar::I32(0), Scalar::I32(1)],
            _ => float_lanes([0.0, 0.0, 0.0, 1.0]),
        };
        let bits = width as u32 * 8;
        let max = ((1u64 << bits) - 1) as f64;
        for (i, chunk) in bytes.chunks_exact(width).take(channels).enumerate() {
            let raw = read_uint(chunk);
            out[i] = match encoding {
                Encoding::Unorm => Scalar::F32((raw as f64 / max) as f32),
                Encoding::Snorm => {
                    let positive_max = ((1u64 << (bits - 1)) - 1) as f64;
                    Scalar::F32((sign_extend(raw, bits) as f64 / positive_max).max(-1.0) as f32)
                }
                Encoding::Uint => Scalar::U32(raw),
                Encoding::Sint => Scalar::I32(sign_extend(raw, bits)),
                Encoding::Float if width == 2 => Scalar::F32(f16_to_f32(raw as u16)),
                Encoding::Float => Scalar::F32(f32::from_bits(raw)),
            };
        }
        if matches!(format, Bgra8Unorm | Bgra8UnormSrgb) {
            out.swap(0, 2);
        }
        if matches!(format, Rgba8UnormSrgb | Bgra8UnormSrgb) {
            for lane in out.iter_mut().take(3) {
                *lane = Scalar::F32(srgb_to_linear(lane.as_f64()) as f32);
            }
        }
        return Ok(out);
    }

    let packed = read_uint(bytes);
    Ok(match format {
        Rgb10a2Unorm => float_lanes([
            (packed & 0x3ff) as f64 / 1023.0,
            ((packed >> 10) & 0x3ff) as f64 / 1023.0,
            ((packed >> 20) & 0x3ff) as f64 / 1023.0,
            (packed >> 30) as f64 / 3.0,
        ]),
        Rgb10a2Uint => [
            Scalar::U32(packed & 0x3ff),
            Scalar::U32((packed >> 10) & 0x3ff),
            Scalar::U32((packed >> 20) & 0x3ff),
            Scalar::U32(packed >> 30),
        ],
        Rg11b10Ufloat => float_lanes([
            small_float_to_f32(packed & 0x7ff, 11) as f64,
            small_float_to_f32((packed >> 11) & 0x7ff, 11) as f64,
            small_float_to_f32(packed >> 22, 10) as f64,
            1.0,
        ]),
        Rgb9e5Ufloat => {
            let [r, g, b] = decode_rgb9e5(packed);
            float_lanes([r, g, b, 1.0])
        }
        Depth24Plus => float_lanes([(packed & 0xff_ffff) as f64 / 16_777_215.0, 0.0, 0.0, 1.0]),
        other => {
            return Err(ExecError::internal(format!(
                "texel format {other:?} has no decoder"
            )))
        }
    })
}

/// Encode up to four channels into the bytes of one texel.
pub fn encode_texel(format: TexelFormat, value: &[Scalar]) -> Result<Vec<u8>> {
    use TexelFormat::*;
    let channel = |i: usize| value.get(i).copied().unwrap_or(Scalar::F32(0.0));
    let float = |i: usize| channel(i).as_f64();

    if let Some((channels, width, encoding)) = channel_layout(format) {
        let mut lanes: Vec<Scalar> = (0..channels).map(channel).collect();
        if matches!(format, Rgba8UnormSrgb | Bgra8UnormSrgb) {
            for lane in lanes.iter_mut().take(3) {
                *lane = Scalar::F32(linear_to_srgb(lane.as_f64().clamp(0.0, 1.0)) as f32);
            }
        }
        if matches!(format, Bgra8Unorm | Bgra8UnormSrgb) {
            lanes.swap(0, 2);
        }
        let bits = width as u32 * 8;
        let mut bytes = Vec::with_capacity(channels * width);
        for lane in lanes {
            let raw: u32 = match encoding {
                Encoding::Unorm => {
                    let max = ((1u64 << bits) - 1) as f64;
                    (lane.as_f64().clamp(0.0, 1.0) * max).round() as u32
                }
                Encoding::Snorm => {
                    let max = ((1u64 << (bits - 1)) - 1) as f64;
                    ((lane.as_f64().clamp(-1.0, 1.0) * max).round() as i32) as u32
                }
                Encoding::Uint | Encoding::Sint => lane.as_i64() as u32,
                Encoding::Float if width == 2 => f32_to_f16(lane.as_f64() as f32) as u32,
                Encoding::Float => (lane.as_f64() as f32).to_bits(),
            };
            bytes.extend_from_slice(&raw.to_le_bytes()[..width]);
        }
        return Ok(bytes);
    }

    let unorm = |v: f64, max: f64| (v.clamp(0.0, 1.0) * max).round() as u32;
    let packed = match format {
        Rgb10a2Unorm => {
            unorm(float(0), 1023.0)
                | unorm(float(1), 1023.0) << 10
                | unorm(float(2), 1023.0) << 20
                | unorm(float(3), 3.0) << 30
        }
        Rgb10a2Uint => {
            let c = |i: usize| (channel(i).as_i64() as u32) & 0x3ff;
            c(0) | c(1) << 10 | c(2) << 20 | ((channel(3).as_i64() as u32) & 0x3) << 30
        }
        Rg11b10Ufloat => {
            f32_to_small_float(float(0) as f32, 11)
                | f32_to_small_float(float(1) as f32, 11) << 11
                | f32_to_small_float(float(2) as f32, 10) << 22
        }
        Rgb9e5Ufloat => encode_rgb9e5([float(0), float(1), float(2)]),
        Depth24Plus => unorm(float(0), 16_777_215.0),
        other => {
            return Err(ExecError::internal(format!(
                "texel format {other:?} has no encoder"
            )))
        }
    };
    Ok(packed.to_le_bytes().to_vec())
}
