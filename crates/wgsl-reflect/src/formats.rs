//! Texel formats.
//!
//! Accepts both WGSL storage-texture format names (`rgba8unorm`) and the
//! WebGPU texture format strings used in texture descriptors
//! (`rgba8unorm-srgb`, `depth32float`).

/// How stored channels are interpreted when sampled or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Float,
    Sint,
    Uint,
    Depth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    R16Uint,
    R16Sint,
    R16Float,
    Rg8Unorm,
    Rg8Snorm,
    Rg8Uint,
    Rg8Sint,
    R32Uint,
    R32Sint,
    R32Float,
    Rg16Uint,
    Rg16Sint,
    Rg16Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgb10a2Unorm,
    Rgb10a2Uint,
    Rg11b10Ufloat,
    Rgb9e5Ufloat,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,
    Depth16Unorm,
    Depth24Plus,
    Depth32Float,
}

impl TexelFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        use TexelFormat::*;
        Some(match name {
            "r8unorm" => R8Unorm,
            "r8snorm" => R8Snorm,
            "r8uint" => R8Uint,
            "r8sint" => R8Sint,
            "r16uint" => R16Uint,
            "r16sint" => R16Sint,
            "r16float" => R16Float,
            "rg8unorm" => Rg8Unorm,
            "rg8snorm" => Rg8Snorm,
            "rg8uint" => Rg8Uint,
            "rg8sint" => Rg8Sint,
            "r32uint" => R32Uint,
            "r32sint" => R32Sint,
            "r32float" => R32Float,
            "rg16uint" => Rg16Uint,
            "rg16sint" => Rg16Sint,
            "rg16float" => Rg16Float,
            "rgba8unorm" => Rgba8Unorm,
            "rgba8unorm-srgb" => Rgba8UnormSrgb,
            "rgba8snorm" => Rgba8Snorm,
            "rgba8uint" => Rgba8Uint,
            "rgba8sint" => Rgba8Sint,
            "bgra8unorm" => Bgra8Unorm,
            "bgra8unorm-srgb" => Bgra8UnormSrgb,
            "rgb10a2unorm" => Rgb10a2Unorm,
            "rgb10a2uint" => Rgb10a2Uint,
            "rg11b10ufloat" => Rg11b10Ufloat,
            "rgb9e5ufloat" => Rgb9e5Ufloat,
            "rg32uint" => Rg32Uint,
            "rg32sint" => Rg32Sint,
            "rg32float" => Rg32Float,
            "rgba16uint" => Rgba16Uint,
            "rgba16sint" => Rgba16Sint,
            "rgba16float" => Rgba16Float,
            "rgba32uint" => Rgba32Uint,
            "rgba32sint" => Rgba32Sint,
            "rgba32float" => Rgba32Float,
            "depth16unorm" => Depth16Unorm,
            "depth24plus" => Depth24Plus,
            "depth32float" => Depth32Float,
            _ => return None,
        })
    }

    pub fn bytes_per_texel(self) -> u32 {
        use TexelFormat::*;
        match self {
            R8Unorm | R8Snorm | R8Uint | R8Sint => 1,
            R16Uint | R16Sint | R16Float | Rg8Unorm | Rg8Snorm | Rg8Uint | Rg8Sint
            | Depth16Unorm => 2,
            R32Uint | R32Sint | R32Float | Rg16Uint | Rg16Sint | Rg16Float | Rgba8Unorm
            | Rgba8UnormSrgb | Rgba8Snorm | Rgba8Uint | Rgba8Sint | Bgra8Unorm
            | Bgra8UnormSrgb | Rgb10a2Unorm | Rgb10a2Uint | Rg11b10Ufloat | Rgb9e5Ufloat
            | Depth24Plus | Depth32Float => 4,
            Rg32Uint | Rg32Sint | Rg32Float | Rgba16Uint | Rgba16Sint | Rgba16Float => 8,
            Rgba32Uint | Rgba32Sint | Rgba32Float => 16,
        }
    }

    /// Number of stored channels.
    pub fn channels(self) -> u32 {
        use TexelFormat::*;
        match self {
            R8Unorm | R8Snorm | R8Uint | R8Sint | R16Uint | R16Sint | R16Float | R32Uint
            | R32Sint | R32Float | Depth16Unorm | Depth24Plus | Depth32Float => 1,
            Rg8Unorm | Rg8Snorm | Rg8Uint | Rg8Sint | Rg16Uint | Rg16Sint | Rg16Float
            | Rg32Uint | Rg32Sint | Rg32Float => 2,
            Rg11b10Ufloat => 3,
            _ => 4,
        }
    }

    pub fn sample_kind(self) -> SampleKind {
        use TexelFormat::*;
        match self {
            R8Uint | R16Uint | Rg8Uint | R32Uint | Rg16Uint | Rgba8Uint | Rgb10a2Uint
            | Rg32Uint | Rgba16Uint | Rgba32Uint => SampleKind::Uint,
            R8Sint | R16Sint | Rg8Sint | R32Sint | Rg16Sint | Rgba8Sint | Rg32Sint
            | Rgba16Sint | Rgba32Sint => SampleKind::Sint,
            Depth16Unorm | Depth24Plus | Depth32Float => SampleKind::Depth,
            _ => SampleKind::Float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_and_storage_names() {
        assert_eq!(
            TexelFormat::from_name("rgba8unorm-srgb"),
            Some(TexelFormat::Rgba8UnormSrgb)
        );
        assert_eq!(TexelFormat::from_name("r32float"), Some(TexelFormat::R32Float));
        assert_eq!(TexelFormat::from_name("astc-4x4-unorm"), None);
    }

    #[test]
    fn test_texel_sizes() {
        assert_eq!(TexelFormat::Rgba16Float.bytes_per_texel(), 8);
        assert_eq!(TexelFormat::Rg11b10Ufloat.bytes_per_texel(), 4);
        assert_eq!(TexelFormat::Rgba32Uint.sample_kind(), SampleKind::Uint);
    }
}
