/// Texture trait and descriptors

/// GPU texture resource (2D or cube)
pub trait Texture: Send + Sync {
    fn info(&self) -> &TextureInfo;
}

/// Pixel formats understood by the core
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, used for images and low-precision shadow storage
    R8G8B8A8_UNORM,
    /// 32-bit float RGBA, high-precision shadow storage
    R32G32B32A32_SFLOAT,
    /// 16-bit depth, shared depth surface of the shadow passes
    D16_UNORM,
    D32_FLOAT,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::R8G8B8A8_UNORM => 4,
            TextureFormat::R32G32B32A32_SFLOAT => 16,
            TextureFormat::D16_UNORM => 2,
            TextureFormat::D32_FLOAT => 4,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::D16_UNORM | TextureFormat::D32_FLOAT)
    }
}

/// How a texture will be accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Shader input only
    Sampled,
    /// Color attachment only
    RenderTarget,
    /// Written by one pass, sampled by a later one (shadow maps)
    SampledAndRenderTarget,
    /// Depth attachment
    DepthStencil,
}

impl TextureUsage {
    pub fn is_sampled(self) -> bool {
        matches!(self, TextureUsage::Sampled | TextureUsage::SampledAndRenderTarget)
    }

    pub fn is_attachment(self) -> bool {
        !matches!(self, TextureUsage::Sampled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    D2,
    /// Six square layers in +X, -X, +Y, -Y, +Z, -Z order
    Cube,
}

impl TextureKind {
    pub fn layer_count(self) -> u32 {
        match self {
            TextureKind::D2 => 1,
            TextureKind::Cube => 6,
        }
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub kind: TextureKind,
    /// Initial pixel data for every layer, tightly packed
    pub data: Option<Vec<u8>>,
}

impl TextureDesc {
    /// Sampled 2D RGBA8 texture filled with `pixels`
    pub fn rgba8(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::Sampled,
            kind: TextureKind::D2,
            data: Some(pixels),
        }
    }

    /// Single opaque texel
    pub fn solid_color(label: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self::rgba8(label, 1, 1, rgba.to_vec())
    }

    /// Expected byte length of `data`
    pub fn expected_data_len(&self) -> usize {
        (self.width * self.height * self.format.bytes_per_pixel() * self.kind.layer_count()) as usize
    }
}

/// Immutable description of a created texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub kind: TextureKind,
}

impl From<&TextureDesc> for TextureInfo {
    fn from(desc: &TextureDesc) -> Self {
        Self {
            label: desc.label.clone(),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            kind: desc.kind,
        }
    }
}
