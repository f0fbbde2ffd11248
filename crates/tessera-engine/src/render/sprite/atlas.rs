//! Sprite atlas: one RGBA texture plus the sampler bound next to it.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

use crate::coords::Rect;

// ── regions ───────────────────────────────────────────────────────────────

/// Normalized sub-rectangle of an atlas, as consumed by `SpriteInstance`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasRegion {
    pub uv_offset: [f32; 2],
    pub uv_size: [f32; 2],
}

impl AtlasRegion {
    /// The whole texture.
    pub const FULL: Self = Self {
        uv_offset: [0.0, 0.0],
        uv_size: [1.0, 1.0],
    };

    /// Region covering pixel rectangle `px` of a `width` x `height` image.
    ///
    /// No clamping is applied; regions reaching past the edge sample according
    /// to the sampler's address mode.
    pub fn from_pixels(px: Rect, width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Self {
            uv_offset: [px.origin.x / w, px.origin.y / h],
            uv_size: [px.size.x / w, px.size.y / h],
        }
    }

    /// Cell `(col, row)` of an atlas split into a uniform `cols` x `rows` grid.
    pub fn grid_cell(col: u32, row: u32, cols: u32, rows: u32) -> Self {
        let cw = 1.0 / cols.max(1) as f32;
        let ch = 1.0 / rows.max(1) as f32;
        Self {
            uv_offset: [col as f32 * cw, row as f32 * ch],
            uv_size: [cw, ch],
        }
    }

    /// The same region mirrored horizontally (negative `uv_size.x`).
    pub fn flipped_x(self) -> Self {
        Self {
            uv_offset: [self.uv_offset[0] + self.uv_size[0], self.uv_offset[1]],
            uv_size: [-self.uv_size[0], self.uv_size[1]],
        }
    }
}

impl Default for AtlasRegion {
    fn default() -> Self {
        Self::FULL
    }
}

// ── sampling ──────────────────────────────────────────────────────────────

/// Sampler configuration shared by the GPU atlas and `texels::CpuTexture`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AtlasSampling {
    pub filter: wgpu::FilterMode,
    pub address_mode: wgpu::AddressMode,
}

impl AtlasSampling {
    /// Nearest filtering, clamped: pixel-art atlases without bleeding.
    pub const PIXEL_ART: Self = Self {
        filter: wgpu::FilterMode::Nearest,
        address_mode: wgpu::AddressMode::ClampToEdge,
    };

    pub const SMOOTH: Self = Self {
        filter: wgpu::FilterMode::Linear,
        address_mode: wgpu::AddressMode::ClampToEdge,
    };

    fn descriptor<'a>(&self, label: Option<&'a str>) -> wgpu::SamplerDescriptor<'a> {
        wgpu::SamplerDescriptor {
            label,
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.filter,
            min_filter: self.filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            border_color: (self.address_mode == wgpu::AddressMode::ClampToBorder)
                .then_some(wgpu::SamplerBorderColor::TransparentBlack),
            ..Default::default()
        }
    }
}

impl Default for AtlasSampling {
    fn default() -> Self {
        Self::PIXEL_ART
    }
}

// ── GPU atlas ─────────────────────────────────────────────────────────────

static NEXT_ATLAS_ID: AtomicU64 = AtomicU64::new(1);

/// GPU-resident atlas texture, view and sampler.
///
/// Texels are uploaded as `Rgba8UnormSrgb`, so the shader samples linear values.
/// Each atlas gets a process-unique id; renderers use it to know when their
/// bind group must be rebuilt.
#[derive(Debug)]
pub struct SpriteAtlas {
    id: u64,
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    width: u32,
    height: u32,
    sampling: AtlasSampling,
}

impl SpriteAtlas {
    /// Creates an atlas from tightly packed RGBA8 pixels (row-major, top row first).
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
        sampling: AtlasSampling,
        label: &str,
    ) -> Result<Self> {
        validate_rgba8(width, height, pixels.len())?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler_label = format!("{label} sampler");
        let sampler = device.create_sampler(&sampling.descriptor(Some(&sampler_label)));

        let id = NEXT_ATLAS_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("atlas '{label}' #{id} created ({width}x{height}, {sampling:?})");

        Ok(Self {
            id,
            texture,
            view,
            sampler,
            width,
            height,
            sampling,
        })
    }

    /// Decodes an encoded image (PNG) and uploads it.
    pub fn from_image_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        sampling: AtlasSampling,
        label: &str,
    ) -> Result<Self> {
        let img = decode_rgba8(bytes, label)?;
        let (w, h) = img.dimensions();
        Self::from_rgba8(device, queue, w, h, img.as_raw(), sampling, label)
    }

    /// Loads an image file from disk and uploads it.
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<std::path::Path>,
        sampling: AtlasSampling,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read atlas image {}", path.display()))?;
        Self::from_image_bytes(device, queue, &bytes, sampling, &path.display().to_string())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sampling(&self) -> AtlasSampling {
        self.sampling
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Region for a pixel rectangle of this atlas.
    pub fn region(&self, px: Rect) -> AtlasRegion {
        AtlasRegion::from_pixels(px, self.width, self.height)
    }
}

/// Decodes an encoded image (PNG) into RGBA8.
pub(super) fn decode_rgba8(bytes: &[u8], label: &str) -> Result<image::RgbaImage> {
    let img = image::load_from_memory(bytes)
        .with_context(|| format!("failed to decode atlas image '{label}'"))?;
    Ok(img.to_rgba8())
}

pub(super) fn validate_rgba8(width: u32, height: u32, len: usize) -> Result<()> {
    anyhow::ensure!(width > 0 && height > 0, "atlas must be non-empty (got {width}x{height})");
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .context("atlas dimensions overflow")?;
    anyhow::ensure!(
        len == expected,
        "atlas pixel buffer is {len} bytes, expected {expected} for {width}x{height} RGBA8"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_rect_maps_to_normalized_region() {
        let r = AtlasRegion::from_pixels(Rect::new(64.0, 128.0, 64.0, 64.0), 256, 256);
        assert_eq!(r.uv_offset, [0.25, 0.5]);
        assert_eq!(r.uv_size, [0.25, 0.25]);
    }

    #[test]
    fn grid_cells_tile_the_atlas() {
        let c = AtlasRegion::grid_cell(3, 1, 4, 2);
        assert_eq!(c.uv_offset, [0.75, 0.5]);
        assert_eq!(c.uv_size, [0.25, 0.5]);
    }

    #[test]
    fn zero_grid_does_not_divide_by_zero() {
        let c = AtlasRegion::grid_cell(0, 0, 0, 0);
        assert_eq!(c, AtlasRegion::FULL);
    }

    #[test]
    fn flipped_region_spans_the_same_texels() {
        let r = AtlasRegion::grid_cell(1, 0, 4, 1).flipped_x();
        assert_eq!(r.uv_offset, [0.5, 0.0]);
        assert_eq!(r.uv_size, [-0.25, 1.0]);
    }

    #[test]
    fn rgba8_validation() {
        assert!(validate_rgba8(2, 2, 16).is_ok());
        assert!(validate_rgba8(2, 2, 15).is_err());
        assert!(validate_rgba8(0, 4, 0).is_err());
    }

    #[test]
    fn sampler_descriptor_uses_one_address_mode_everywhere() {
        let s = AtlasSampling {
            filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::Repeat,
        };
        let d = s.descriptor(None);
        assert_eq!(d.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(d.address_mode_v, wgpu::AddressMode::Repeat);
        assert_eq!(d.mag_filter, wgpu::FilterMode::Linear);
        assert_eq!(d.min_filter, wgpu::FilterMode::Linear);
        assert_eq!(d.border_color, None);
    }

    #[test]
    fn clamp_to_border_uses_transparent_black() {
        let s = AtlasSampling {
            filter: wgpu::FilterMode::Nearest,
            address_mode: wgpu::AddressMode::ClampToBorder,
        };
        assert_eq!(
            s.descriptor(None).border_color,
            Some(wgpu::SamplerBorderColor::TransparentBlack)
        );
    }
}
