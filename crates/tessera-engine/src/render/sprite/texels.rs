//! CPU texture + sampler for the reference fragment stage.
//!
//! Mirrors the GPU sampler for a single mip level: texel centers sit at
//! `(i + 0.5) / width`, `Nearest` picks the containing texel, `Linear` blends
//! the four surrounding ones, and every texel fetch goes through the address
//! mode of `AtlasSampling`.

use anyhow::Result;

use super::atlas::{decode_rgba8, validate_rgba8, AtlasSampling};
use super::kernel::SampleTexture;

/// Float RGBA image sampled on the CPU.
#[derive(Debug, Clone)]
pub struct CpuTexture {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
    sampling: AtlasSampling,
}

impl CpuTexture {
    /// Builds a texture from already-linear texels (row-major, top row first).
    pub fn from_texels(
        width: u32,
        height: u32,
        texels: Vec<[f32; 4]>,
        sampling: AtlasSampling,
    ) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "texture must be non-empty");
        anyhow::ensure!(
            texels.len() == width as usize * height as usize,
            "expected {} texels, got {}",
            width as usize * height as usize,
            texels.len()
        );
        Ok(Self { width, height, texels, sampling })
    }

    /// Decodes sRGB-encoded RGBA8 pixels the way an `Rgba8UnormSrgb` texture does.
    pub fn from_srgb_rgba8(
        width: u32,
        height: u32,
        pixels: &[u8],
        sampling: AtlasSampling,
    ) -> Result<Self> {
        validate_rgba8(width, height, pixels.len())?;
        let texels = pixels
            .chunks_exact(4)
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self::from_texels(width, height, texels, sampling)
    }

    /// Decodes an image the same way `SpriteAtlas::from_image_bytes` uploads it.
    pub fn from_image(img: &image::RgbaImage, sampling: AtlasSampling) -> Result<Self> {
        let (w, h) = img.dimensions();
        Self::from_srgb_rgba8(w, h, img.as_raw(), sampling)
    }

    /// Decodes an encoded image (PNG) the way `SpriteAtlas::from_image_bytes` does.
    pub fn from_image_bytes(bytes: &[u8], sampling: AtlasSampling, label: &str) -> Result<Self> {
        let img = decode_rgba8(bytes, label)?;
        Self::from_image(&img, sampling)
    }

    /// A 1x1 texture of a single color.
    pub fn solid(color: [f32; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
            sampling: AtlasSampling::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fetches texel `(x, y)` after applying the address mode.
    ///
    /// `None` means the fetch fell on the border of a `ClampToBorder` sampler.
    fn fetch(&self, x: i64, y: i64) -> Option<[f32; 4]> {
        let mode = self.sampling.address_mode;
        let x = address(x, self.width as i64, mode)?;
        let y = address(y, self.height as i64, mode)?;
        Some(self.texels[y as usize * self.width as usize + x as usize])
    }
}

impl SampleTexture for CpuTexture {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        const BORDER: [f32; 4] = [0.0; 4];

        let u = uv[0] * self.width as f32;
        let v = uv[1] * self.height as f32;

        match self.sampling.filter {
            wgpu::FilterMode::Nearest => self
                .fetch(u.floor() as i64, v.floor() as i64)
                .unwrap_or(BORDER),
            wgpu::FilterMode::Linear => {
                let (u, v) = (u - 0.5, v - 0.5);
                let (x0, y0) = (u.floor(), v.floor());
                let (fx, fy) = (u - x0, v - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);

                let t00 = self.fetch(x0, y0).unwrap_or(BORDER);
                let t10 = self.fetch(x0 + 1, y0).unwrap_or(BORDER);
                let t01 = self.fetch(x0, y0 + 1).unwrap_or(BORDER);
                let t11 = self.fetch(x0 + 1, y0 + 1).unwrap_or(BORDER);

                std::array::from_fn(|c| {
                    let top = t00[c] + (t10[c] - t00[c]) * fx;
                    let bottom = t01[c] + (t11[c] - t01[c]) * fx;
                    top + (bottom - top) * fy
                })
            }
        }
    }
}

/// Resolves an integer texel index against `len` texels.
fn address(i: i64, len: i64, mode: wgpu::AddressMode) -> Option<i64> {
    match mode {
        wgpu::AddressMode::ClampToEdge => Some(i.clamp(0, len - 1)),
        wgpu::AddressMode::Repeat => Some(i.rem_euclid(len)),
        wgpu::AddressMode::MirrorRepeat => {
            let p = i.rem_euclid(2 * len);
            Some(if p >= len { 2 * len - 1 - p } else { p })
        }
        wgpu::AddressMode::ClampToBorder => (0..len).contains(&i).then_some(i),
    }
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
