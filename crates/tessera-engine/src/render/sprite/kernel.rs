//! Rust reference of the sprite kernel.
//!
//! `vertex_stage` and `fragment_stage` compute exactly what `vs_main` and
//! `fs_main` in `shaders/sprite.wgsl` compute. Both are pure: they read their
//! inputs through shared references and keep no state, so any number of
//! invocations may run in any order.

use glam::{Vec2, Vec4};

use super::layout::{CameraUniform, SpriteInstance, SpriteVertex};

/// Output of the vertex stage, input of the rasterizer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexOutput {
    pub clip_position: [f32; 4],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

/// Interpolated attributes seen by one fragment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FragmentInput {
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl From<VertexOutput> for FragmentInput {
    fn from(v: VertexOutput) -> Self {
        Self {
            tex_coords: v.tex_coords,
            color: v.color,
        }
    }
}

/// A bound texture together with its sampler.
pub trait SampleTexture {
    /// Returns the filtered RGBA value at normalized coordinates `uv`.
    ///
    /// Coordinates outside [0, 1] are resolved by the sampler's address mode.
    fn sample(&self, uv: [f32; 2]) -> [f32; 4];
}

impl<T: SampleTexture + ?Sized> SampleTexture for &T {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        (**self).sample(uv)
    }
}

/// Maps one (quad corner, instance) pair to clip space.
pub fn vertex_stage(
    vertex: &SpriteVertex,
    instance: &SpriteInstance,
    camera: &CameraUniform,
) -> VertexOutput {
    let world_pos =
        Vec2::from(instance.position) + Vec2::from(vertex.position) * Vec2::from(instance.size);
    let clip = camera.matrix() * world_pos.extend(0.0).extend(1.0);

    let tex_coords = Vec2::from(instance.uv_offset)
        + Vec2::from(vertex.tex_coords) * Vec2::from(instance.uv_size);

    VertexOutput {
        clip_position: clip.to_array(),
        tex_coords: tex_coords.to_array(),
        color: instance.color,
    }
}

/// Shades one covered pixel: sampled texel times tint, per channel.
pub fn fragment_stage<T: SampleTexture + ?Sized>(input: &FragmentInput, texture: &T) -> [f32; 4] {
    (Vec4::from(texture.sample(input.tex_coords)) * Vec4::from(input.color)).to_array()
}

/// Screen-space linear interpolation of three vertex outputs.
///
/// `weights` are barycentric and expected to sum to 1. For sprite draws with an
/// affine projection every vertex has `w == 1`, so this equals the
/// perspective-correct interpolation wgpu performs by default.
pub fn interpolate(vertices: [&VertexOutput; 3], weights: [f32; 3]) -> FragmentInput {
    let mut tex = Vec2::ZERO;
    let mut color = Vec4::ZERO;
    for (v, w) in vertices.iter().zip(weights) {
        tex += Vec2::from(v.tex_coords) * w;
        color += Vec4::from(v.color) * w;
    }
    FragmentInput {
        tex_coords: tex.to_array(),
        color: color.to_array(),
    }
}
