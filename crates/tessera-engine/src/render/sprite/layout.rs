//! Data contract between the host and the sprite kernel.
//!
//! Every record here is `#[repr(C)]` + `Pod` and is uploaded verbatim. Field
//! order, offsets and shader locations must match `shaders/sprite.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// WGSL source of the sprite kernel (`vs_main` / `fs_main`).
pub const SPRITE_SHADER_WGSL: &str = include_str!("shaders/sprite.wgsl");

pub const CAMERA_BINDING: u32 = 0;
pub const ATLAS_TEXTURE_BINDING: u32 = 1;
pub const ATLAS_SAMPLER_BINDING: u32 = 2;

// ── per-vertex stream ─────────────────────────────────────────────────────

/// One corner of the shared unit quad.
///
/// `position` and `tex_coords` both span [0, 1], top-left origin.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl SpriteVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // tex_coords
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const fn corner(x: f32, y: f32) -> SpriteVertex {
    SpriteVertex { position: [x, y], tex_coords: [x, y] }
}

/// The four corners reused by every instance.
pub const QUAD_VERTICES: [SpriteVertex; 4] = [
    corner(0.0, 0.0),
    corner(1.0, 0.0),
    corner(1.0, 1.0),
    corner(0.0, 1.0),
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── per-instance stream ───────────────────────────────────────────────────

/// One sprite. Layout (48 bytes):
///
///  offset  0  position   [f32; 2]   loc 2
///  offset  8  size       [f32; 2]   loc 3
///  offset 16  uv_offset  [f32; 2]   loc 4
///  offset 24  uv_size    [f32; 2]   loc 5
///  offset 32  color      [f32; 4]   loc 6
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World-space anchor (top-left corner for positive sizes).
    pub position: [f32; 2],
    /// World-space extent.
    pub size: [f32; 2],
    /// Top-left of the atlas sub-rectangle, normalized.
    pub uv_offset: [f32; 2],
    /// Extent of the atlas sub-rectangle, normalized.
    pub uv_size: [f32; 2],
    /// Straight-alpha RGBA tint.
    pub color: [f32; 4],
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x2, // position
        3 => Float32x2, // size
        4 => Float32x2, // uv_offset
        5 => Float32x2, // uv_size
        6 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

// ── camera uniform ────────────────────────────────────────────────────────

/// View-projection matrix, column-major (`view_proj[col][row]`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub const IDENTITY: Self = Self {
        view_proj: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub fn from_mat4(m: Mat4) -> Self {
        Self { view_proj: m.to_cols_array_2d() }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ── bindings ──────────────────────────────────────────────────────────────

/// Group 0 layout: camera (vertex), atlas texture and sampler (fragment).
pub fn bind_group_layout_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: CAMERA_BINDING,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<CameraUniform>() as u64,
                ),
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: ATLAS_TEXTURE_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: ATLAS_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn record_sizes_match_wgsl_expectations() {
        assert_eq!(size_of::<SpriteVertex>(), 16);
        assert_eq!(size_of::<SpriteInstance>(), 48);
        assert_eq!(size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn instance_offsets() {
        assert_eq!(offset_of!(SpriteInstance, position), 0);
        assert_eq!(offset_of!(SpriteInstance, size), 8);
        assert_eq!(offset_of!(SpriteInstance, uv_offset), 16);
        assert_eq!(offset_of!(SpriteInstance, uv_size), 24);
        assert_eq!(offset_of!(SpriteInstance, color), 32);
    }

    #[test]
    fn vertex_stream_uses_locations_0_and_1() {
        let l = SpriteVertex::layout();
        assert_eq!(l.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(l.array_stride, 16);
        let locs: Vec<_> = l
            .attributes
            .iter()
            .map(|a| (a.shader_location, a.offset, a.format))
            .collect();
        assert_eq!(
            locs,
            vec![
                (0, 0, wgpu::VertexFormat::Float32x2),
                (1, 8, wgpu::VertexFormat::Float32x2),
            ]
        );
    }

    #[test]
    fn instance_stream_uses_locations_2_through_6() {
        let l = SpriteInstance::layout();
        assert_eq!(l.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(l.array_stride, 48);
        let locs: Vec<_> = l
            .attributes
            .iter()
            .map(|a| (a.shader_location, a.offset, a.format))
            .collect();
        assert_eq!(
            locs,
            vec![
                (2, 0, wgpu::VertexFormat::Float32x2),
                (3, 8, wgpu::VertexFormat::Float32x2),
                (4, 16, wgpu::VertexFormat::Float32x2),
                (5, 24, wgpu::VertexFormat::Float32x2),
                (6, 32, wgpu::VertexFormat::Float32x4),
            ]
        );
    }

    #[test]
    fn quad_corners_cover_unit_square() {
        let mut corners: Vec<[f32; 2]> = QUAD_VERTICES.iter().map(|v| v.position).collect();
        corners.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(corners, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
        assert!(QUAD_VERTICES.iter().all(|v| v.position == v.tex_coords));
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn binding_table() {
        let [camera, texture, sampler] = bind_group_layout_entries();

        assert_eq!(camera.binding, 0);
        assert_eq!(camera.visibility, wgpu::ShaderStages::VERTEX);
        assert!(matches!(
            camera.ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                min_binding_size: Some(s),
                ..
            }
                if s.get() == 64
        ));

        assert_eq!(texture.binding, 1);
        assert_eq!(texture.visibility, wgpu::ShaderStages::FRAGMENT);
        assert!(matches!(
            texture.ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { .. },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            }
        ));

        assert_eq!(sampler.binding, 2);
        assert_eq!(sampler.visibility, wgpu::ShaderStages::FRAGMENT);
        assert!(matches!(sampler.ty, wgpu::BindingType::Sampler(_)));
    }

    #[test]
    fn shader_declares_the_same_contract() {
        let src = SPRITE_SHADER_WGSL;
        assert!(src.contains("@group(0) @binding(0) var<uniform> camera"));
        assert!(src.contains("@group(0) @binding(1) var atlas_tex: texture_2d<f32>"));
        assert!(src.contains("@group(0) @binding(2) var atlas_smp: sampler"));
        for loc in 0..=6 {
            assert!(src.contains(&format!("@location({loc})")), "missing location {loc}");
        }
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn fs_main"));
    }

    #[test]
    fn camera_uniform_round_trips_through_glam() {
        let m = Mat4::from_translation(glam::Vec3::new(3.0, -2.0, 0.0));
        assert_eq!(CameraUniform::from_mat4(m).matrix(), m);
        assert_eq!(CameraUniform::default().matrix(), Mat4::IDENTITY);
    }
}
