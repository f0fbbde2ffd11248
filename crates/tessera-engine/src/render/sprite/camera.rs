//! 2D orthographic camera producing the sprite `CameraUniform`.

use glam::{Mat4, Vec4};

use crate::coords::{Vec2, Viewport};

use super::layout::CameraUniform;

/// Top-left-origin orthographic camera over world space (logical px, +Y down).
///
/// `position` is the world point shown at the top-left corner of the viewport;
/// `zoom` scales world units to logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera2d {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2d {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            zoom: 1.0,
        }
    }
}

impl Camera2d {
    pub fn new(position: Vec2, zoom: f32) -> Self {
        Self { position, zoom }
    }

    /// Projection mapping the visible world rectangle onto clip space.
    ///
    /// World x in `[position.x, position.x + width / zoom]` maps to `[-1, 1]`,
    /// world y in `[position.y, position.y + height / zoom]` maps to `[1, -1]`.
    /// z passes through unchanged, so sprites stay at depth 0.
    pub fn view_proj(&self, viewport: Viewport) -> Mat4 {
        let w = viewport.width.max(1.0);
        let h = viewport.height.max(1.0);
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 { self.zoom } else { 1.0 };

        let sx = 2.0 * zoom / w;
        let sy = -2.0 * zoom / h;

        Mat4::from_cols(
            Vec4::new(sx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, sy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(-1.0 - self.position.x * sx, 1.0 - self.position.y * sy, 0.0, 1.0),
        )
    }

    pub fn uniform(&self, viewport: Viewport) -> CameraUniform {
        CameraUniform::from_mat4(self.view_proj(viewport))
    }
}

impl CameraUniform {
    /// Screen-space projection: world units are logical pixels of `viewport`.
    pub fn orthographic(viewport: Viewport) -> Self {
        Camera2d::default().uniform(viewport)
    }
}
