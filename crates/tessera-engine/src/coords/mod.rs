//! Coordinate and geometry types shared by the host layer.
//!
//! Canonical world space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The sprite camera maps this space to clip space; see `render::sprite::camera`.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
