//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers) and record into a
//! caller-provided encoder.
//!
//! Convention:
//! - World geometry is in logical pixels (top-left origin, +Y down).
//! - The vertex shader maps world space to clip space with a camera uniform.

mod ctx;
pub mod sprite;

pub use ctx::{RenderCtx, RenderTarget};
