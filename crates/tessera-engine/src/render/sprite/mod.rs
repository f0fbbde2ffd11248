//! Instanced sprite rendering.
//!
//! - `layout`: the host/kernel data contract (records, vertex layouts, bindings)
//! - `kernel`: Rust reference of the two shader stages in `shaders/sprite.wgsl`
//! - `texels`: CPU texture + sampler used with the reference fragment stage
//! - `atlas`, `camera`, `batch`: host-side inputs to a draw
//! - `renderer`: pipeline, bind group and the instanced draw call

pub mod atlas;
pub mod batch;
pub mod camera;
pub mod kernel;
pub mod layout;
pub mod renderer;
pub mod texels;

pub use atlas::{AtlasRegion, AtlasSampling, SpriteAtlas};
pub use batch::{Sprite, SpriteBatch};
pub use camera::Camera2d;
pub use layout::{CameraUniform, SpriteInstance, SpriteVertex};
pub use renderer::SpriteRenderer;
