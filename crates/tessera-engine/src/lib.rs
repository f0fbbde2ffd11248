//! Tessera engine crate.
//!
//! Instanced 2D sprite rendering on wgpu: the sprite kernel (WGSL plus a Rust
//! reference of both stages), the host-side batch/atlas/camera layer, and the
//! platform + GPU runtime that drives it.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
