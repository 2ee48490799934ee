//! wgpu implementation of the graphics backend contract.
//!
//! Shader programs are WGSL modules with `vs_main`/`fs_main` entry points,
//! fed with the interleaved [`arcane_gfx::Vertex`] layout at locations 0..=2
//! and a per-draw instance block at locations 3..=7 (transform columns, then
//! a params vector whose `x` is non-zero when the draw samples a texture).
//! The texture and its sampler sit at group 0, bindings 0 and 1.
//!
//! # Invariants
//! - Draws are encoded in the order they were issued within a frame.
//! - Untextured draws bind a 1x1 white texture so every program sees a
//!   valid binding.
//! - A lost or outdated surface is reconfigured and the frame is skipped.

mod gpu;

pub use gpu::WgpuBackend;

pub fn crate_info() -> &'static str {
    "arcane-render-wgpu v0.1.0"
}
