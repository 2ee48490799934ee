//! Graphics resources: meshes, textures and shader programs with an explicit
//! two-phase lifecycle, plus the backend contract they are uploaded through.
//!
//! # Invariants
//! - A handle value exists only while its native object is loaded.
//! - Disposal consumes the handle, so it cannot be disposed twice or used
//!   after disposal.
//! - Dropping a loaded handle without disposing it is a leak and is logged.

mod backend;
mod headless;
mod mesh;
mod renderer;
mod shader;
mod sprite;
mod texture;

pub use backend::{
    DrawParams, GfxError, GraphicsBackend, IdAllocator, MeshId, ProgramId, ResourceKind,
    TextureId,
};
pub use headless::{DrawRecord, HeadlessBackend, ResourceCounts};
pub use mesh::{Mesh, MeshData, UvRect, Vertex};
pub use renderer::QuadRenderer;
pub use shader::{FRAGMENT_ENTRY, ShaderProgram, ShaderSource, VERTEX_ENTRY};
pub use sprite::{Sprite, SpriteSheet};
pub use texture::{ImageData, Texture};

pub fn crate_info() -> &'static str {
    "arcane-gfx v0.1.0"
}
