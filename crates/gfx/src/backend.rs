use crate::mesh::MeshData;
use crate::shader::ShaderSource;
use crate::texture::ImageData;
use glam::{Mat4, Vec4};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Native id of an uploaded mesh (vertex + index buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub NonZeroU32);

/// Native id of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub NonZeroU32);

/// Native id of a compiled and linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub NonZeroU32);

impl MeshId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TextureId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl ProgramId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Mesh,
    Texture,
    Program,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Mesh => "mesh",
            ResourceKind::Texture => "texture",
            ResourceKind::Program => "program",
        })
    }
}

/// Errors from resource uploads and draw calls.
///
/// Upload errors are resource-acquisition failures and are never retried.
/// `UnknownResource` and `NothingBound` are programmer errors surfaced loudly.
#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("invalid image data: {0}")]
    InvalidImage(String),
    #[error("invalid mesh data: {0}")]
    InvalidMesh(String),
    #[error("shader `{name}` failed to compile: {message}")]
    ShaderCompile { name: String, message: String },
    #[error("unknown {kind} id {id}")]
    UnknownResource { kind: ResourceKind, id: u32 },
    #[error("draw issued with no {0} bound")]
    NothingBound(ResourceKind),
    #[error("surface error: {0}")]
    Surface(String),
}

/// Per-draw state handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Full model-view-projection transform.
    pub transform: Mat4,
    /// Sample the texture bound at slot 0.
    pub textured: bool,
}

/// Contract of the graphics collaborator.
///
/// All calls are synchronous and fail immediately. Handles in this crate are
/// the only intended callers of the create/delete pairs.
pub trait GraphicsBackend {
    fn create_mesh(&mut self, data: &MeshData) -> Result<MeshId, GfxError>;
    fn delete_mesh(&mut self, id: MeshId);

    fn create_texture(&mut self, image: &ImageData) -> Result<TextureId, GfxError>;
    fn delete_texture(&mut self, id: TextureId);

    fn create_program(&mut self, source: &ShaderSource) -> Result<ProgramId, GfxError>;
    fn delete_program(&mut self, id: ProgramId);

    fn bind_program(&mut self, id: ProgramId) -> Result<(), GfxError>;
    fn bind_texture(&mut self, id: TextureId, slot: u32) -> Result<(), GfxError>;

    /// Draw a mesh with the currently bound program (and texture, if requested).
    fn draw_mesh(&mut self, id: MeshId, params: &DrawParams) -> Result<(), GfxError>;

    /// Start a frame, clearing colour and depth.
    fn begin_frame(&mut self, clear: Vec4) -> Result<(), GfxError>;

    /// Finish the frame and submit it for presentation.
    fn end_frame(&mut self) -> Result<(), GfxError>;

    /// Current drawable size in pixels.
    fn viewport(&self) -> (u32, u32);
}

/// Hands out non-zero native ids in increasing order.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> NonZeroU32 {
        let id = NonZeroU32::new(self.next).unwrap_or(NonZeroU32::MIN);
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}
