use crate::backend::{GfxError, GraphicsBackend, ProgramId};
use std::path::Path;

/// Entry point every vertex stage must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point every fragment stage must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Named WGSL module holding both stages of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: String,
    pub code: String,
}

impl ShaderSource {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Read a WGSL file; the file stem becomes the program name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GfxError> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path).map_err(|source| GfxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("shader")
            .to_string();
        Ok(Self { name, code })
    }
}

/// Compiled and linked shader program.
#[must_use = "a shader program must be disposed to release it"]
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    name: String,
    live: bool,
}

impl ShaderProgram {
    pub fn create(gfx: &mut dyn GraphicsBackend, source: &ShaderSource) -> Result<Self, GfxError> {
        let id = gfx.create_program(source)?;
        tracing::debug!(id = id.get(), name = %source.name, "shader program linked");
        Ok(Self {
            id,
            name: source.name.clone(),
            live: true,
        })
    }

    pub fn load(gfx: &mut dyn GraphicsBackend, path: impl AsRef<Path>) -> Result<Self, GfxError> {
        let source = ShaderSource::load(path)?;
        Self::create(gfx, &source)
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bind(&self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        gfx.bind_program(self.id)
    }

    pub fn dispose(mut self, gfx: &mut dyn GraphicsBackend) {
        gfx.delete_program(self.id);
        self.live = false;
        tracing::debug!(id = self.id.get(), name = %self.name, "shader program disposed");
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if self.live {
            tracing::error!(id = self.id.get(), name = %self.name, "shader program dropped without dispose");
        }
    }
}
