//! In-memory [`GraphicsBackend`] that tracks resources without a GPU.
//!
//! Used by the CLI simulator and by tests to check that every handle created
//! is released exactly once.

use crate::backend::{
    DrawParams, GfxError, GraphicsBackend, IdAllocator, MeshId, ProgramId, ResourceKind, TextureId,
};
use crate::mesh::MeshData;
use crate::shader::{FRAGMENT_ENTRY, ShaderSource, VERTEX_ENTRY};
use crate::texture::ImageData;
use glam::{Mat4, Vec4};
use std::collections::{BTreeSet, HashMap};

/// Create/delete tallies for one resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub created: u64,
    pub deleted: u64,
}

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub mesh: MeshId,
    pub program: ProgramId,
    pub texture: Option<TextureId>,
    pub transform: Mat4,
}

#[derive(Debug, Default)]
struct Pool {
    live: BTreeSet<u32>,
    counts: ResourceCounts,
}

impl Pool {
    fn insert(&mut self, id: u32) {
        self.live.insert(id);
        self.counts.created += 1;
    }

    fn remove(&mut self, id: u32) -> bool {
        let known = self.live.remove(&id);
        if known {
            self.counts.deleted += 1;
        }
        known
    }
}

#[derive(Debug)]
pub struct HeadlessBackend {
    ids: IdAllocator,
    meshes: Pool,
    textures: Pool,
    programs: Pool,
    invalid_deletes: u64,
    bound_program: Option<ProgramId>,
    bound_textures: HashMap<u32, TextureId>,
    draws: Vec<DrawRecord>,
    total_draws: u64,
    frames: u64,
    in_frame: bool,
    clear: Vec4,
    viewport: (u32, u32),
    fail_shaders: bool,
    fail_textures: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self {
            ids: IdAllocator::new(),
            meshes: Pool::default(),
            textures: Pool::default(),
            programs: Pool::default(),
            invalid_deletes: 0,
            bound_program: None,
            bound_textures: HashMap::new(),
            draws: Vec::new(),
            total_draws: 0,
            frames: 0,
            in_frame: false,
            clear: Vec4::ZERO,
            viewport: (100, 100),
            fail_shaders: false,
            fail_textures: false,
        }
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Make every program creation fail to compile.
    pub fn with_failing_shaders(mut self) -> Self {
        self.fail_shaders = true;
        self
    }

    /// Make every texture upload fail.
    pub fn with_failing_textures(mut self) -> Self {
        self.fail_textures = true;
        self
    }

    pub fn set_fail_shaders(&mut self, fail: bool) {
        self.fail_shaders = fail;
    }

    pub fn set_fail_textures(&mut self, fail: bool) {
        self.fail_textures = fail;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn meshes(&self) -> ResourceCounts {
        self.meshes.counts
    }

    pub fn textures(&self) -> ResourceCounts {
        self.textures.counts
    }

    pub fn programs(&self) -> ResourceCounts {
        self.programs.counts
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.live.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.live.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.live.len()
    }

    pub fn live_total(&self) -> usize {
        self.live_meshes() + self.live_textures() + self.live_programs()
    }

    /// Deletes of ids that were never created or already released.
    pub fn invalid_deletes(&self) -> u64 {
        self.invalid_deletes
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.bound_program
    }

    pub fn bound_texture(&self, slot: u32) -> Option<TextureId> {
        self.bound_textures.get(&slot).copied()
    }

    /// Draws recorded since the last `begin_frame`.
    pub fn frame_draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    /// Completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear
    }

    fn invalid_delete(&mut self, kind: ResourceKind, id: u32) {
        self.invalid_deletes += 1;
        tracing::error!(%kind, id, "delete of unknown resource");
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_mesh(&mut self, data: &MeshData) -> Result<MeshId, GfxError> {
        data.validate()?;
        let id = MeshId(self.ids.next());
        self.meshes.insert(id.get());
        Ok(id)
    }

    fn delete_mesh(&mut self, id: MeshId) {
        if !self.meshes.remove(id.get()) {
            self.invalid_delete(ResourceKind::Mesh, id.get());
        }
    }

    fn create_texture(&mut self, image: &ImageData) -> Result<TextureId, GfxError> {
        if self.fail_textures {
            return Err(GfxError::InvalidImage("texture uploads disabled".into()));
        }
        let id = TextureId(self.ids.next());
        self.textures.insert(id.get());
        tracing::trace!(id = id.get(), width = image.width, height = image.height, "headless texture");
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if self.textures.remove(id.get()) {
            self.bound_textures.retain(|_, bound| *bound != id);
        } else {
            self.invalid_delete(ResourceKind::Texture, id.get());
        }
    }

    fn create_program(&mut self, source: &ShaderSource) -> Result<ProgramId, GfxError> {
        let missing = [VERTEX_ENTRY, FRAGMENT_ENTRY]
            .into_iter()
            .find(|entry| !source.code.contains(&format!("fn {entry}")));
        if let Some(entry) = missing {
            return Err(GfxError::ShaderCompile {
                name: source.name.clone(),
                message: format!("missing entry point `{entry}`"),
            });
        }
        if self.fail_shaders {
            return Err(GfxError::ShaderCompile {
                name: source.name.clone(),
                message: "shader compilation disabled".into(),
            });
        }
        let id = ProgramId(self.ids.next());
        self.programs.insert(id.get());
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        if self.programs.remove(id.get()) {
            if self.bound_program == Some(id) {
                self.bound_program = None;
            }
        } else {
            self.invalid_delete(ResourceKind::Program, id.get());
        }
    }

    fn bind_program(&mut self, id: ProgramId) -> Result<(), GfxError> {
        if !self.programs.live.contains(&id.get()) {
            return Err(GfxError::UnknownResource {
                kind: ResourceKind::Program,
                id: id.get(),
            });
        }
        self.bound_program = Some(id);
        Ok(())
    }

    fn bind_texture(&mut self, id: TextureId, slot: u32) -> Result<(), GfxError> {
        if !self.textures.live.contains(&id.get()) {
            return Err(GfxError::UnknownResource {
                kind: ResourceKind::Texture,
                id: id.get(),
            });
        }
        self.bound_textures.insert(slot, id);
        Ok(())
    }

    fn draw_mesh(&mut self, id: MeshId, params: &DrawParams) -> Result<(), GfxError> {
        let program = self
            .bound_program
            .ok_or(GfxError::NothingBound(ResourceKind::Program))?;
        if !self.meshes.live.contains(&id.get()) {
            return Err(GfxError::UnknownResource {
                kind: ResourceKind::Mesh,
                id: id.get(),
            });
        }
        let texture = if params.textured {
            Some(
                self.bound_texture(0)
                    .ok_or(GfxError::NothingBound(ResourceKind::Texture))?,
            )
        } else {
            None
        };
        self.draws.push(DrawRecord {
            mesh: id,
            program,
            texture,
            transform: params.transform,
        });
        self.total_draws += 1;
        Ok(())
    }

    fn begin_frame(&mut self, clear: Vec4) -> Result<(), GfxError> {
        if self.in_frame {
            tracing::warn!("begin_frame while a frame is open, previous draws discarded");
        }
        self.draws.clear();
        self.clear = clear;
        self.in_frame = true;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GfxError> {
        if !self.in_frame {
            return Err(GfxError::Surface("end_frame without begin_frame".into()));
        }
        self.in_frame = false;
        self.frames += 1;
        Ok(())
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}
