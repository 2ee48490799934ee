use crate::backend::{DrawParams, GfxError, GraphicsBackend, MeshId};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex: position, colour, texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

/// Sub-rectangle of a texture in normalized coordinates, `v` pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// CPU-side mesh source: vertices plus triangle-list indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit quad with corners at ±1, tinted by `color`, covering the whole texture.
    pub fn quad(color: Vec3) -> Self {
        Self::sprite(color, UvRect::FULL)
    }

    /// Unit quad mapping `uv` onto its face.
    pub fn sprite(color: Vec3, uv: UvRect) -> Self {
        let c = color.to_array();
        #[rustfmt::skip]
        let vertices = vec![
            Vertex { position: [-1.0, -1.0, 0.0], color: c, uv: [uv.min.x, uv.max.y] }, // bottom left
            Vertex { position: [-1.0,  1.0, 0.0], color: c, uv: [uv.min.x, uv.min.y] }, // top left
            Vertex { position: [ 1.0,  1.0, 0.0], color: c, uv: [uv.max.x, uv.min.y] }, // top right
            Vertex { position: [ 1.0, -1.0, 0.0], color: c, uv: [uv.max.x, uv.max.y] }, // bottom right
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 3, 0, 2],
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// A mesh must be a non-empty triangle list whose indices stay in range.
    pub fn validate(&self) -> Result<(), GfxError> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(GfxError::InvalidMesh("mesh has no geometry".into()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(GfxError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let len = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= len) {
            return Err(GfxError::InvalidMesh(format!(
                "index {bad} out of range for {len} vertices"
            )));
        }
        Ok(())
    }
}

/// GPU-resident mesh.
///
/// The source data is retained so the mesh can be rebuilt with [`Mesh::recreate`].
#[must_use = "a mesh must be disposed to release its GPU buffers"]
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    data: MeshData,
    live: bool,
}

impl Mesh {
    /// Validate and upload `data`.
    pub fn create(gfx: &mut dyn GraphicsBackend, data: MeshData) -> Result<Self, GfxError> {
        data.validate()?;
        let id = gfx.create_mesh(&data)?;
        tracing::trace!(
            id = id.get(),
            vertices = data.vertices.len(),
            indices = data.indices.len(),
            "mesh uploaded"
        );
        Ok(Self {
            id,
            data,
            live: true,
        })
    }

    pub fn quad(gfx: &mut dyn GraphicsBackend, color: Vec3) -> Result<Self, GfxError> {
        Self::create(gfx, MeshData::quad(color))
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    pub fn index_count(&self) -> u32 {
        self.data.index_count()
    }

    /// Replace the geometry. There is no partial-update path, so a new object is
    /// uploaded first and the old one released only once that succeeded; on
    /// failure the mesh keeps its previous contents.
    pub fn recreate(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        data: MeshData,
    ) -> Result<(), GfxError> {
        data.validate()?;
        let id = gfx.create_mesh(&data)?;
        gfx.delete_mesh(self.id);
        tracing::trace!(old = self.id.get(), new = id.get(), "mesh recreated");
        self.id = id;
        self.data = data;
        Ok(())
    }

    pub fn draw(&self, gfx: &mut dyn GraphicsBackend, params: &DrawParams) -> Result<(), GfxError> {
        gfx.draw_mesh(self.id, params)
    }

    /// Release the GPU buffers.
    pub fn dispose(mut self, gfx: &mut dyn GraphicsBackend) {
        gfx.delete_mesh(self.id);
        self.live = false;
        tracing::trace!(id = self.id.get(), "mesh disposed");
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if self.live {
            tracing::error!(id = self.id.get(), "mesh dropped without dispose, GPU buffers leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessBackend;
    use glam::Mat4;

    #[test]
    fn quad_layout() {
        let q = MeshData::quad(Vec3::ONE);
        assert_eq!(q.vertices.len(), 4);
        assert_eq!(q.index_count(), 6);
        assert_eq!(q.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(q.vertices[2].uv, [1.0, 0.0]);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * 4);
    }

    #[test]
    fn validate_rejects_bad_geometry() {
        assert!(MeshData::default().validate().is_err());

        let mut q = MeshData::quad(Vec3::ONE);
        q.indices.push(0);
        assert!(q.validate().is_err());

        let mut q = MeshData::quad(Vec3::ONE);
        q.indices[0] = 9;
        assert!(matches!(q.validate(), Err(GfxError::InvalidMesh(_))));
    }

    #[test]
    fn create_then_dispose_leaves_no_live_ids() {
        let mut gfx = HeadlessBackend::new();
        let mesh = Mesh::quad(&mut gfx, Vec3::ONE).unwrap();
        assert_eq!(gfx.live_meshes(), 1);
        mesh.dispose(&mut gfx);
        assert_eq!(gfx.meshes().created, gfx.meshes().deleted);
        assert_eq!(gfx.live_meshes(), 0);
        assert_eq!(gfx.invalid_deletes(), 0);
    }

    #[test]
    fn invalid_data_never_reaches_backend() {
        let mut gfx = HeadlessBackend::new();
        assert!(Mesh::create(&mut gfx, MeshData::default()).is_err());
        assert_eq!(gfx.meshes().created, 0);
    }

    #[test]
    fn recreate_swaps_ids_without_leaking() {
        let mut gfx = HeadlessBackend::new();
        let mut mesh = Mesh::quad(&mut gfx, Vec3::ONE).unwrap();
        let old = mesh.id();
        mesh.recreate(&mut gfx, MeshData::quad(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        assert_ne!(mesh.id(), old);
        assert_eq!(mesh.data().vertices[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(gfx.live_meshes(), 1);
        mesh.dispose(&mut gfx);
        assert_eq!(gfx.live_meshes(), 0);
    }

    #[test]
    fn failed_recreate_keeps_previous_mesh() {
        let mut gfx = HeadlessBackend::new();
        let mut mesh = Mesh::quad(&mut gfx, Vec3::ONE).unwrap();
        let old = mesh.id();
        assert!(mesh.recreate(&mut gfx, MeshData::default()).is_err());
        assert_eq!(mesh.id(), old);
        assert_eq!(gfx.live_meshes(), 1);
        mesh.dispose(&mut gfx);
    }

    #[test]
    fn draw_goes_through_bound_program() {
        let mut gfx = HeadlessBackend::new();
        let mesh = Mesh::quad(&mut gfx, Vec3::ONE).unwrap();
        let params = DrawParams {
            transform: Mat4::IDENTITY,
            textured: false,
        };
        assert!(matches!(
            mesh.draw(&mut gfx, &params),
            Err(GfxError::NothingBound(_))
        ));
        mesh.dispose(&mut gfx);
    }
}
