use crate::backend::{GfxError, GraphicsBackend};
use crate::mesh::{Mesh, MeshData, UvRect};
use crate::texture::Texture;
use glam::{Vec2, Vec3};

/// Textured quad showing one region of a texture.
///
/// The sprite owns its mesh but not the texture; the texture is supplied
/// when drawing so several sprites can share one sheet.
#[derive(Debug)]
pub struct Sprite {
    mesh: Mesh,
    region: UvRect,
    tint: Vec3,
    pub position: Vec3,
    pub size: Vec2,
}

impl Sprite {
    pub fn create(
        gfx: &mut dyn GraphicsBackend,
        region: UvRect,
        tint: Vec3,
    ) -> Result<Self, GfxError> {
        let mesh = Mesh::create(gfx, MeshData::sprite(tint, region))?;
        Ok(Self {
            mesh,
            region,
            tint,
            position: Vec3::ZERO,
            size: Vec2::ONE,
        })
    }

    /// Sprite covering the whole texture, untinted.
    pub fn full(gfx: &mut dyn GraphicsBackend) -> Result<Self, GfxError> {
        Self::create(gfx, UvRect::FULL, Vec3::ONE)
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn region(&self) -> UvRect {
        self.region
    }

    pub fn tint(&self) -> Vec3 {
        self.tint
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position.x = x;
        self.position.y = y;
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    /// Tint is baked into the vertices, so this rebuilds the mesh.
    pub fn set_tint(&mut self, gfx: &mut dyn GraphicsBackend, tint: Vec3) -> Result<(), GfxError> {
        self.mesh.recreate(gfx, MeshData::sprite(tint, self.region))?;
        self.tint = tint;
        Ok(())
    }

    pub fn set_region(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        region: UvRect,
    ) -> Result<(), GfxError> {
        self.mesh.recreate(gfx, MeshData::sprite(self.tint, region))?;
        self.region = region;
        Ok(())
    }

    pub fn dispose(self, gfx: &mut dyn GraphicsBackend) {
        self.mesh.dispose(gfx);
    }
}

/// Pixel-to-UV mapping for a texture atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    width: u32,
    height: u32,
}

impl SpriteSheet {
    pub fn new(texture: &Texture) -> Self {
        Self::from_size(texture.width(), texture.height())
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// UV rectangle for the pixel rectangle at (`x`, `y`) measured from the
    /// top-left corner. A rectangle covering the whole sheet maps to
    /// [`UvRect::FULL`] exactly.
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> UvRect {
        if x == 0 && y == 0 && width >= self.width && height >= self.height {
            return UvRect::FULL;
        }
        let (sw, sh) = (self.width as f32, self.height as f32);
        UvRect::new(
            Vec2::new(x as f32 / sw, y as f32 / sh),
            Vec2::new(
                x.saturating_add(width) as f32 / sw,
                y.saturating_add(height) as f32 / sh,
            ),
        )
    }

    pub fn sprite(
        &self,
        gfx: &mut dyn GraphicsBackend,
        tint: Vec3,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Sprite, GfxError> {
        Sprite::create(gfx, self.region(x, y, width, height), tint)
    }
}
