use crate::backend::{DrawParams, GfxError, GraphicsBackend};
use crate::mesh::Mesh;
use crate::shader::{ShaderProgram, ShaderSource};
use crate::sprite::Sprite;
use crate::texture::Texture;
use glam::{Mat4, Vec2, Vec3};

/// Draws quads with one shader program.
///
/// The program lives as long as the renderer, which is meant to be created
/// once per registered screen rather than per activation.
#[derive(Debug)]
pub struct QuadRenderer {
    program: ShaderProgram,
}

impl QuadRenderer {
    pub fn create(gfx: &mut dyn GraphicsBackend, source: &ShaderSource) -> Result<Self, GfxError> {
        Ok(Self {
            program: ShaderProgram::create(gfx, source)?,
        })
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Draw `mesh` at `position`, scaled in x/y, under `view_proj`.
    pub fn draw_mesh(
        &self,
        gfx: &mut dyn GraphicsBackend,
        view_proj: Mat4,
        position: Vec3,
        scale: Vec2,
        mesh: &Mesh,
        texture: Option<&Texture>,
    ) -> Result<(), GfxError> {
        let model = Mat4::from_translation(position) * Mat4::from_scale(scale.extend(1.0));

        self.program.bind(gfx)?;
        if let Some(texture) = texture {
            texture.bind(gfx, 0)?;
        }
        mesh.draw(
            gfx,
            &DrawParams {
                transform: view_proj * model,
                textured: texture.is_some(),
            },
        )
    }

    pub fn draw_sprite(
        &self,
        gfx: &mut dyn GraphicsBackend,
        view_proj: Mat4,
        sprite: &Sprite,
        texture: &Texture,
    ) -> Result<(), GfxError> {
        self.draw_mesh(
            gfx,
            view_proj,
            sprite.position,
            sprite.size,
            sprite.mesh(),
            Some(texture),
        )
    }

    pub fn dispose(self, gfx: &mut dyn GraphicsBackend) {
        self.program.dispose(gfx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessBackend;
    use crate::texture::ImageData;
    use glam::Vec4;

    const SHADER: &str = "@vertex fn vs_main() {} @fragment fn fs_main() {}";

    #[test]
    fn draws_textured_mesh_with_combined_transform() {
        let mut gfx = HeadlessBackend::new();
        let renderer = QuadRenderer::create(&mut gfx, &ShaderSource::new("quad", SHADER)).unwrap();
        let mesh = Mesh::quad(&mut gfx, Vec3::ONE).unwrap();
        let tex = Texture::create(&mut gfx, &ImageData::solid(2, 2, [255; 4]).unwrap()).unwrap();

        gfx.begin_frame(Vec4::ZERO).unwrap();
        renderer
            .draw_mesh(
                &mut gfx,
                Mat4::IDENTITY,
                Vec3::new(2.0, -2.0, 0.0),
                Vec2::splat(0.5),
                &mesh,
                Some(&tex),
            )
            .unwrap();

        let draw = gfx.frame_draws()[0];
        assert_eq!(draw.mesh, mesh.id());
        assert_eq!(draw.texture, Some(tex.id()));
        assert_eq!(draw.program, renderer.program().id());
        let corner = draw.transform.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(corner, Vec3::new(2.5, -1.5, 0.0));

        tex.dispose(&mut gfx);
        mesh.dispose(&mut gfx);
        renderer.dispose(&mut gfx);
        assert_eq!(gfx.live_total(), 0);
    }

    #[test]
    fn untextured_draw() {
        let mut gfx = HeadlessBackend::new();
        let renderer = QuadRenderer::create(&mut gfx, &ShaderSource::new("quad", SHADER)).unwrap();
        let mesh = Mesh::quad(&mut gfx, Vec3::ONE).unwrap();
        gfx.begin_frame(Vec4::ZERO).unwrap();
        renderer
            .draw_mesh(&mut gfx, Mat4::IDENTITY, Vec3::ZERO, Vec2::ONE, &mesh, None)
            .unwrap();
        assert_eq!(gfx.frame_draws()[0].texture, None);
        mesh.dispose(&mut gfx);
        renderer.dispose(&mut gfx);
    }
}
