use crate::camera::OrthoCamera;
use crate::shaders;
use arcane_gfx::{GfxError, GraphicsBackend, ImageData, Mesh, QuadRenderer, Texture};
use arcane_input::{InputSnapshot, KeyCode};
use arcane_screen::Screen;
use glam::{Vec2, Vec3};
use std::path::{Path, PathBuf};

/// Tile spacing of the 3x3 field.
const SPACING: f32 = 2.0;
/// Pan speed of the arrow keys, world units per second.
const PAN_SPEED: f32 = 4.0;

const DIRT_DARK: [u8; 4] = [94, 63, 38, 255];
const DIRT_LIGHT: [u8; 4] = [134, 96, 67, 255];

/// State that lives from `show` to `hide`.
#[derive(Debug)]
struct Activation {
    mesh: Mesh,
    texture: Texture,
    camera: OrthoCamera,
    previous: Vec2,
}

impl Activation {
    fn create(gfx: &mut dyn GraphicsBackend, texture_path: Option<&Path>) -> Result<Self, GfxError> {
        let mesh = Mesh::quad(gfx, Vec3::ONE)?;
        let texture = match texture_path {
            Some(path) => Texture::load(gfx, path),
            None => ImageData::checker(16, 4, DIRT_DARK, DIRT_LIGHT)
                .and_then(|image| Texture::create(gfx, &image)),
        };
        let texture = match texture {
            Ok(texture) => texture,
            Err(e) => {
                mesh.dispose(gfx);
                return Err(e);
            }
        };
        let camera = OrthoCamera::new(16.0, 9.0).with_move_speed(0.5);
        Ok(Self {
            mesh,
            texture,
            previous: camera.position,
            camera,
        })
    }

    fn position_at(&self, alpha: f64) -> Vec2 {
        self.previous
            .lerp(self.camera.position, alpha.clamp(0.0, 1.0) as f32)
    }

    fn dispose(self, gfx: &mut dyn GraphicsBackend) {
        self.texture.dispose(gfx);
        self.mesh.dispose(gfx);
    }
}

/// A 3x3 field of textured tiles under a camera drifting to the left.
///
/// The renderer is created on the first `show` and kept until `dispose`;
/// mesh, texture and camera are rebuilt on every activation.
#[derive(Debug, Default)]
pub struct GameScreen {
    texture_path: Option<PathBuf>,
    renderer: Option<QuadRenderer>,
    active: Option<Activation>,
}

impl GameScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tile texture read from an image file instead of the built-in checker.
    pub fn with_texture(path: impl Into<PathBuf>) -> Self {
        Self {
            texture_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn camera(&self) -> Option<&OrthoCamera> {
        self.active.as_ref().map(|a| &a.camera)
    }

    /// Camera position to draw with, `alpha` of the way from the last step.
    pub fn interpolated_position(&self, alpha: f64) -> Option<Vec2> {
        self.active.as_ref().map(|a| a.position_at(alpha))
    }

    pub fn tile_positions() -> impl Iterator<Item = Vec3> {
        (-1..=1).rev().flat_map(|row| {
            (-1..=1).map(move |col| Vec3::new(col as f32 * SPACING, row as f32 * SPACING, 0.0))
        })
    }
}

impl Screen for GameScreen {
    fn show(&mut self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        if let Some(stale) = self.active.take() {
            stale.dispose(gfx);
        }

        let created_renderer = self.renderer.is_none();
        if created_renderer {
            self.renderer = Some(QuadRenderer::create(gfx, &shaders::scene_source())?);
        }

        match Activation::create(gfx, self.texture_path.as_deref()) {
            Ok(active) => {
                self.active = Some(active);
                tracing::debug!("game screen shown");
                Ok(())
            }
            Err(e) => {
                if created_renderer {
                    if let Some(renderer) = self.renderer.take() {
                        renderer.dispose(gfx);
                    }
                }
                Err(e)
            }
        }
    }

    fn hide(&mut self, gfx: &mut dyn GraphicsBackend) {
        if let Some(active) = self.active.take() {
            active.dispose(gfx);
        }
    }

    fn dispose(&mut self, gfx: &mut dyn GraphicsBackend) {
        self.hide(gfx);
        if let Some(renderer) = self.renderer.take() {
            renderer.dispose(gfx);
        }
    }

    fn update(&mut self, dt: f64, input: &InputSnapshot) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let dt = dt as f32;
        active.previous = active.camera.position;

        let mut pan = Vec2::new(-active.camera.move_speed, 0.0);
        if input.is_code_down(KeyCode::ArrowLeft) {
            pan.x -= PAN_SPEED;
        }
        if input.is_code_down(KeyCode::ArrowRight) {
            pan.x += PAN_SPEED;
        }
        if input.is_code_down(KeyCode::ArrowUp) {
            pan.y += PAN_SPEED;
        }
        if input.is_code_down(KeyCode::ArrowDown) {
            pan.y -= PAN_SPEED;
        }
        active.camera.translate(pan * dt);
    }

    fn render(&self, alpha: f64, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        let (Some(renderer), Some(active)) = (self.renderer.as_ref(), self.active.as_ref()) else {
            return Ok(());
        };
        let view_proj = active.camera.combined_at(active.position_at(alpha));

        for tile in Self::tile_positions() {
            renderer.draw_mesh(
                gfx,
                view_proj,
                tile,
                Vec2::ONE,
                &active.mesh,
                Some(&active.texture),
            )?;
        }
        Ok(())
    }
}
