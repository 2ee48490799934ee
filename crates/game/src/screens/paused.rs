use crate::camera::OrthoCamera;
use crate::shaders;
use arcane_gfx::{GfxError, GraphicsBackend, ImageData, QuadRenderer, Sprite, Texture, UvRect};
use arcane_input::InputSnapshot;
use arcane_screen::Screen;
use glam::Vec3;

const PANEL_TINT: Vec3 = Vec3::new(0.25, 0.3, 0.55);

#[derive(Debug)]
struct Activation {
    sprite: Sprite,
    texture: Texture,
    camera: OrthoCamera,
}

/// Overlay shown while the game is paused: one tinted panel.
#[derive(Debug, Default)]
pub struct PausedScreen {
    renderer: Option<QuadRenderer>,
    active: Option<Activation>,
}

impl PausedScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shown(&self) -> bool {
        self.active.is_some()
    }

    fn activate(gfx: &mut dyn GraphicsBackend) -> Result<Activation, GfxError> {
        let texture = ImageData::solid(1, 1, [255; 4]).and_then(|image| Texture::create(gfx, &image))?;
        let mut sprite = match Sprite::create(gfx, UvRect::FULL, PANEL_TINT) {
            Ok(sprite) => sprite,
            Err(e) => {
                texture.dispose(gfx);
                return Err(e);
            }
        };
        sprite.set_size(6.0, 2.0);
        Ok(Activation {
            sprite,
            texture,
            camera: OrthoCamera::new(16.0, 9.0),
        })
    }
}

impl Screen for PausedScreen {
    fn show(&mut self, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        self.hide(gfx);

        let created_renderer = self.renderer.is_none();
        if created_renderer {
            self.renderer = Some(QuadRenderer::create(gfx, &shaders::scene_source())?);
        }
        match Self::activate(gfx) {
            Ok(active) => {
                self.active = Some(active);
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
            active.sprite.dispose(gfx);
            active.texture.dispose(gfx);
        }
    }

    fn dispose(&mut self, gfx: &mut dyn GraphicsBackend) {
        self.hide(gfx);
        if let Some(renderer) = self.renderer.take() {
            renderer.dispose(gfx);
        }
    }

    fn update(&mut self, _dt: f64, _input: &InputSnapshot) {}

    fn render(&self, _alpha: f64, gfx: &mut dyn GraphicsBackend) -> Result<(), GfxError> {
        match (self.renderer.as_ref(), self.active.as_ref()) {
            (Some(renderer), Some(active)) => renderer.draw_sprite(
                gfx,
                active.camera.combined(),
                &active.sprite,
                &active.texture,
            ),
            _ => Ok(()),
        }
    }
}
