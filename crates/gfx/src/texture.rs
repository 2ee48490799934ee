use crate::backend::{GfxError, GraphicsBackend, TextureId};
use std::fmt;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 image, tightly packed, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, GfxError> {
        if width == 0 || height == 0 {
            return Err(GfxError::InvalidImage(format!("empty image {width}x{height}")));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(GfxError::InvalidImage(format!(
                "{width}x{height} RGBA needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded image (PNG) into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, GfxError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GfxError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| GfxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, GfxError> {
        let count = width as usize * height as usize;
        Self::new(width, height, rgba.repeat(count))
    }

    /// Procedural checkerboard of `cell`-pixel squares.
    pub fn checker(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Result<Self, GfxError> {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &a } else { &b });
            }
        }
        Self::new(size, size, pixels)
    }
}

/// GPU-resident texture.
///
/// Pixel data is released once uploaded; only the dimensions are kept.
#[must_use = "a texture must be disposed to release its GPU memory"]
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    path: Option<PathBuf>,
    live: bool,
}

impl Texture {
    pub fn create(gfx: &mut dyn GraphicsBackend, image: &ImageData) -> Result<Self, GfxError> {
        let id = gfx.create_texture(image)?;
        tracing::trace!(
            id = id.get(),
            width = image.width,
            height = image.height,
            "texture uploaded"
        );
        Ok(Self {
            id,
            width: image.width,
            height: image.height,
            path: None,
            live: true,
        })
    }

    /// Read, decode and upload an image file.
    pub fn load(gfx: &mut dyn GraphicsBackend, path: impl AsRef<Path>) -> Result<Self, GfxError> {
        let path = path.as_ref();
        let image = ImageData::load(path)?;
        let mut texture = Self::create(gfx, &image)?;
        texture.path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "texture loaded");
        Ok(texture)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bind(&self, gfx: &mut dyn GraphicsBackend, slot: u32) -> Result<(), GfxError> {
        gfx.bind_texture(self.id, slot)
    }

    pub fn dispose(mut self, gfx: &mut dyn GraphicsBackend) {
        gfx.delete_texture(self.id);
        self.live = false;
        tracing::trace!(id = self.id.get(), "texture disposed");
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.live {
            tracing::error!(id = self.id.get(), "texture dropped without dispose, GPU memory leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessBackend;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn image_size_is_checked() {
        assert!(ImageData::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            ImageData::new(2, 2, vec![0; 15]),
            Err(GfxError::InvalidImage(_))
        ));
        assert!(ImageData::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn checker_alternates() {
        let img = ImageData::checker(4, 2, [255; 4], [0, 0, 0, 255]).unwrap();
        assert_eq!(&img.pixels[0..4], &[255; 4]);
        // pixel (2, 0) is in the second cell
        assert_eq!(&img.pixels[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn decode_png() {
        let img = ImageData::decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(&img.pixels[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            ImageData::decode(b"definitely not a png"),
            Err(GfxError::ImageDecode(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let mut gfx = HeadlessBackend::new();
        let err = Texture::load(&mut gfx, "/nonexistent/dirt.png").unwrap_err();
        assert!(matches!(err, GfxError::Io { ref path, .. } if path.ends_with("dirt.png")));
        assert_eq!(gfx.textures().created, 0);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        std::fs::write(&path, png_bytes(8, 8)).unwrap();

        let mut gfx = HeadlessBackend::new();
        let tex = Texture::load(&mut gfx, &path).unwrap();
        assert_eq!((tex.width(), tex.height()), (8, 8));
        assert_eq!(tex.path(), Some(path.as_path()));
        tex.dispose(&mut gfx);
        assert_eq!(gfx.live_textures(), 0);
    }

    #[test]
    fn bind_and_dispose() {
        let mut gfx = HeadlessBackend::new();
        let img = ImageData::solid(1, 1, [255; 4]).unwrap();
        let tex = Texture::create(&mut gfx, &img).unwrap();
        tex.bind(&mut gfx, 0).unwrap();
        assert_eq!(gfx.bound_texture(0), Some(tex.id()));
        tex.dispose(&mut gfx);
        assert_eq!(gfx.textures().created, gfx.textures().deleted);
        assert_eq!(gfx.bound_texture(0), None);
    }
}
