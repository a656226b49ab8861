use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use super::errors::DomainResult;

/// Buffer renderizado con los canales en orden BGR (convención de OpenCV,
/// que es la que usa el anotador). Se guarda en un `RgbImage` para poder
/// dibujar con `imageproc`, pero el canal 0 es el azul.
#[derive(Debug, Clone)]
pub struct BgrImage(RgbImage);

impl BgrImage {
    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let mut buf = rgb.clone();
        swap_channels(&mut buf);
        Self(buf)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn canvas_mut(&mut self) -> &mut RgbImage {
        &mut self.0
    }

    pub fn get_bgr(&self, x: u32, y: u32) -> [u8; 3] {
        self.0.get_pixel(x, y).0
    }

    /// Invierte el orden de canales y devuelve una imagen RGB estándar.
    pub fn into_rgb(self) -> RgbImage {
        let mut buf = self.0;
        swap_channels(&mut buf);
        buf
    }
}

fn swap_channels(buf: &mut RgbImage) {
    for Rgb(px) in buf.pixels_mut() {
        px.swap(0, 2);
    }
}

pub fn encode_png(img: &RgbImage) -> DomainResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
