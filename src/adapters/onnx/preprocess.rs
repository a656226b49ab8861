//! Preprocesado "letterbox" para YOLO: escalar conservando la proporción,
//! rellenar con gris y normalizar a [0, 1] en formato NCHW.

use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

/// Valor de relleno de Ultralytics.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Transformación aplicada a la imagen original; sirve para deshacerla.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl Letterbox {
    pub fn new(orig_width: u32, orig_height: u32, input_size: u32) -> Self {
        let scale = (input_size as f32 / orig_width as f32).min(input_size as f32 / orig_height as f32);
        let (new_w, new_h) = scaled_dims(orig_width, orig_height, scale);
        Self {
            scale,
            pad_x: (input_size.saturating_sub(new_w) / 2) as f32,
            pad_y: (input_size.saturating_sub(new_h) / 2) as f32,
            orig_width,
            orig_height,
        }
    }

    /// Sin escala ni relleno: las coordenadas del modelo ya son las originales.
    pub fn identity(orig_width: u32, orig_height: u32) -> Self {
        Self {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            orig_width,
            orig_height,
        }
    }

    /// Coordenadas del tensor -> píxeles de la imagen original (recortados).
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let ox = ((x - self.pad_x) / self.scale).clamp(0.0, self.orig_width as f32);
        let oy = ((y - self.pad_y) / self.scale).clamp(0.0, self.orig_height as f32);
        (ox, oy)
    }
}

fn scaled_dims(w: u32, h: u32, scale: f32) -> (u32, u32) {
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    (new_w, new_h)
}

pub fn letterbox(rgb: &RgbImage, input_size: u32) -> (Array4<f32>, Letterbox) {
    let lb = Letterbox::new(rgb.width(), rgb.height(), input_size);
    let (new_w, new_h) = scaled_dims(rgb.width(), rgb.height(), lb.scale);
    let (new_w, new_h) = (new_w.min(input_size), new_h.min(input_size));
    let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

    let size = input_size as usize;
    let mut input = Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
    let (ox, oy) = (lb.pad_x as usize, lb.pad_y as usize);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize + ox, y as usize + oy);
        input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }

    (input, lb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn landscape_is_padded_vertically() {
        let lb = Letterbox::new(1280, 720, 640);
        assert!((lb.scale - 0.5).abs() < 1e-6);
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 140.0);
    }

    #[test]
    fn portrait_is_padded_horizontally() {
        let lb = Letterbox::new(300, 600, 640);
        assert_eq!(lb.pad_y, 0.0);
        assert_eq!(lb.pad_x, 160.0);
    }

    #[test]
    fn round_trips_model_coordinates() {
        let lb = Letterbox::new(1280, 720, 640);
        let (x, y) = lb.to_original(320.0, 140.0 + 180.0);
        assert!((x - 640.0).abs() < 1e-3);
        assert!((y - 360.0).abs() < 1e-3);
        // Fuera de la imagen se recorta.
        assert_eq!(lb.to_original(-50.0, 1000.0), (0.0, 720.0));
    }

    #[test]
    fn tensor_has_padding_and_normalized_pixels() {
        let img = RgbImage::from_pixel(64, 32, Rgb([255, 0, 51]));
        let (tensor, lb) = letterbox(&img, 64);
        assert_eq!(tensor.shape(), &[1, 3, 64, 64]);
        assert_eq!(lb.pad_y, 16.0);

        assert!((tensor[[0, 0, 0, 0]] - PAD_VALUE).abs() < 1e-6);
        assert!((tensor[[0, 0, 32, 10]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 32, 10]].abs() < 1e-6);
        assert!((tensor[[0, 2, 32, 10]] - 0.2).abs() < 1e-6);
    }
}
