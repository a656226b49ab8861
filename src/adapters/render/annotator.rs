use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{info, warn};

use crate::application::ports::RendererPort;
use crate::domain::errors::DomainResult;
use crate::domain::frame::BgrImage;
use crate::domain::model::InferenceSettings;
use crate::domain::pose::{
    Pose, PoseResult, KPT_COLOR_INDICES, LIMB_COLOR_INDICES, POSE_PALETTE, SKELETON,
};

/// Color de caja de la clase 0 en la paleta de Ultralytics (#042AFF, RGB).
const BOX_COLOR_RGB: [u8; 3] = [0x04, 0x2A, 0xFF];
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
/// Keypoints y extremidades por debajo de esta confianza no se dibujan.
const KPT_CONF_THRESHOLD: f32 = 0.5;

/// Dibuja cajas, etiquetas, keypoints y esqueleto al estilo de Ultralytics.
/// Trabaja sobre buffers BGR.
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn load(font_path: &Path) -> Self {
        let font = std::fs::read(font_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));

        match font {
            Ok(font) => {
                info!("Fuente de etiquetas cargada desde {}", font_path.display());
                Self { font: Some(font) }
            }
            Err(e) => {
                warn!(
                    "Sin fuente para etiquetas ({}: {}); se dibujará sólo el fondo",
                    font_path.display(),
                    e
                );
                Self::without_font()
            }
        }
    }

    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn draw_pose(&self, canvas: &mut RgbImage, pose: &Pose, lw: u32, settings: &InferenceSettings) {
        let box_color = bgr(BOX_COLOR_RGB);
        let (w, h) = canvas.dimensions();

        let x1 = pose.x1.max(0.0) as i32;
        let y1 = pose.y1.max(0.0) as i32;
        let bw = ((pose.x2 - pose.x1).round() as u32).max(1);
        let bh = ((pose.y2 - pose.y1).round() as u32).max(1);
        for t in 0..lw as i32 {
            let (tw, th) = (bw.saturating_sub(2 * t as u32), bh.saturating_sub(2 * t as u32));
            if tw == 0 || th == 0 {
                break;
            }
            draw_hollow_rect_mut(canvas, Rect::at(x1 + t, y1 + t).of_size(tw, th), box_color);
        }

        if let Some(label) = label_text(pose, settings) {
            self.draw_label(canvas, &label, x1, y1, lw, box_color);
        }

        let radius = (lw as i32 + 1).max(3);
        for (i, &[a, b]) in SKELETON.iter().enumerate() {
            let (ka, kb) = (&pose.keypoints[a], &pose.keypoints[b]);
            if ka.confidence < KPT_CONF_THRESHOLD || kb.confidence < KPT_CONF_THRESHOLD {
                continue;
            }
            if !inside(ka.x, ka.y, w, h) || !inside(kb.x, kb.y, w, h) {
                continue;
            }
            let color = Rgb(POSE_PALETTE[LIMB_COLOR_INDICES[i]]);
            thick_line(canvas, (ka.x, ka.y), (kb.x, kb.y), lw, color);
        }

        for (i, kp) in pose.keypoints.iter().enumerate() {
            if kp.confidence < KPT_CONF_THRESHOLD || !inside(kp.x, kp.y, w, h) {
                continue;
            }
            let color = Rgb(POSE_PALETTE[KPT_COLOR_INDICES[i]]);
            draw_filled_circle_mut(canvas, (kp.x as i32, kp.y as i32), radius, color);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, label: &str, x: i32, y: i32, lw: u32, bg: Rgb<u8>) {
        let (img_w, img_h) = canvas.dimensions();
        let font_size = ((img_w + img_h) as f32 / 2.0 * 0.035).round().max(12.0);
        let scale = PxScale::from(font_size);

        let (tw, th) = match &self.font {
            Some(font) => text_size(scale, font, label),
            None => ((font_size * 0.6 * label.len() as f32) as u32, font_size as u32),
        };
        let pad = lw as i32;
        let bg_h = th + 2 * lw;
        // Encima de la caja si cabe, si no por dentro.
        let top = if y - bg_h as i32 >= 0 { y - bg_h as i32 } else { y };
        draw_filled_rect_mut(canvas, Rect::at(x, top).of_size(tw + 2 * lw, bg_h.max(1)), bg);

        if let Some(font) = &self.font {
            draw_text_mut(canvas, TEXT_COLOR, x + pad, top + pad, scale, font, label);
        }
    }
}

impl RendererPort for Annotator {
    fn plot(&self, result: &PoseResult, settings: &InferenceSettings) -> DomainResult<BgrImage> {
        let mut frame = BgrImage::from_rgb(&result.orig_img);
        let lw = line_width(frame.width(), frame.height());
        for pose in &result.poses {
            self.draw_pose(frame.canvas_mut(), pose, lw, settings);
        }
        Ok(frame)
    }
}

fn label_text(pose: &Pose, settings: &InferenceSettings) -> Option<String> {
    match (settings.show_labels, settings.show_conf) {
        (true, true) => Some(format!("{} {:.2}", pose.label(), pose.score)),
        (true, false) => Some(pose.label().to_string()),
        (false, true) => Some(format!("{:.2}", pose.score)),
        (false, false) => None,
    }
}

fn line_width(w: u32, h: u32) -> u32 {
    (((w + h) as f32 / 2.0 * 0.003).round() as u32).max(2)
}

fn bgr([r, g, b]: [u8; 3]) -> Rgb<u8> {
    Rgb([b, g, r])
}

fn inside(x: f32, y: f32, w: u32, h: u32) -> bool {
    x > 0.0 && y > 0.0 && x < w as f32 && y < h as f32
}

fn thick_line(canvas: &mut RgbImage, a: (f32, f32), b: (f32, f32), width: u32, color: Rgb<u8>) {
    let half = width as f32 / 2.0;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
    // Normal unitaria al segmento.
    let (nx, ny) = (-dy / len, dx / len);
    let steps = width.max(1);
    for s in 0..steps {
        let off = -half + s as f32 + 0.5;
        draw_line_segment_mut(
            canvas,
            (a.0 + nx * off, a.1 + ny * off),
            (b.0 + nx * off, b.1 + ny * off),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pose::{Keypoint, NUM_KEYPOINTS};

    fn person(conf: f32) -> Pose {
        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            *kp = Keypoint::new(50.0, 20.0 + i as f32 * 4.0, conf);
        }
        Pose {
            x1: 30.0,
            y1: 40.0,
            x2: 70.0,
            y2: 100.0,
            score: 0.87,
            class_id: 0,
            keypoints,
        }
    }

    fn result(poses: Vec<Pose>) -> PoseResult {
        PoseResult {
            orig_img: RgbImage::from_pixel(120, 110, Rgb([0, 0, 0])),
            poses,
            infer_ms: 0.0,
        }
    }

    #[test]
    fn plot_keeps_dimensions_and_draws() {
        let plotted = Annotator::without_font()
            .plot(&result(vec![person(0.9)]), &InferenceSettings::default())
            .unwrap();
        assert_eq!((plotted.width(), plotted.height()), (120, 110));

        // Borde izquierdo de la caja, en BGR.
        assert_eq!(plotted.get_bgr(30, 70), [0xFF, 0x2A, 0x04]);
        let rgb = plotted.into_rgb();
        assert_eq!(*rgb.get_pixel(30, 70), Rgb(BOX_COLOR_RGB));
    }

    #[test]
    fn low_confidence_keypoints_are_skipped() {
        let settings = InferenceSettings {
            show_labels: false,
            show_conf: false,
            ..Default::default()
        };
        let plotted = Annotator::without_font()
            .plot(&result(vec![person(0.1)]), &settings)
            .unwrap();
        // El primer keypoint (50, 20) cae fuera de la caja.
        assert_eq!(plotted.get_bgr(50, 20), [0, 0, 0]);

        let plotted = Annotator::without_font()
            .plot(&result(vec![person(0.9)]), &settings)
            .unwrap();
        assert_ne!(plotted.get_bgr(50, 20), [0, 0, 0]);
    }

    #[test]
    fn legs_are_orange_and_arms_blue_in_rgb_output() {
        let mut pose = person(0.0);
        pose.x1 = 100.0;
        pose.y1 = 5.0;
        pose.x2 = 115.0;
        pose.y2 = 15.0;
        // Rodilla -> tobillo izquierdos en x=20, codo -> muñeca izquierdos en x=80.
        pose.keypoints[13] = Keypoint::new(20.0, 60.0, 0.9);
        pose.keypoints[15] = Keypoint::new(20.0, 90.0, 0.9);
        pose.keypoints[7] = Keypoint::new(80.0, 40.0, 0.9);
        pose.keypoints[9] = Keypoint::new(80.0, 70.0, 0.9);
        let settings = InferenceSettings {
            show_labels: false,
            show_conf: false,
            ..Default::default()
        };

        let rgb = Annotator::without_font()
            .plot(&result(vec![pose]), &settings)
            .unwrap()
            .into_rgb();

        let orange = Rgb([255, 153, 51]);
        let blue = Rgb([0, 128, 255]);
        let leg: Vec<Rgb<u8>> = (16..25).map(|x| *rgb.get_pixel(x, 75)).collect();
        let arm: Vec<Rgb<u8>> = (76..85).map(|x| *rgb.get_pixel(x, 55)).collect();
        assert!(leg.contains(&orange), "pierna: {leg:?}");
        assert!(!leg.contains(&blue));
        assert!(arm.contains(&blue), "brazo: {arm:?}");
        assert!(!arm.contains(&orange));
    }

    #[test]
    fn no_poses_leaves_image_untouched() {
        let plotted = Annotator::without_font()
            .plot(&result(vec![]), &InferenceSettings::default())
            .unwrap();
        assert!(plotted.into_rgb().pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn label_honours_overlay_flags() {
        let pose = person(0.9);
        let mut settings = InferenceSettings::default();
        assert_eq!(label_text(&pose, &settings).as_deref(), Some("person 0.87"));
        settings.show_conf = false;
        assert_eq!(label_text(&pose, &settings).as_deref(), Some("person"));
        settings.show_labels = false;
        assert_eq!(label_text(&pose, &settings), None);
    }

    #[test]
    fn missing_font_falls_back() {
        let annotator = Annotator::load(Path::new("/nonexistent/font.ttf"));
        assert!(!annotator.has_font());
    }

    #[test]
    fn line_width_scales_with_image() {
        assert_eq!(line_width(100, 100), 2);
        assert_eq!(line_width(1280, 720), 3);
    }
}
