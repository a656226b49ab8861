use image::DynamicImage;

use super::errors::{DomainError, DomainResult};
use super::model::{ModelVariant, PredictParams};

pub const CONF_RANGE: (f32, f32) = (0.0, 1.0);
pub const IOU_RANGE: (f32, f32) = (0.0, 1.0);
pub const MAX_DET_RANGE: (usize, usize) = (1, 300);

/// Una petición del formulario. Se crea por envío y no se persiste.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub image: Option<DynamicImage>,
    pub params: PredictParams,
    pub model: ModelVariant,
}

impl PredictionRequest {
    pub fn new(image: Option<DynamicImage>, params: PredictParams, model: ModelVariant) -> Self {
        Self { image, params, model }
    }

    /// Comprueba rangos e imagen. Devuelve la imagen si todo es válido.
    pub fn validate(&self) -> DomainResult<&DynamicImage> {
        let p = &self.params;
        if !in_range(p.conf_threshold, CONF_RANGE) {
            return Err(DomainError::InvalidInput(format!(
                "conf_threshold fuera de rango: {}",
                p.conf_threshold
            )));
        }
        if !in_range(p.iou_threshold, IOU_RANGE) {
            return Err(DomainError::InvalidInput(format!(
                "iou_threshold fuera de rango: {}",
                p.iou_threshold
            )));
        }
        if !(MAX_DET_RANGE.0..=MAX_DET_RANGE.1).contains(&p.max_detections) {
            return Err(DomainError::InvalidInput(format!(
                "max_detections fuera de rango: {}",
                p.max_detections
            )));
        }

        let image = self.image.as_ref().ok_or(DomainError::MissingImage)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(DomainError::InvalidInput("imagen vacía".into()));
        }
        Ok(image)
    }
}

fn in_range(v: f32, (lo, hi): (f32, f32)) -> bool {
    v.is_finite() && v >= lo && v <= hi
}
