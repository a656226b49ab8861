use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::{DomainError, DomainResult, PredictionError},
    model::{ModelVariant, PredictParams},
    request::PredictionRequest,
};

/// Campos crudos del formulario multipart de `/api/predict`.
#[derive(Debug, Clone, Default)]
pub struct PredictForm {
    pub image: Option<Vec<u8>>,
    pub conf_threshold: Option<String>,
    pub iou_threshold: Option<String>,
    pub max_detections: Option<String>,
    pub model_name: Option<String>,
}

impl TryFrom<PredictForm> for PredictionRequest {
    type Error = DomainError;

    fn try_from(form: PredictForm) -> DomainResult<Self> {
        let defaults = PredictParams::default();

        let image: Option<DynamicImage> = match form.image {
            Some(bytes) if !bytes.is_empty() => Some(image::load_from_memory(&bytes)?),
            _ => None,
        };

        let params = PredictParams {
            conf_threshold: parse_field(form.conf_threshold, "conf_threshold", defaults.conf_threshold)?,
            iou_threshold: parse_field(form.iou_threshold, "iou_threshold", defaults.iou_threshold)?,
            max_detections: parse_count(form.max_detections, defaults.max_detections)?,
        };

        let model = match form.model_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse()?,
            _ => ModelVariant::default(),
        };

        Ok(PredictionRequest::new(image, params, model))
    }
}

fn parse_field(raw: Option<String>, name: &str, default: f32) -> DomainResult<f32> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| DomainError::InvalidInput(format!("{name} no es un número: {v}"))),
    }
}

// Los sliders pueden enviar "300" o "300.0".
fn parse_count(raw: Option<String>, default: usize) -> DomainResult<usize> {
    let value = parse_field(raw, "max_detections", default as f32)?;
    if value.fract() != 0.0 || value < 0.0 {
        return Err(DomainError::InvalidInput(format!(
            "max_detections debe ser entero: {value}"
        )));
    }
    Ok(value as usize)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub context: String,
    pub request_id: String,
}

impl From<&PredictionError> for ErrorResponse {
    fn from(e: &PredictionError) -> Self {
        Self {
            error: e.source.to_string(),
            context: e.context.to_string(),
            request_id: e.context.request_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}
