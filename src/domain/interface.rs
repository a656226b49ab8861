use serde::{Deserialize, Serialize};

use super::model::{ModelVariant, PredictParams};
use super::request::{CONF_RANGE, IOU_RANGE, MAX_DET_RANGE};

/// Campo de entrada del formulario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputField {
    Image {
        name: String,
        label: String,
    },
    Slider {
        name: String,
        label: String,
        minimum: f64,
        maximum: f64,
        step: f64,
        value: f64,
    },
    Radio {
        name: String,
        label: String,
        choices: Vec<String>,
        value: String,
    },
}

impl InputField {
    pub fn name(&self) -> &str {
        match self {
            InputField::Image { name, .. }
            | InputField::Slider { name, .. }
            | InputField::Radio { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputField {
    pub kind: String,
    pub label: String,
}

/// Fila de ejemplo que precarga el formulario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleRow {
    pub image_path: String,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub model: ModelVariant,
}

impl ExampleRow {
    fn new(image_path: &str, model: ModelVariant) -> Self {
        let defaults = PredictParams::default();
        Self {
            image_path: image_path.to_string(),
            conf_threshold: defaults.conf_threshold,
            iou_threshold: defaults.iou_threshold,
            max_detections: defaults.max_detections,
            model,
        }
    }

    pub fn params(&self) -> PredictParams {
        PredictParams {
            conf_threshold: self.conf_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Las salidas de ejemplo se calculan la primera vez que se piden.
    Lazy,
}

/// Declaración completa del formulario que sirve la API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    pub title: String,
    pub description: String,
    pub article: String,
    pub inputs: Vec<InputField>,
    pub output: OutputField,
    pub examples: Vec<ExampleRow>,
    pub cache_examples: bool,
    pub cache_mode: CacheMode,
    pub flagging_mode: String,
    pub submit_url: String,
}

impl InterfaceSpec {
    pub fn pose_demo() -> Self {
        let defaults = PredictParams::default();
        let inputs = vec![
            InputField::Image {
                name: "image".into(),
                label: "Image".into(),
            },
            InputField::Slider {
                name: "conf_threshold".into(),
                label: "Confidence threshold".into(),
                minimum: CONF_RANGE.0 as f64,
                maximum: CONF_RANGE.1 as f64,
                step: 0.01,
                value: defaults.conf_threshold as f64,
            },
            InputField::Slider {
                name: "iou_threshold".into(),
                label: "IoU threshold".into(),
                minimum: IOU_RANGE.0 as f64,
                maximum: IOU_RANGE.1 as f64,
                step: 0.01,
                value: defaults.iou_threshold as f64,
            },
            InputField::Slider {
                name: "max_detections".into(),
                label: "Max detections".into(),
                minimum: MAX_DET_RANGE.0 as f64,
                maximum: MAX_DET_RANGE.1 as f64,
                step: 1.0,
                value: defaults.max_detections as f64,
            },
            InputField::Radio {
                name: "model_name".into(),
                label: "Model name".into(),
                choices: ModelVariant::ALL.iter().map(|v| v.name().to_string()).collect(),
                value: ModelVariant::default().name().to_string(),
            },
        ];

        let examples = vec![
            ExampleRow::new("images/posing-sample-image3.jpg", ModelVariant::Nano),
            ExampleRow::new("images/posing-sample-image4.jpg", ModelVariant::Small),
            ExampleRow::new("images/posing-sample-image5.jpg", ModelVariant::Medium),
            ExampleRow::new("images/posing-sample-image1.jpg", ModelVariant::Large),
            ExampleRow::new("images/posing-sample-image2.png", ModelVariant::XLarge),
        ];

        Self {
            title: "YOLO11 Pose Estimation".into(),
            description: "Demo for the YOLO11 Pose Estimation model. This model can detect and \
                predict the poses of people in images. To use it, upload your image, select \
                associated parameters, or use the default values, click 'Submit', or click one \
                of the examples to load them. You can read more at the links below."
                .into(),
            article: "<p style='text-align: center'><a href='https://github.com/ultralytics/ultralytics' \
                target='_blank'>Ultralytics GitHub</a> | <a href='https://docs.ultralytics.com/models/yolo11/' \
                target='_blank'>Model Page</a></p>"
                .into(),
            inputs,
            output: OutputField {
                kind: "image".into(),
                label: "Output Image".into(),
            },
            examples,
            cache_examples: true,
            cache_mode: CacheMode::Lazy,
            flagging_mode: "never".into(),
            submit_url: "/api/predict".into(),
        }
    }
}
