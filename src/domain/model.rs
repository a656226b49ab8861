use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::errors::DomainError;

/// Variantes preentrenadas de YOLO11-pose que ofrece el formulario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    #[serde(rename = "yolo11n-pose.pt")]
    Nano,
    #[serde(rename = "yolo11s-pose.pt")]
    Small,
    #[serde(rename = "yolo11m-pose.pt")]
    Medium,
    #[serde(rename = "yolo11l-pose.pt")]
    Large,
    #[serde(rename = "yolo11x-pose.pt")]
    XLarge,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 5] = [
        ModelVariant::Nano,
        ModelVariant::Small,
        ModelVariant::Medium,
        ModelVariant::Large,
        ModelVariant::XLarge,
    ];

    /// Nombre público (el que ve el usuario en el selector).
    pub fn name(&self) -> &'static str {
        match self {
            ModelVariant::Nano => "yolo11n-pose.pt",
            ModelVariant::Small => "yolo11s-pose.pt",
            ModelVariant::Medium => "yolo11m-pose.pt",
            ModelVariant::Large => "yolo11l-pose.pt",
            ModelVariant::XLarge => "yolo11x-pose.pt",
        }
    }

    /// Fichero ONNX exportado que corresponde a la variante.
    pub fn onnx_file(&self) -> String {
        let stem = self.name().trim_end_matches(".pt");
        format!("{stem}.onnx")
    }

    pub fn resolve(&self, models_dir: &Path) -> ModelId {
        ModelId {
            variant: *self,
            onnx_path: models_dir.join(self.onnx_file()),
        }
    }
}

impl Default for ModelVariant {
    fn default() -> Self {
        ModelVariant::Nano
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelVariant {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelVariant::ALL
            .into_iter()
            .find(|v| v.name() == s.trim())
            .ok_or_else(|| DomainError::InvalidInput(format!("modelo desconocido: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelId {
    pub variant: ModelVariant,
    pub onnx_path: PathBuf, // filesystem path
}

/// Parámetros que el usuario ajusta en cada petición.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictParams {
    pub conf_threshold: f32,   // 0..1
    pub iou_threshold: f32,    // 0..1
    pub max_detections: usize, // 1..300
}

impl Default for PredictParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
}

/// Ajustes fijos de inferencia, no configurables desde el formulario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceSettings {
    pub input_size: u32, // 640 typical
    /// Media precisión. El proveedor CPU de ONNX Runtime la ignora.
    pub half: bool,
    pub show_labels: bool,
    pub show_conf: bool,
    pub device: Device,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            input_size: 640,
            half: true,
            show_labels: true,
            show_conf: true,
            device: Device::Cpu,
        }
    }
}
