use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use parking_lot::Mutex;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::postprocess::decode_poses;
use super::preprocess::letterbox;
use crate::application::ports::PoseEnginePort;
use crate::domain::errors::DomainResult;
use crate::domain::model::{InferenceSettings, PredictParams};
use crate::domain::pose::{Pose, PoseResult};

/// Sesión de ONNX Runtime para un modelo YOLO11-pose exportado.
pub struct OnnxPoseEngine {
    session: Mutex<Session>,
}

impl OnnxPoseEngine {
    pub fn load(path: &Path, intra_threads: usize) -> Result<Self> {
        // Sólo CPU: la demo no depende de GPU.
        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .commit_from_file(path)
            .with_context(|| format!("no se pudo cargar {}", path.display()))?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }

    pub fn infer(&self, rgb: &RgbImage, params: &PredictParams, settings: &InferenceSettings) -> Result<Vec<Pose>> {
        let (input, lb) = letterbox(rgb, settings.input_size);

        let imgsz = settings.input_size as i64;
        let input_shape = vec![1, 3, imgsz, imgsz];
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, data))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])?;
        let output = outputs[0].try_extract_array::<f32>()?;

        // (1, 56, N) -> (56, N)
        let view = output.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
        decode_poses(view, &lb, params)
    }
}

impl PoseEnginePort for OnnxPoseEngine {
    fn predict(
        &self,
        image: &RgbImage,
        params: &PredictParams,
        settings: &InferenceSettings,
    ) -> DomainResult<Vec<PoseResult>> {
        let start = Instant::now();
        let poses = self.infer(image, params, settings)?;
        let infer_ms = start.elapsed().as_secs_f32() * 1000.0;
        debug!("Inferencia: {} poses en {:.1} ms", poses.len(), infer_ms);

        Ok(vec![PoseResult {
            orig_img: image.clone(),
            poses,
            infer_ms,
        }])
    }
}
