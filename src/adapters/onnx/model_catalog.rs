use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::onnx::yolo_pose_engine::OnnxPoseEngine;
use crate::application::ports::{ModelCatalogPort, PoseEnginePort};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ModelId, ModelVariant};

/// Catálogo de modelos ONNX en un directorio local.
pub struct OnnxModelCatalog {
    models_dir: PathBuf,
    intra_threads: usize,
}

impl OnnxModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>, intra_threads: usize) -> Self {
        Self {
            models_dir: models_dir.into(),
            intra_threads,
        }
    }

    fn check(model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        if !model.onnx_path.is_file() {
            return Err(DomainError::NotFound(format!(
                "model file not found: {}",
                model.onnx_path.display()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    fn resolve(&self, variant: ModelVariant) -> ModelId {
        variant.resolve(&self.models_dir)
    }

    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        Self::check(model)
    }

    fn load(&self, model: &ModelId) -> DomainResult<Arc<dyn PoseEnginePort>> {
        Self::check(model)?;
        let engine = OnnxPoseEngine::load(&model.onnx_path, self.intra_threads)?;
        Ok(Arc::new(engine))
    }
}
