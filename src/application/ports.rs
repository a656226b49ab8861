use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

use crate::domain::{
    errors::DomainResult,
    frame::BgrImage,
    model::{InferenceSettings, ModelId, ModelVariant, PredictParams},
    pose::PoseResult,
};

/// Motor de inferencia ya cargado para una variante concreta.
/// Las llamadas son bloqueantes: ejecutarlas fuera del runtime async.
pub trait PoseEnginePort: Send + Sync {
    fn predict(
        &self,
        image: &RgbImage,
        params: &PredictParams,
        settings: &InferenceSettings,
    ) -> DomainResult<Vec<PoseResult>>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    fn resolve(&self, variant: ModelVariant) -> ModelId;
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
    /// Carga bloqueante de los pesos.
    fn load(&self, model: &ModelId) -> DomainResult<Arc<dyn PoseEnginePort>>;
}

/// Dibuja un resultado sobre un buffer BGR.
pub trait RendererPort: Send + Sync {
    fn plot(&self, result: &PoseResult, settings: &InferenceSettings) -> DomainResult<BgrImage>;
}
