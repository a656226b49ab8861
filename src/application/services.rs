use image::RgbImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    application::{
        model_cache::ModelCache,
        ports::{ModelCatalogPort, RendererPort},
    },
    domain::{
        errors::{DomainError, DomainResult, ExecutionContext, PredictionError},
        frame::encode_png,
        interface::ExampleRow,
        model::{InferenceSettings, ModelVariant},
        pose::PoseResult,
        request::PredictionRequest,
    },
};

/// Manejador de predicción: petición del formulario -> imagen anotada.
#[derive(Clone)]
pub struct PredictionService {
    catalog: Arc<dyn ModelCatalogPort>,
    renderer: Arc<dyn RendererPort>,
    cache: Arc<ModelCache>,
    settings: InferenceSettings,
}

impl PredictionService {
    pub fn new(
        catalog: Arc<dyn ModelCatalogPort>,
        renderer: Arc<dyn RendererPort>,
        cache: Arc<ModelCache>,
        settings: InferenceSettings,
    ) -> Self {
        Self {
            catalog,
            renderer,
            cache,
            settings,
        }
    }

    /// Comprueba al arrancar qué variantes tienen pesos disponibles.
    pub async fn check_models(&self) -> Vec<ModelVariant> {
        let mut available = Vec::new();
        for variant in ModelVariant::ALL {
            let model = self.catalog.resolve(variant);
            match self.catalog.validate_model(&model).await {
                Ok(()) => available.push(variant),
                Err(e) => warn!("Modelo {} no disponible: {}", variant, e),
            }
        }
        available
    }

    /// Ejecuta la predicción en el pool bloqueante de Tokio.
    pub async fn predict(&self, request: PredictionRequest) -> Result<RgbImage, PredictionError> {
        let svc = self.clone();
        let ctx = ExecutionContext::new("predict_pose").with_model(request.model.name());
        let task_ctx = ctx.clone();

        match tokio::task::spawn_blocking(move || svc.predict_blocking(request, task_ctx)).await {
            Ok(res) => res,
            Err(join) => Err(ctx.fail(DomainError::OperationFailed(format!(
                "tarea de inferencia abortada: {join}"
            )))),
        }
    }

    /// Versión síncrona. Cualquier fallo sale envuelto una sola vez en
    /// `PredictionError`; nunca se devuelve un resultado parcial.
    pub fn predict_blocking(
        &self,
        request: PredictionRequest,
        ctx: ExecutionContext,
    ) -> Result<RgbImage, PredictionError> {
        match self.run(&request) {
            Ok(img) => {
                info!("Pose estimated successfully.");
                debug!(
                    request = %ctx.request_id,
                    model = %request.model,
                    elapsed_ms = ctx.elapsed_ms() as u64,
                    "predicción completada"
                );
                Ok(img)
            }
            Err(e) => Err(ctx.fail(e)),
        }
    }

    fn run(&self, request: &PredictionRequest) -> DomainResult<RgbImage> {
        let image = request.validate()?.to_rgb8();

        let engine = self.cache.get_or_load(request.model, || {
            let model = self.catalog.resolve(request.model);
            info!("Cargando modelo {} desde {}", model.variant, model.onnx_path.display());
            self.catalog.load(&model)
        })?;

        let results = engine.predict(&image, &request.params, &self.settings)?;
        let result = exactly_one(results)?;
        debug!("{} ({:.1} ms)", result.summary(), result.infer_ms);

        let plotted = self.renderer.plot(&result, &self.settings)?;
        Ok(plotted.into_rgb())
    }
}

fn exactly_one(results: Vec<PoseResult>) -> DomainResult<PoseResult> {
    let count = results.len();
    let mut iter = results.into_iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Ok(only),
        _ => Err(DomainError::UnexpectedResultCount(count)),
    }
}

/// Salidas de los ejemplos, calculadas la primera vez que se piden
/// y guardadas (PNG) para el resto del proceso.
pub struct ExampleService {
    rows: Vec<ExampleRow>,
    base_dir: PathBuf,
    prediction: Arc<PredictionService>,
    outputs: HashMap<usize, OnceCell<Arc<Vec<u8>>>>,
}

impl ExampleService {
    pub fn new(rows: Vec<ExampleRow>, base_dir: PathBuf, prediction: Arc<PredictionService>) -> Self {
        let outputs = (0..rows.len()).map(|i| (i, OnceCell::new())).collect();
        Self {
            rows,
            base_dir,
            prediction,
            outputs,
        }
    }

    pub fn is_cached(&self, index: usize) -> bool {
        self.outputs
            .get(&index)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    pub async fn output(&self, index: usize) -> Result<Arc<Vec<u8>>, PredictionError> {
        let ctx = ExecutionContext::new("example_output");
        let (Some(row), Some(cell)) = (self.rows.get(index), self.outputs.get(&index)) else {
            return Err(ctx.fail(DomainError::NotFound(format!("ejemplo {index}"))));
        };

        let png = cell
            .get_or_try_init(|| async {
                let ctx = ctx.clone().with_model(row.model.name());
                let path = self.base_dir.join(&row.image_path);
                let image = image::open(&path).map_err(|e| {
                    ctx.fail(DomainError::NotFound(format!("{}: {e}", path.display())))
                })?;

                let request = PredictionRequest::new(Some(image), row.params(), row.model);
                let annotated = self.prediction.predict(request).await?;
                let png = encode_png(&annotated).map_err(|e| ctx.fail(e))?;
                info!("Ejemplo {} cacheado ({} bytes)", index, png.len());
                Ok::<_, PredictionError>(Arc::new(png))
            })
            .await?;

        Ok(png.clone())
    }
}
