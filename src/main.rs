mod adapters;
mod application;
mod config;
mod domain;

use clap::Parser;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use crate::adapters::{
    http::{router, state::HttpState},
    onnx::model_catalog::OnnxModelCatalog,
    render::annotator::Annotator,
};
use crate::application::{
    model_cache::ModelCache,
    services::{ExampleService, PredictionService},
};
use crate::config::{AppConfig, Cli};
use crate::domain::{interface::InterfaceSpec, model::InferenceSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load(&cli)?;
    tracing::info!("🔧 Configuración: {:?}", cfg);

    // 2. Adaptadores (infraestructura)
    let catalog = Arc::new(OnnxModelCatalog::new(&cfg.models_dir, cfg.intra_threads));
    let annotator = Arc::new(Annotator::load(&cfg.font_path));
    let cache = Arc::new(ModelCache::new(cfg.model_cache_capacity));

    // 3. Servicios (casos de uso)
    let prediction = Arc::new(PredictionService::new(
        catalog,
        annotator,
        cache,
        InferenceSettings::default(),
    ));
    let available = prediction.check_models().await;
    if available.is_empty() {
        tracing::warn!(
            "⚠️ No hay ningún modelo ONNX en {}; las predicciones fallarán",
            cfg.models_dir.display()
        );
    } else {
        tracing::info!("📦 Modelos disponibles: {:?}", available);
    }

    let interface = Arc::new(InterfaceSpec::pose_demo());
    let examples = Arc::new(ExampleService::new(
        interface.examples.clone(),
        cfg.examples_dir.clone(),
        prediction.clone(),
    ));

    // 4. Estado de la API y router
    let state = HttpState {
        interface,
        prediction,
        examples,
    };
    let app = router(state, cfg.max_upload_bytes).fallback_service(ServeDir::new(&cfg.static_dir));

    // 5. Lanzar el servidor
    let addr = cfg.socket_addr()?;
    tracing::info!("🚀 Servidor de pose iniciado en http://{}", addr);
    tracing::info!("📂 Archivos estáticos servidos desde {}", cfg.static_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
