use std::sync::Arc;

use crate::application::services::{ExampleService, PredictionService};
use crate::domain::interface::InterfaceSpec;

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Declaración del formulario (campos, ejemplos, textos).
    pub interface: Arc<InterfaceSpec>,
    /// Manejador de predicción.
    pub prediction: Arc<PredictionService>,
    /// Salidas cacheadas de los ejemplos.
    pub examples: Arc<ExampleService>,
}
