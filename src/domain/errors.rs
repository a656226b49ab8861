use std::fmt;
use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Por favor, proporciona una imagen.")]
    MissingImage,
    #[error("Se esperaba exactamente un resultado de inferencia, se obtuvieron {0}")]
    UnexpectedResultCount(usize),
    #[error("Imagen no soportada: {0}")]
    Image(#[from] image::ImageError),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

impl DomainError {
    /// Errores atribuibles a la petición del usuario (y no al servidor).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidInput(_) | DomainError::MissingImage | DomainError::Image(_)
        )
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        DomainError::OperationFailed(format!("{e:#}"))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Descriptor de la ejecución en la que se produjo un fallo.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub operation: &'static str,
    pub request_id: Uuid,
    pub model: Option<String>,
    started: Instant,
}

impl ExecutionContext {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            request_id: Uuid::new_v4(),
            model: None,
            started: Instant::now(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Envuelve `source` con este contexto.
    pub fn fail(&self, source: impl Into<DomainError>) -> PredictionError {
        PredictionError {
            context: self.clone(),
            source: source.into(),
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[request={}", self.operation, self.request_id)?;
        if let Some(model) = &self.model {
            write!(f, ", model={model}")?;
        }
        write!(f, ", {} ms]", self.elapsed_ms())
    }
}

/// Único tipo de error que sale del manejador de predicción:
/// la causa original más el contexto de ejecución.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct PredictionError {
    pub context: ExecutionContext,
    pub source: DomainError,
}
