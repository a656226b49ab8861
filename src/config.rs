use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichero TOML de configuración (opcional).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dirección de escucha, p. ej. 0.0.0.0:7860
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directorio con los `yolo11*-pose.onnx`
    #[arg(short, long)]
    pub models_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub bind_addr: String,
    pub models_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Raíz desde la que se resuelven las rutas de los ejemplos.
    pub examples_dir: PathBuf,
    pub font_path: PathBuf,
    pub model_cache_capacity: usize,
    pub intra_threads: usize,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7860".into(),
            models_dir: "models".into(),
            static_dir: "static".into(),
            examples_dir: ".".into(),
            font_path: "assets/Arial.ttf".into(),
            model_cache_capacity: 2,
            intra_threads: 4,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("configuración inválida en {}", path.display()))
    }

    /// Fichero (si lo hay) + flags de línea de comandos, y validación.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        if let Some(bind) = &cli.bind {
            cfg.bind_addr = bind.clone();
        }
        if let Some(dir) = &cli.models_dir {
            cfg.models_dir = dir.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.model_cache_capacity == 0 {
            bail!("model_cache_capacity debe ser >= 1");
        }
        if self.intra_threads == 0 {
            bail!("intra_threads debe ser >= 1");
        }
        if self.max_upload_bytes == 0 {
            bail!("max_upload_bytes debe ser > 0");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("bind_addr inválida: {}", self.bind_addr))
    }
}
