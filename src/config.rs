use crate::types::DEFAULT_THRESHOLD;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid threshold: {0} (must be a finite number)")]
    InvalidThreshold(f64),
}

/// Momento en que se dispara la clasificación una vez armado el trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Se clasifica al llegar la siguiente muestra (incluida en la sesión)
    #[default]
    NextSample,
    /// Se clasifica en el momento de armar el trigger
    Immediate,
}

/// Parámetros del detector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Umbral de detección: una muestra pertenece a un neumático si ancho > umbral
    pub threshold: f64,
    pub trigger_mode: TriggerMode,
    /// Log CSV donde se anexan todas las muestras (opcional)
    pub sample_log: Option<PathBuf>,
    /// Mostrar cada muestra recibida
    pub echo_samples: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            trigger_mode: TriggerMode::NextSample,
            sample_log: None,
            echo_samples: false,
        }
    }
}

impl DetectorConfig {
    /// Carga la configuración desde un archivo JSON; los campos ausentes toman el valor por defecto
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: DetectorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}
