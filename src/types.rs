use serde::{Deserialize, Serialize};

/// Una lectura del equipo: marca de tiempo, distancias de los dos sensores y ancho calculado.
///
/// El ancho nunca es negativo: las lecturas negativas son un artefacto del sensor
/// y se recortan a 0 al construir la muestra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub sensor1_mm: i32,
    pub sensor2_mm: i32,
    pub width_mm: u32,
}

impl Sample {
    /// Crea una muestra recortando el ancho a >= 0
    pub fn new(timestamp_ms: i64, sensor1_mm: i32, sensor2_mm: i32, width: i64) -> Self {
        Self {
            timestamp_ms,
            sensor1_mm,
            sensor2_mm,
            width_mm: width.clamp(0, u32::MAX as i64) as u32,
        }
    }

    /// Marca de tiempo en segundos (eje temporal de la segmentación)
    pub fn time_secs(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }
}

/// Rango de índices [start, end] (ambos inclusive) de una corrida sobre el umbral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentSpan {
    pub start: usize,
    pub end: usize,
}

impl SegmentSpan {
    /// Número de muestras de la corrida (siempre >= 1)
    pub fn sample_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Huella de un neumático detectado
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub start_index: usize,
    pub end_index: usize,
    /// Ancho máximo dentro de la región
    pub peak_width: f64,
    /// Duración en segundos
    pub duration: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub center_time: f64,
}

impl Region {
    pub fn sample_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Umbral de detección por defecto
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// Encabezado del log CSV de muestras
pub const CSV_HEADER: [&str; 4] = ["Timestamp (ms)", "Sensor1 (mm)", "Sensor2 (mm)", "Width (mm)"];

/// Número de campos por línea del protocolo serie y por fila del log
pub const SAMPLE_FIELDS: usize = 4;
