use crate::types::{Sample, CSV_HEADER};

/// Buffer de sesión: acumula todas las muestras desde el último reinicio.
///
/// A diferencia de la ventana del gráfico en vivo no tiene capacidad máxima;
/// la clasificación necesita cada muestra de la sesión.
#[derive(Debug, Default)]
pub struct SessionBuffer {
    samples: Vec<Sample>,
}

impl SessionBuffer {
    /// Crea un buffer vacío
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Añade una muestra (el ancho ya viene recortado por `Sample::new`)
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Obtiene el número de muestras acumuladas
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Extrae todas las muestras y deja el buffer vacío en un solo paso.
    /// La clasificación trabaja sobre este snapshot.
    pub fn take_snapshot(&mut self) -> Vec<Sample> {
        std::mem::take(&mut self.samples)
    }

    /// Exporta el buffer completo a CSV (mismo formato que el log de muestras)
    pub fn to_csv(&self) -> String {
        let mut csv = CSV_HEADER.join(",");
        csv.push('\n');

        for sample in &self.samples {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                sample.timestamp_ms, sample.sensor1_mm, sample.sensor2_mm, sample.width_mm
            ));
        }

        csv
    }
}

/// Anchos de una secuencia de muestras
pub fn widths_of(samples: &[Sample]) -> Vec<f64> {
    samples.iter().map(|s| s.width_mm as f64).collect()
}

/// Eje temporal (segundos) de una secuencia de muestras
pub fn time_axis_of(samples: &[Sample]) -> Vec<f64> {
    samples.iter().map(Sample::time_secs).collect()
}
