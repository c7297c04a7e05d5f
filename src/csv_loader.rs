use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, Writer, WriterBuilder};

use crate::types::{Sample, CSV_HEADER, SAMPLE_FIELDS};

/// Log CSV de muestras en modo append.
/// Formato por fila: timestamp_ms,sensor1_mm,sensor2_mm,width_mm
pub struct SampleLog {
    path: PathBuf,
    writer: Writer<File>,
}

impl SampleLog {
    /// Abre (o crea) el log. El encabezado solo se escribe si el archivo es nuevo o está vacío.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("No se pudo abrir el log {:?}", path))?;

        let is_empty = file
            .metadata()
            .with_context(|| format!("No se pudo leer metadata de {:?}", path))?
            .len()
            == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_empty {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        Ok(Self { path, writer })
    }

    /// Anexa una muestra y vacía el buffer de escritura
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        self.writer
            .serialize(sample)
            .with_context(|| format!("No se pudo escribir en {:?}", self.path))?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Carga todas las muestras de un log CSV (con encabezado)
pub fn load_samples_from_csv(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    let mut samples = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.with_context(|| format!("Fila {} inválida en {:?}", row, path))?;
        if record.len() < SAMPLE_FIELDS {
            bail!("La fila {} no tiene {} columnas", row, SAMPLE_FIELDS);
        }

        let timestamp: i64 = record[0]
            .parse()
            .with_context(|| format!("timestamp inválido en fila {}", row))?;
        let sensor1: i32 = record[1]
            .parse()
            .with_context(|| format!("sensor1 inválido en fila {}", row))?;
        let sensor2: i32 = record[2]
            .parse()
            .with_context(|| format!("sensor2 inválido en fila {}", row))?;
        let width: i64 = record[3]
            .parse()
            .with_context(|| format!("width inválido en fila {}", row))?;

        samples.push(Sample::new(timestamp, sensor1, sensor2, width));
    }

    if samples.is_empty() {
        return Err(anyhow!("El CSV {:?} no contiene datos", path));
    }

    Ok(samples)
}
