use crate::types::{Sample, SAMPLE_FIELDS};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty line")]
    Empty,

    #[error("Invalid field count: expected {expected}, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("Invalid number in field {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

const FIELD_NAMES: [&str; SAMPLE_FIELDS] = ["timestamp", "sensor1", "sensor2", "width"];

/// Decodifica una línea `timestamp,sensor1,sensor2,width` enviada por el equipo.
///
/// El ancho negativo se recorta a 0. Las líneas inválidas se descartan antes
/// de llegar al buffer de sesión.
pub fn decode_line(line: &str) -> Result<Sample, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::Empty);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != SAMPLE_FIELDS {
        return Err(DecodeError::FieldCount {
            expected: SAMPLE_FIELDS,
            actual: fields.len(),
        });
    }

    let mut values = [0i64; SAMPLE_FIELDS];
    for (idx, raw) in fields.iter().enumerate() {
        values[idx] = raw.parse().map_err(|_| DecodeError::InvalidNumber {
            field: FIELD_NAMES[idx],
            value: raw.to_string(),
        })?;
    }

    let sensor1 = narrow(values[1], FIELD_NAMES[1], fields[1])?;
    let sensor2 = narrow(values[2], FIELD_NAMES[2], fields[2])?;

    Ok(Sample::new(values[0], sensor1, sensor2, values[3]))
}

fn narrow(value: i64, field: &'static str, raw: &str) -> Result<i32, DecodeError> {
    i32::try_from(value).map_err(|_| DecodeError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}
