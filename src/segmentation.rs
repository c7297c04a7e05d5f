//! Segmentación de la señal de anchos en corridas contiguas sobre el umbral.
//!
//! En 1-D el etiquetado de componentes conexas se reduce a agrupar corridas:
//! un único recorrido de izquierda a derecha con estado O(1).

use crate::types::SegmentSpan;

/// Devuelve las corridas máximas con `signal[i] > threshold`, en orden de índice.
///
/// Una señal vacía o sin muestras sobre el umbral produce cero corridas.
/// Una corrida de una sola muestra es válida.
pub fn segment(signal: &[f64], threshold: f64) -> Vec<SegmentSpan> {
    let mut spans = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &value) in signal.iter().enumerate() {
        let above = value > threshold;

        match (run_start, above) {
            (None, true) => run_start = Some(i),
            (Some(start), false) => {
                spans.push(SegmentSpan { start, end: i - 1 });
                run_start = None;
            }
            _ => {}
        }
    }

    // Corrida abierta al final de la señal
    if let Some(start) = run_start {
        spans.push(SegmentSpan {
            start,
            end: signal.len() - 1,
        });
    }

    spans
}
