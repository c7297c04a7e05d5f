use crate::types::{Region, SegmentSpan};

/// Intervalo de muestreo estimado como `t[1] - t[0]`.
///
/// Supone muestreo uniforme: con muestreo irregular la duración de todas las
/// regiones queda sesgada. Con menos de dos instantes no hay intervalo y se
/// devuelve 0.
pub fn sample_interval(time_axis: &[f64]) -> f64 {
    match time_axis {
        [t0, t1, ..] => t1 - t0,
        _ => 0.0,
    }
}

/// Calcula las características de una corrida.
///
/// El ancho reportado es el máximo de la región (el sensor ve la sección más
/// ancha en el centro del neumático), no la media.
///
/// `signal` y `time_axis` deben tener la misma longitud y `span` debe caer
/// dentro de ambos; en caso contrario la función entra en pánico.
pub fn extract(signal: &[f64], time_axis: &[f64], span: SegmentSpan) -> Region {
    extract_with_interval(signal, time_axis, span, sample_interval(time_axis))
}

/// Extrae todas las regiones y las ordena cronológicamente por `center_time`
/// (neumático delantero primero). El intervalo se estima una sola vez.
/// Mismas precondiciones que `extract`.
pub fn extract_regions(signal: &[f64], time_axis: &[f64], spans: &[SegmentSpan]) -> Vec<Region> {
    let interval = sample_interval(time_axis);

    let mut regions: Vec<Region> = spans
        .iter()
        .map(|&span| extract_with_interval(signal, time_axis, span, interval))
        .collect();

    regions.sort_by(|a, b| a.center_time.total_cmp(&b.center_time));
    regions
}

fn extract_with_interval(
    signal: &[f64],
    time_axis: &[f64],
    span: SegmentSpan,
    interval: f64,
) -> Region {
    debug_assert_eq!(signal.len(), time_axis.len());
    let values = &signal[span.start..=span.end];
    let times = &time_axis[span.start..=span.end];

    Region {
        start_index: span.start,
        end_index: span.end,
        peak_width: max(values),
        duration: span.sample_count() as f64 * interval,
        start_time: time_axis[span.start],
        end_time: time_axis[span.end],
        center_time: mean(times),
    }
}

// ========== Funciones estadísticas ==========

fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

fn max(data: &[f64]) -> f64 {
    data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
}
