use crate::types::Region;
use serde::Serialize;
use std::fmt;

/// Diferencia de ancho (trasero - delantero) que separa Type 1 de Type 2
pub const WIDTH_DIFFERENCE_THRESHOLD: f64 = 10.0;
/// Duración media (s) por encima de la cual el vehículo va lento / en cola
pub const SLOW_DURATION_SECS: f64 = 1.0;
/// Relación trasero/delantero que indica fuertemente Type 2
pub const WIDTH_RATIO_THRESHOLD: f64 = 1.5;

/// Aporte de confianza cuando ambos anchos son similares
pub const SIMILAR_WIDTH_CONFIDENCE: f64 = 0.7;
/// Aporte de confianza cuando el trasero es claramente más ancho
pub const WIDER_REAR_CONFIDENCE: f64 = 0.8;
/// Aporte de confianza del caso restante (trasero claramente más estrecho)
pub const FALLBACK_CONFIDENCE: f64 = 0.3;
/// Aporte de confianza de la regla de duración (ambas ramas)
pub const DURATION_CONFIDENCE: f64 = 0.2;
/// Bonificación cuando la relación de anchos confirma Type 2
pub const RATIO_AGREEMENT_BONUS: f64 = 0.1;
/// Penalización cuando la relación de anchos contradice el tipo elegido
pub const RATIO_DISAGREEMENT_PENALTY: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VehicleType {
    Unknown,
    /// `Type N`: N = 1/2 para dos ejes, N = número de neumáticos si hay más
    Type(usize),
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Unknown => write!(f, "Unknown"),
            VehicleType::Type(n) => write!(f, "Type {}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedCategory {
    /// Lento / en cola (ngantri)
    Queuing,
    Fast,
}

impl fmt::Display for SpeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedCategory::Queuing => write!(f, "Ngantri (Slow/Queuing)"),
            SpeedCategory::Fast => write!(f, "Fast"),
        }
    }
}

/// Registro completo de un vehículo de dos ejes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxleMeasurement {
    pub vehicle_type: VehicleType,
    pub speed_category: SpeedCategory,
    /// Siempre dentro de [0, 1]
    pub confidence: f64,
    pub front_width: f64,
    pub rear_width: f64,
    pub width_difference: f64,
    pub width_ratio: f64,
    pub avg_duration: f64,
    pub front_duration: f64,
    pub rear_duration: f64,
}

/// Resultado de un ciclo de clasificación
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClassificationResult {
    /// Menos de 2 neumáticos: datos insuficientes, sin confianza
    Unknown { tires: usize },
    /// Más de 2 neumáticos: solo la etiqueta `Type N`, sin puntuación
    MultiAxle { tires: usize },
    TwoAxle(AxleMeasurement),
}

impl ClassificationResult {
    pub fn vehicle_type(&self) -> VehicleType {
        match self {
            ClassificationResult::Unknown { .. } => VehicleType::Unknown,
            ClassificationResult::MultiAxle { tires } => VehicleType::Type(*tires),
            ClassificationResult::TwoAxle(m) => m.vehicle_type,
        }
    }

    /// Confianza; solo existe para vehículos de dos ejes
    pub fn confidence(&self) -> Option<f64> {
        match self {
            ClassificationResult::TwoAxle(m) => Some(m.confidence),
            _ => None,
        }
    }

    /// Número de neumáticos detectados
    pub fn tires(&self) -> usize {
        match self {
            ClassificationResult::Unknown { tires } | ClassificationResult::MultiAxle { tires } => {
                *tires
            }
            ClassificationResult::TwoAxle(_) => 2,
        }
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationResult::Unknown { tires } => write!(
                f,
                "Unknown - insufficient tire data ({} tire(s) detected)",
                tires
            ),
            ClassificationResult::MultiAxle { tires } => {
                write!(f, "{} ({} tires detected)", self.vehicle_type(), tires)
            }
            ClassificationResult::TwoAxle(m) => {
                writeln!(f, "{} - {}", m.vehicle_type, m.speed_category)?;
                writeln!(f, "  Confidence: {:.2}", m.confidence)?;
                writeln!(f, "  Front tire width: {:.2}", m.front_width)?;
                writeln!(f, "  Rear tire width: {:.2}", m.rear_width)?;
                writeln!(f, "  Width difference: {:.2}", m.width_difference)?;
                writeln!(f, "  Width ratio: {:.2}", m.width_ratio)?;
                write!(f, "  Average duration: {:.2} s", m.avg_duration)
            }
        }
    }
}

/// Clasifica un vehículo a partir de sus regiones en orden cronológico.
///
/// Nunca falla: la falta de datos es un resultado válido (`Unknown`).
pub fn classify(regions: &[Region]) -> ClassificationResult {
    match regions {
        [front, rear] => ClassificationResult::TwoAxle(classify_axle_pair(front, rear)),
        _ if regions.len() < 2 => ClassificationResult::Unknown {
            tires: regions.len(),
        },
        _ => ClassificationResult::MultiAxle {
            tires: regions.len(),
        },
    }
}

fn classify_axle_pair(front: &Region, rear: &Region) -> AxleMeasurement {
    let front_width = front.peak_width;
    let rear_width = rear.peak_width;
    let width_difference = rear_width - front_width;
    let avg_duration = (front.duration + rear.duration) / 2.0;
    let width_ratio = if front_width == 0.0 {
        1.0
    } else {
        rear_width / front_width
    };

    let mut confidence = 0.0;

    // Regla de ancho
    let vehicle_type = if width_difference.abs() < WIDTH_DIFFERENCE_THRESHOLD {
        confidence += SIMILAR_WIDTH_CONFIDENCE;
        VehicleType::Type(1)
    } else if width_difference >= WIDTH_DIFFERENCE_THRESHOLD {
        confidence += WIDER_REAR_CONFIDENCE;
        VehicleType::Type(2)
    } else {
        // width_difference <= -10: trasero más estrecho
        confidence += FALLBACK_CONFIDENCE;
        VehicleType::Type(1)
    };

    // Regla de duración
    let speed_category = if avg_duration > SLOW_DURATION_SECS {
        SpeedCategory::Queuing
    } else {
        SpeedCategory::Fast
    };
    confidence += DURATION_CONFIDENCE;

    // Validación por relación de anchos
    if width_ratio > WIDTH_RATIO_THRESHOLD {
        if vehicle_type == VehicleType::Type(2) {
            confidence += RATIO_AGREEMENT_BONUS;
        } else {
            confidence -= RATIO_DISAGREEMENT_PENALTY;
        }
    }

    AxleMeasurement {
        vehicle_type,
        speed_category,
        confidence: confidence.clamp(0.0, 1.0),
        front_width,
        rear_width,
        width_difference,
        width_ratio,
        avg_duration,
        front_duration: front.duration,
        rear_duration: rear.duration,
    }
}
