//! Clasificación de vehículos por ancho de neumático.
//!
//! Las muestras del equipo se acumulan en un buffer de sesión; al disparar el
//! trigger la señal se segmenta en regiones (neumáticos), se extraen sus
//! características y se clasifica el vehículo por patrón de anchos y duración.

pub mod config;
pub mod csv_loader;
pub mod cycle;
pub mod feature_extractor;
pub mod line_decoder;
pub mod segmentation;
pub mod session_buffer;
pub mod types;
pub mod vehicle_classifier;
