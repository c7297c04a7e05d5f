use crossbeam_channel::Receiver;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{DetectorConfig, TriggerMode};
use crate::feature_extractor::extract_regions;
use crate::segmentation::segment;
use crate::session_buffer::{time_axis_of, widths_of, SessionBuffer};
use crate::types::{Region, Sample};
use crate::vehicle_classifier::{classify, ClassificationResult};

/// Lo que recibe el callback al completar un ciclo
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Número de ciclo (empieza en 1)
    pub cycle: u64,
    /// Muestras presentes en el snapshot clasificado
    pub sample_count: usize,
    pub threshold: f64,
    /// Regiones en orden cronológico, para el gráfico
    pub regions: Vec<Region>,
    pub result: ClassificationResult,
}

/// Estados visibles del controlador.
/// Armado y reporte se ejecutan en un único paso síncrono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Acumulando muestras
    Collecting,
    /// Trigger armado, se clasifica en la siguiente muestra
    Armed,
}

/// Mensajes del lazo de sesión: muestras y trigger comparten la misma cola
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Sample(Sample),
    Trigger,
    /// La fuente de muestras terminó (EOF o error de lectura)
    EndOfInput,
    Shutdown,
}

/// Controlador de ciclo: dueño del buffer de sesión y del trigger
pub struct CycleController {
    config: DetectorConfig,
    buffer: SessionBuffer,
    armed: bool,
    /// Sin más muestras: un trigger ya no puede esperar a la siguiente
    input_closed: bool,
    cycles: u64,

    /// Callback que se ejecuta al completar cada clasificación
    callback: Option<Box<dyn FnMut(&CycleReport) + Send>>,
}

impl CycleController {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            buffer: SessionBuffer::new(),
            armed: false,
            input_closed: false,
            cycles: 0,
            callback: None,
        }
    }

    /// Establece el callback que recibe cada resultado de clasificación
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&CycleReport) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Añade una muestra; si el trigger está armado clasifica la sesión
    /// (incluida esta muestra) y la reinicia.
    pub fn append_sample(
        &mut self,
        timestamp_ms: i64,
        sensor1_mm: i32,
        sensor2_mm: i32,
        width: i64,
    ) -> Option<CycleReport> {
        self.push_sample(Sample::new(timestamp_ms, sensor1_mm, sensor2_mm, width))
    }

    /// Igual que `append_sample` con una muestra ya validada
    pub fn push_sample(&mut self, sample: Sample) -> Option<CycleReport> {
        self.buffer.push(sample);

        if self.armed {
            Some(self.run_cycle())
        } else {
            None
        }
    }

    /// Solicita una clasificación. Armar dos veces en el mismo ciclo no tiene efecto extra.
    /// Si la entrada ya terminó se clasifica en el acto.
    pub fn arm_trigger(&mut self) -> Option<CycleReport> {
        match self.config.trigger_mode {
            TriggerMode::Immediate => Some(self.run_cycle()),
            TriggerMode::NextSample if self.input_closed => Some(self.run_cycle()),
            TriggerMode::NextSample => {
                if !self.armed {
                    debug!("Trigger armado ({} muestras en sesión)", self.buffer.len());
                }
                self.armed = true;
                None
            }
        }
    }

    /// Ejecuta el ciclo completo sobre el contenido actual del buffer:
    /// snapshot y limpieza → segmentación → características → clasificación.
    pub fn run_cycle(&mut self) -> CycleReport {
        let snapshot = self.buffer.take_snapshot();
        self.armed = false;
        self.cycles += 1;

        let report = classify_samples(&snapshot, self.config.threshold, self.cycles);

        info!(
            "Ciclo {}: {} muestras, {} neumático(s) → {}",
            report.cycle,
            report.sample_count,
            report.regions.len(),
            report.result.vehicle_type()
        );

        if let Some(ref mut callback) = self.callback {
            callback(&report);
        }

        report
    }

    pub fn state(&self) -> ControllerState {
        if self.armed {
            ControllerState::Armed
        } else {
            ControllerState::Collecting
        }
    }

    pub fn buffer(&self) -> &SessionBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles
    }

    /// Marca el fin de la entrada; un trigger armado se dispara ahora
    pub fn close_input(&mut self) -> Option<CycleReport> {
        self.input_closed = true;
        self.flush_armed()
    }

    /// Ejecuta el ciclo pendiente si el trigger quedó armado
    pub fn flush_armed(&mut self) -> Option<CycleReport> {
        if self.armed {
            Some(self.run_cycle())
        } else {
            None
        }
    }

    /// Procesa un mensaje del lazo de sesión.
    /// Devuelve `false` cuando se pide terminar.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Sample(sample) => {
                self.push_sample(sample);
                true
            }
            SessionEvent::Trigger => {
                self.arm_trigger();
                true
            }
            SessionEvent::EndOfInput => {
                info!("Fin de la entrada ({} muestras en sesión)", self.buffer.len());
                self.close_input();
                true
            }
            SessionEvent::Shutdown => false,
        }
    }
}

/// Ejecuta el pipeline completo sobre un conjunto de muestras
pub fn classify_samples(samples: &[Sample], threshold: f64, cycle: u64) -> CycleReport {
    let signal = widths_of(samples);
    let time_axis = time_axis_of(samples);

    let spans = segment(&signal, threshold);
    let regions = extract_regions(&signal, &time_axis, &spans);
    let result = classify(&regions);

    CycleReport {
        cycle,
        sample_count: samples.len(),
        threshold,
        regions,
        result,
    }
}

/// Lazo de sesión: único consumidor de la cola, por lo que cada ciclo
/// completo es una sección crítica respecto a las muestras.
/// Termina cuando la cola se cierra o llega `Shutdown`; un trigger que quedó
/// armado se dispara antes de salir. Devuelve los ciclos completados.
pub fn run_event_loop(rx: &Receiver<SessionEvent>, controller: &mut CycleController) -> u64 {
    while let Ok(event) = rx.recv() {
        if !controller.handle_event(event) {
            info!("Lazo de sesión detenido");
            break;
        }
    }

    controller.flush_armed();
    controller.cycles_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle_classifier::VehicleType;
    use crossbeam_channel::unbounded;
    use std::sync::{Arc, Mutex};

    const TWO_TIRES: [i64; 12] = [0, 0, 20, 22, 21, 0, 0, 25, 30, 26, 0, 0];

    fn feed(controller: &mut CycleController, widths: &[i64], t0: i64) -> Option<CycleReport> {
        let mut last = None;
        for (i, &w) in widths.iter().enumerate() {
            last = controller.append_sample(t0 + i as i64 * 20, 150, 130, w);
        }
        last
    }

    #[test]
    fn test_collects_until_triggered() {
        let mut controller = CycleController::new(DetectorConfig::default());
        assert!(feed(&mut controller, &TWO_TIRES, 0).is_none());
        assert_eq!(controller.buffer().len(), TWO_TIRES.len());
        assert_eq!(controller.state(), ControllerState::Collecting);
        assert_eq!(controller.cycles_completed(), 0);
    }

    #[test]
    fn test_trigger_fires_on_next_sample() {
        let mut controller = CycleController::new(DetectorConfig::default());
        feed(&mut controller, &TWO_TIRES, 0);

        assert!(controller.arm_trigger().is_none());
        assert_eq!(controller.state(), ControllerState::Armed);

        let report = controller.append_sample(240, 150, 130, 0).unwrap();
        assert_eq!(report.sample_count, TWO_TIRES.len() + 1);
        assert_eq!(report.regions.len(), 2);
        assert_eq!(report.result.vehicle_type(), VehicleType::Type(1));

        assert!(controller.buffer().is_empty());
        assert_eq!(controller.state(), ControllerState::Collecting);
        assert_eq!(controller.cycles_completed(), 1);
    }

    #[test]
    fn test_arm_is_idempotent() {
        let mut controller = CycleController::new(DetectorConfig::default());
        feed(&mut controller, &TWO_TIRES, 0);
        controller.arm_trigger();
        controller.arm_trigger();

        assert!(controller.append_sample(240, 0, 0, 0).is_some());
        // El segundo armado no provoca otro ciclo
        assert!(controller.append_sample(260, 0, 0, 0).is_none());
        assert_eq!(controller.cycles_completed(), 1);
    }

    #[test]
    fn test_immediate_mode() {
        let mut controller = CycleController::new(DetectorConfig {
            trigger_mode: TriggerMode::Immediate,
            ..DetectorConfig::default()
        });
        feed(&mut controller, &TWO_TIRES, 0);

        let report = controller.arm_trigger().unwrap();
        assert_eq!(report.sample_count, TWO_TIRES.len());
        assert_eq!(report.regions[0].peak_width, 22.0);
        assert_eq!(report.regions[1].peak_width, 30.0);
        assert!(controller.buffer().is_empty());
    }

    #[test]
    fn test_empty_buffer_is_unknown() {
        let mut controller = CycleController::new(DetectorConfig::default());
        let report = controller.run_cycle();
        assert_eq!(report.sample_count, 0);
        assert_eq!(report.result, ClassificationResult::Unknown { tires: 0 });
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut controller = CycleController::new(DetectorConfig::default());
        feed(&mut controller, &TWO_TIRES, 0);
        controller.run_cycle();
        assert!(controller.buffer().is_empty());

        // Nueva sesión con un solo neumático: no hereda regiones previas
        feed(&mut controller, &[0, 18, 19, 0], 5000);
        let report = controller.run_cycle();
        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.result, ClassificationResult::Unknown { tires: 1 });
        assert_eq!(report.cycle, 2);
    }

    #[test]
    fn test_negative_width_clamped_before_segmentation() {
        let mut controller = CycleController::new(DetectorConfig {
            threshold: -1.0,
            ..DetectorConfig::default()
        });
        controller.append_sample(0, 0, 0, -50);
        let report = controller.run_cycle();
        // Con ancho recortado a 0 la muestra supera el umbral -1
        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.regions[0].peak_width, 0.0);
    }

    #[test]
    fn test_callback_receives_full_result() {
        let received: Arc<Mutex<Vec<CycleReport>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);

        let mut controller = CycleController::new(DetectorConfig::default());
        controller.set_callback(move |report| {
            received_clone.lock().unwrap().push(report.clone());
        });

        feed(&mut controller, &[0, 15, 17, 0, 0, 40, 42, 41, 0], 0);
        controller.run_cycle();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        match &received[0].result {
            ClassificationResult::TwoAxle(m) => {
                assert_eq!(m.vehicle_type, VehicleType::Type(2));
                assert_eq!(m.front_width, 17.0);
                assert_eq!(m.rear_width, 42.0);
            }
            other => panic!("resultado inesperado {:?}", other),
        }
    }

    #[test]
    fn test_durations_use_timestamps() {
        // 20 ms entre muestras → región de 3 muestras = 0.06 s
        let report = {
            let mut controller = CycleController::new(DetectorConfig::default());
            feed(&mut controller, &TWO_TIRES, 1000);
            controller.run_cycle()
        };
        assert!((report.regions[0].duration - 0.06).abs() < 1e-9);
        assert!((report.regions[0].start_time - 1.04).abs() < 1e-9);
    }

    #[test]
    fn test_event_loop_orders_samples_and_triggers() {
        let (tx, rx) = unbounded();
        let mut controller = CycleController::new(DetectorConfig::default());

        let reports: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let reports_clone = Arc::clone(&reports);
        controller.set_callback(move |report| {
            reports_clone.lock().unwrap().push(report.sample_count);
        });

        for (i, &w) in TWO_TIRES.iter().enumerate() {
            tx.send(SessionEvent::Sample(Sample::new(i as i64 * 20, 0, 0, w)))
                .unwrap();
        }
        tx.send(SessionEvent::Trigger).unwrap();
        tx.send(SessionEvent::Sample(Sample::new(240, 0, 0, 0))).unwrap();
        tx.send(SessionEvent::Sample(Sample::new(260, 0, 0, 0))).unwrap();
        tx.send(SessionEvent::Shutdown).unwrap();
        // Ignorado tras Shutdown
        tx.send(SessionEvent::Trigger).unwrap();

        let cycles = run_event_loop(&rx, &mut controller);
        assert_eq!(cycles, 1);
        assert_eq!(*reports.lock().unwrap(), vec![TWO_TIRES.len() + 1]);
        assert_eq!(controller.buffer().len(), 1);
    }

    #[test]
    fn test_event_loop_ends_when_senders_drop() {
        let (tx, rx) = unbounded();
        let mut controller = CycleController::new(DetectorConfig::default());

        let producer = std::thread::spawn(move || {
            for i in 0..10 {
                tx.send(SessionEvent::Sample(Sample::new(i * 20, 0, 0, 30)))
                    .unwrap();
            }
            tx.send(SessionEvent::Trigger).unwrap();
            tx.send(SessionEvent::Sample(Sample::new(200, 0, 0, 0))).unwrap();
        });

        let cycles = run_event_loop(&rx, &mut controller);
        producer.join().unwrap();
        assert_eq!(cycles, 1);
        assert!(controller.buffer().is_empty());
    }

    #[test]
    fn test_armed_trigger_fires_when_queue_closes() {
        let (tx, rx) = unbounded();
        let mut controller = CycleController::new(DetectorConfig::default());

        for (i, &w) in TWO_TIRES.iter().enumerate() {
            tx.send(SessionEvent::Sample(Sample::new(i as i64 * 20, 0, 0, w)))
                .unwrap();
        }
        tx.send(SessionEvent::Trigger).unwrap();
        drop(tx);

        // No llega ninguna muestra más: la sesión armada se clasifica igualmente
        assert_eq!(run_event_loop(&rx, &mut controller), 1);
        assert!(controller.buffer().is_empty());
        assert_eq!(controller.state(), ControllerState::Collecting);
    }

    #[test]
    fn test_armed_trigger_fires_on_shutdown() {
        let (tx, rx) = unbounded();
        let mut controller = CycleController::new(DetectorConfig::default());

        let reports: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let reports_clone = Arc::clone(&reports);
        controller.set_callback(move |report| {
            reports_clone.lock().unwrap().push(report.regions.len());
        });

        for (i, &w) in TWO_TIRES.iter().enumerate() {
            tx.send(SessionEvent::Sample(Sample::new(i as i64 * 20, 0, 0, w)))
                .unwrap();
        }
        tx.send(SessionEvent::Trigger).unwrap();
        tx.send(SessionEvent::Shutdown).unwrap();

        assert_eq!(run_event_loop(&rx, &mut controller), 1);
        assert_eq!(*reports.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_unarmed_session_not_classified_on_close() {
        let (tx, rx) = unbounded();
        let mut controller = CycleController::new(DetectorConfig::default());

        tx.send(SessionEvent::Sample(Sample::new(0, 0, 0, 30))).unwrap();
        drop(tx);

        assert_eq!(run_event_loop(&rx, &mut controller), 0);
        assert_eq!(controller.buffer().len(), 1);
    }

    #[test]
    fn test_end_of_input_fires_armed_trigger() {
        let mut controller = CycleController::new(DetectorConfig::default());
        feed(&mut controller, &TWO_TIRES, 0);
        controller.arm_trigger();

        assert!(controller.handle_event(SessionEvent::EndOfInput));
        assert_eq!(controller.cycles_completed(), 1);
        assert!(controller.buffer().is_empty());
    }

    #[test]
    fn test_trigger_after_end_of_input_is_immediate() {
        let (tx, rx) = unbounded();
        let mut controller = CycleController::new(DetectorConfig::default());

        for (i, &w) in TWO_TIRES.iter().enumerate() {
            tx.send(SessionEvent::Sample(Sample::new(i as i64 * 20, 0, 0, w)))
                .unwrap();
        }
        tx.send(SessionEvent::EndOfInput).unwrap();
        // Enter pulsado después de que el archivo terminó
        tx.send(SessionEvent::Trigger).unwrap();
        tx.send(SessionEvent::Shutdown).unwrap();

        assert_eq!(run_event_loop(&rx, &mut controller), 1);
        assert!(controller.buffer().is_empty());
    }
}
