/*
Detección de neumáticos y clasificación de vehículos en tiempo real

1. Lee líneas `timestamp,sensor1,sensor2,width` del equipo (dispositivo serie o archivo)
2. Anexa cada muestra al log CSV (opcional)
3. Al pulsar Enter clasifica la sesión acumulada y la reinicia

El puerto serie debe configurarse antes (baudios, modo raw), por ejemplo:
     stty -F /dev/ttyACM0 115200 raw
     ./target/release/axlewidth --input /dev/ttyACM0 --log sensor_log.csv
*/

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, Sender};
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use axlewidth::config::{DetectorConfig, TriggerMode};
use axlewidth::csv_loader::SampleLog;
use axlewidth::cycle::{run_event_loop, CycleController, CycleReport, SessionEvent};
use axlewidth::line_decoder::{decode_line, DecodeError};

/// Clasificación de vehículos por ancho de neumático
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origen de líneas del equipo (dispositivo serie o archivo de texto)
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Archivo JSON de configuración
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Umbral de detección (sobrescribe la configuración)
    #[arg(long, value_name = "N")]
    threshold: Option<f64>,

    /// Log CSV donde anexar las muestras (sobrescribe la configuración)
    #[arg(long, value_name = "CSV")]
    log: Option<PathBuf>,

    /// Clasificar al pulsar Enter sin esperar la siguiente muestra
    #[arg(long)]
    immediate: bool,

    /// Mostrar cada muestra recibida
    #[arg(long)]
    echo: bool,

    /// Emitir cada resultado como una línea JSON
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("No se pudo cargar la configuración {:?}", path))?,
        None => DetectorConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(log) = &args.log {
        config.sample_log = Some(log.clone());
    }
    if args.immediate {
        config.trigger_mode = TriggerMode::Immediate;
    }
    if args.echo {
        config.echo_samples = true;
    }

    config.validate()?;
    Ok(config)
}

/// Abre el origen de líneas del equipo antes de lanzar los hilos
fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("No se pudo abrir {:?}", path))?;
    Ok(BufReader::new(file))
}

/// Hilo lector: decodifica líneas y las envía a la cola de sesión.
/// Las líneas malformadas se descartan aquí. Al terminar la entrada envía `EndOfInput`.
fn read_samples<R: BufRead>(
    reader: R,
    mut log: Option<SampleLog>,
    echo: bool,
    tx: Sender<SessionEvent>,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                // Bytes no UTF-8 del puerto serie: se descarta la línea
                warn!("Línea no UTF-8 descartada: {}", e);
                continue;
            }
            Err(e) => {
                error!("Error de lectura: {}", e);
                break;
            }
        };

        let sample = match decode_line(&line) {
            Ok(s) => s,
            Err(DecodeError::Empty) => continue,
            Err(e) => {
                warn!("Línea malformada {:?}: {}", line, e);
                continue;
            }
        };

        if echo {
            println!(
                "Time: {} ms | Sensor1: {} mm | Sensor2: {} mm | Width: {} mm",
                sample.timestamp_ms, sample.sensor1_mm, sample.sensor2_mm, sample.width_mm
            );
        }

        if let Some(ref mut log) = log {
            if let Err(e) = log.append(&sample) {
                error!("Error escribiendo log {:?}: {:#}", log.path(), e);
            }
        }

        if tx.send(SessionEvent::Sample(sample)).is_err() {
            return;
        }
    }

    let _ = tx.send(SessionEvent::EndOfInput);
}

/// Hilo de teclado: Enter arma el trigger, `q` termina
fn read_keyboard(tx: Sender<SessionEvent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };

        let event = if line.trim().eq_ignore_ascii_case("q") {
            SessionEvent::Shutdown
        } else {
            debug!("Enter recibido");
            SessionEvent::Trigger
        };

        if tx.send(event).is_err() || event == SessionEvent::Shutdown {
            return;
        }
    }
}

fn print_report(report: &CycleReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("No se pudo serializar el resultado: {}", e),
        }
        return;
    }

    println!("\n================================================================");
    println!(
        "🚗 Ciclo {} ({} muestras, umbral {})",
        report.cycle, report.sample_count, report.threshold
    );
    for (i, region) in report.regions.iter().enumerate() {
        let name = match i {
            0 => "Front".to_string(),
            1 => "Rear".to_string(),
            n => format!("Tire {}", n + 1),
        };
        println!(
            "  {} tire: width {:.1} | {:.2} s | t={:.2}..{:.2}",
            name, region.peak_width, region.duration, region.start_time, region.end_time
        );
    }
    println!("Classification: {}", report.result);
    println!("================================================================\n");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("axlewidth=info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("🎯 Clasificación de vehículos por ancho de neumático");
    info!(
        "Umbral: {} | Trigger: {:?}",
        config.threshold, config.trigger_mode
    );

    let log = match &config.sample_log {
        Some(path) => {
            let log = SampleLog::open_append(path)?;
            info!("💾 Log de muestras: {:?}", path);
            Some(log)
        }
        None => None,
    };

    // Muestras y trigger comparten la misma cola
    let (tx, rx) = bounded::<SessionEvent>(1024);

    let input = open_input(&args.input)?;
    info!("📡 Leyendo muestras desde {:?}", args.input);

    let reader_tx = tx.clone();
    let echo = config.echo_samples;
    std::thread::spawn(move || read_samples(input, log, echo, reader_tx));

    let keyboard_tx = tx;
    std::thread::spawn(move || read_keyboard(keyboard_tx));

    let json = args.json;
    let mut controller = CycleController::new(config);
    controller.set_callback(move |report| print_report(report, json));

    println!("Press Enter to classify current data (q + Enter to quit)...");
    let cycles = run_event_loop(&rx, &mut controller);

    info!("👋 Saliendo tras {} ciclo(s)", cycles);
    Ok(())
}
