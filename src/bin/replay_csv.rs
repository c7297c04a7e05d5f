use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use axlewidth::config::DetectorConfig;
use axlewidth::csv_loader::load_samples_from_csv;
use axlewidth::cycle::CycleController;
use axlewidth::types::DEFAULT_THRESHOLD;

/// Reproduce una sesión grabada y la clasifica como si se hubiera pulsado Enter al final
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct ReplayOptions {
    /// Log CSV de muestras
    #[arg(value_name = "CSV")]
    csv_path: PathBuf,

    /// Umbral de detección
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_name = "N")]
    threshold: f64,

    /// Emitir el resultado como JSON
    #[arg(long)]
    json: bool,

    /// Mostrar las regiones detectadas
    #[arg(long)]
    dump_regions: bool,

    /// Volcar la sesión cargada en formato CSV antes de clasificar
    #[arg(long)]
    dump_session: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("axlewidth=warn")),
        )
        .init();

    let opts = ReplayOptions::parse();
    ensure!(opts.threshold.is_finite(), "Umbral inválido: {}", opts.threshold);

    let samples = load_samples_from_csv(&opts.csv_path)?;
    info!("🎞️  Reproduciendo {} muestras desde {:?}", samples.len(), opts.csv_path);

    let mut controller = CycleController::new(DetectorConfig {
        threshold: opts.threshold,
        ..DetectorConfig::default()
    });
    for sample in samples {
        controller.push_sample(sample);
    }
    if opts.dump_session {
        print!("{}", controller.buffer().to_csv());
    }
    let report = controller.run_cycle();

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\n🚗 {:?}: {} muestras, {} neumático(s)",
        opts.csv_path,
        report.sample_count,
        report.regions.len()
    );
    println!("Classification: {}", report.result);

    if opts.dump_regions {
        println!("\n📊 Regiones (orden cronológico):");
        for (idx, region) in report.regions.iter().enumerate() {
            println!(
                "  {:>2}. idx {:>5}..{:<5} ({:>4} muestras) width {:>8.2} dur {:>6.3} s center {:>10.3} s",
                idx + 1,
                region.start_index,
                region.end_index,
                region.sample_count(),
                region.peak_width,
                region.duration,
                region.center_time
            );
        }
    }

    Ok(())
}
