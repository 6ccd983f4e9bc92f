//! Camera Kit CLI
//!
//! Command-line interface for exercising the camera orchestrator against
//! the recording mock session.

use camera_kit::{
    capture::{CaptureError, CaptureResult},
    config::{CameraConfiguration, ChangedFields, ConfigField, FileConfig},
    hardware::{CameraFacing, MockCameraSession},
    orchestrator::{CameraOrchestrator, ManualClock, RecordingEventSink, RecordingPresentation},
    permission::StaticPermission,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "camera-kit", version, about = "Camera lifecycle simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scripted session against the mock camera and print the
    /// hardware traffic it produced
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// TOML file with initial camera properties and orchestrator settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of barcode reads in the simulated burst
    #[arg(long, default_value_t = 6)]
    barcodes: u32,

    /// Milliseconds between simulated barcode reads
    #[arg(long, default_value_t = 700)]
    read_interval_ms: u64,

    /// Serve Prometheus metrics on this port until Ctrl-C
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Camera Kit v{}", camera_kit::VERSION);

    let result = match cli.command {
        Command::Simulate(args) => simulate(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn simulate(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    let session = Arc::new(MockCameraSession::new());
    let events = Arc::new(RecordingEventSink::new());
    let presentation = Arc::new(RecordingPresentation::default());
    let clock = ManualClock::new();

    let orchestrator = CameraOrchestrator::builder(
        session.clone(),
        Arc::new(StaticPermission::granted()),
        events.clone(),
    )
    .presentation(presentation.clone())
    .clock(Arc::new(clock.clone()))
    .settings(file_config.orchestrator.clone())
    .build()?;

    info!(dir = %orchestrator.storage().directory().display(), "Capture directory resolved");

    // First delivery carries every property
    let mut config = file_config.camera.clone();
    orchestrator.apply_update(&ChangedFields::all(), config.clone());

    config.zoom = Some(config.max_zoom.map_or(2.0, |max| max.min(2.0)));
    orchestrator.apply_update(&ChangedFields::from([ConfigField::Zoom]), config.clone());

    config.camera_type = match config.camera_type {
        CameraFacing::Back => CameraFacing::Front,
        CameraFacing::Front => CameraFacing::Back,
    };
    orchestrator.apply_update(&ChangedFields::from([ConfigField::CameraType]), config.clone());

    config.scan_barcode = true;
    config.on_read_code = true;
    orchestrator.apply_update(
        &ChangedFields::from([ConfigField::ScanBarcode, ConfigField::OnReadCode]),
        config.clone(),
    );

    let interval = Duration::from_millis(args.read_interval_ms);
    for i in 0..args.barcodes {
        if i > 0 {
            clock.advance(interval);
        }
        session.emit_barcode(&format!("SIM-{:04}", i));
    }

    let outcome: Arc<Mutex<Option<Result<CaptureResult, CaptureError>>>> =
        Arc::new(Mutex::new(None));
    let slot = Arc::clone(&outcome);
    orchestrator.capture_with(move |result| {
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(result);
        }
    });

    println!("Hardware calls:");
    for (i, call) in session.calls().iter().enumerate() {
        println!("  {:>3}  {:?}", i, call);
    }

    println!("Presentation calls:");
    for call in presentation.calls() {
        println!("       {:?}", call);
    }

    let codes = events.read_codes();
    println!(
        "Barcodes forwarded: {} of {} ({})",
        codes.len(),
        args.barcodes,
        codes.join(", ")
    );

    let captured = outcome.lock().ok().and_then(|mut slot| slot.take());
    match captured {
        Some(Ok(result)) => println!("Capture: {} bytes at {}", result.size, result.uri),
        Some(Err(e)) => println!("Capture failed: {}", e),
        None => warn!("Capture still in flight"),
    }

    let snapshot = orchestrator.snapshot();
    info!(
        updates = snapshot.configuration_updates,
        reconfigurations = snapshot.reconfigurations,
        captures = snapshot.captures_succeeded,
        "Simulation finished"
    );

    #[cfg(feature = "metrics")]
    {
        if let Some(port) = args.metrics_port {
            serve_metrics(port, &snapshot)?;
        }
    }

    Ok(())
}

#[cfg(feature = "metrics")]
fn serve_metrics(
    port: u16,
    snapshot: &camera_kit::MetricsSnapshot,
) -> Result<(), Box<dyn std::error::Error>> {
    use camera_kit::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    let registry = MetricsRegistry::new()?;
    registry.update(snapshot);
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let tx = Mutex::new(Some(tx));
    ctrlc::set_handler(move || {
        if let Some(tx) = tx.lock().ok().and_then(|mut tx| tx.take()) {
            let _ = tx.send(());
        }
    })?;

    info!(port, "Serving metrics, press Ctrl-C to stop");
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.run(async {
        let _ = rx.await;
    }))?;

    info!("Metrics server stopped");
    Ok(())
}
