use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use peekwatch_core::capture::domain::frame_source::FrameSource;
use peekwatch_core::capture::infrastructure::image_dir_source::ImageDirSource;
use peekwatch_core::capture::infrastructure::synthetic_source::SyntheticSource;
use peekwatch_core::config::MonitorConfig;
use peekwatch_core::detection::infrastructure::scripted_detector::ScriptedDetector;
use peekwatch_core::monitor::status::MonitorEvent;
use peekwatch_core::monitor::worker;
use peekwatch_core::reaction::dispatcher::ReactionDispatcher;
use peekwatch_core::reaction::domain::app_switcher::AppSwitcher;
use peekwatch_core::reaction::domain::snapshot_sink::SnapshotSink;
use peekwatch_core::reaction::infrastructure::command_app_switcher::CommandAppSwitcher;
use peekwatch_core::reaction::infrastructure::jpeg_snapshot_writer::JpegSnapshotWriter;

/// Headless anti-peek monitor: watches a frame source for extra faces
/// and switches to the work application when someone peeks.
#[derive(Parser)]
#[command(name = "peekwatch")]
struct Cli {
    /// Config overlay file (JSON). Defaults to the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay image files from this directory as the frame source.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Scripted per-tick face counts, comma-separated, cycled.
    /// Drives the synthetic detector when no real model is wired in.
    #[arg(long, value_delimiter = ',', default_value = "0")]
    script: Vec<u32>,

    /// Exit after this many seconds (0 = run until Ctrl-C).
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Validate the merged config, print it, and exit.
    #[arg(long)]
    check_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = MonitorConfig::load(cli.config.as_deref())?;

    if cli.check_config {
        println!("{}", serde_summary(&config));
        return Ok(());
    }

    let source: Box<dyn FrameSource> = match &cli.frames {
        Some(dir) => Box::new(ImageDirSource::open(dir)?),
        None => Box::new(SyntheticSource::new(640, 480)),
    };
    let detector = Box::new(ScriptedDetector::new(cli.script.clone()));

    let snapshot: Option<Arc<dyn SnapshotSink>> = JpegSnapshotWriter::from_config(&config.snapshot)
        .map(|w| Arc::new(w) as Arc<dyn SnapshotSink>);
    let switcher: Option<Arc<dyn AppSwitcher>> = CommandAppSwitcher::from_config(&config.work_app)
        .map(|s| Arc::new(s) as Arc<dyn AppSwitcher>);
    if snapshot.is_none() {
        log::info!("snapshots disabled");
    }
    if switcher.is_none() {
        log::info!("work app switching disabled");
    }

    let handle = worker::spawn(&config, source, detector, ReactionDispatcher::new(snapshot, switcher));

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    println!("peekwatch running. Ctrl-C to exit.");
    let deadline = (cli.duration > 0).then(|| std::time::Instant::now() + Duration::from_secs(cli.duration));

    loop {
        if interrupted.load(Ordering::Relaxed) {
            println!("exiting");
            break;
        }
        if deadline.is_some_and(|d| std::time::Instant::now() >= d) {
            break;
        }

        match handle.events().recv_timeout(Duration::from_millis(200)) {
            Ok(MonitorEvent::Alert { face_count, .. }) => {
                println!("ALERT: {face_count} faces detected, reactions dispatched");
            }
            Ok(MonitorEvent::Clear) => println!("clear: back to a single face"),
            Ok(MonitorEvent::Degraded {
                consecutive_failures,
            }) => {
                println!("WARNING: camera/detector degraded after {consecutive_failures} failed ticks");
            }
            Ok(MonitorEvent::Recovered) => println!("capture recovered"),
            Err(_) => {} // timeout: just re-check the exit conditions
        }
    }

    handle.shutdown();
    Ok(())
}

fn serde_summary(config: &MonitorConfig) -> String {
    // Pretty JSON keeps --check-config output copy-pastable as an overlay.
    serde_json::to_string_pretty(config).unwrap_or_else(|e| format!("<serialize error: {e}>"))
}
