//! uniform_monitor - live uniform compliance loop
//!
//! This binary:
//! 1. Loads configuration and the reference/template assets
//! 2. Opens the camera stream
//! 3. Every tick, detects clothing, judges it and writes the snapshot
//! 4. Stops (releasing the stream) on Ctrl-C or after `--max-cycles`
//!
//! Built with `backend-tract` it runs the SSD person detector with color
//! rules; otherwise template matching with presence rules.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use uniform_check::{
    App, CompliancePolicy, Detector, ReferenceChoice, ReferenceImages, SnapshotSurface,
    TemplateDetector, TickOutcome, UniformConfig,
};

#[path = "../ui.rs"]
mod ui;

const HEALTH_LOG_EVERY: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about = "Watch a camera stream for uniform compliance")]
struct Args {
    /// Stream endpoint (http(s) MJPEG, image path, or stub://)
    #[arg(long, env = "UNIFORM_STREAM_URL")]
    url: Option<String>,

    /// Directory holding boy.jpg, girl.jpg, the templates and the model
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Snapshot output directory
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Stop after this many rendered cycles
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Use the fixed clothing boxes instead of template matching (SSD build only)
    #[arg(long)]
    legacy_placeholders: bool,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let config = {
        let _stage = ui.stage("Load configuration");
        let mut config = UniformConfig::load()?;
        if let Some(url) = &args.url {
            config.stream.url = url.clone();
        }
        if let Some(dir) = &args.assets {
            config.set_asset_dir(dir.clone());
        }
        if let Some(out) = &args.out {
            config.output_dir = out.clone();
        }
        config.legacy_placeholders |= args.legacy_placeholders;
        config
    };

    let (references, templates) = {
        let _stage = ui.stage("Load assets");
        let references = ReferenceImages::load(&config.assets);
        let templates = uniform_check::assets::load_templates(&config.assets);
        log::info!(
            "{} clothing template(s) from {}",
            templates.len(),
            config.asset_dir.display()
        );
        (references, templates)
    };
    let detector = TemplateDetector::new(templates).with_threshold(config.match_threshold);

    let surface =
        SnapshotSurface::new(&config.output_dir)?.with_snapshot_every(config.snapshot_every);
    log::info!("writing snapshots to {}", surface.dir().display());

    let pipeline = {
        let _stage = ui.stage("Prepare detector");
        build_pipeline(&config, detector)?
    };
    let app = App::new(config.stream.clone(), pipeline, references, surface);
    run(app, &config, args.max_cycles, &ui)
}

#[cfg(feature = "backend-tract")]
fn build_pipeline(
    config: &UniformConfig,
    detector: TemplateDetector,
) -> Result<uniform_check::SsdPipeline<uniform_check::detect::TractSsdModel>> {
    use uniform_check::{ClothingStage, ColorPolicy, Pipeline, SsdDetector};

    let model = uniform_check::detect::TractSsdModel::load_optional(&config.assets.ssd_model);
    let clothing = if config.legacy_placeholders {
        ClothingStage::LegacyPlaceholders
    } else {
        ClothingStage::Templates(detector)
    };
    let ssd = SsdDetector::new(model, clothing).with_confidence(config.ssd_confidence);
    let mut pipeline = Pipeline::new(ssd, ColorPolicy::new());
    pipeline.warm_up()?;
    Ok(pipeline)
}

#[cfg(not(feature = "backend-tract"))]
fn build_pipeline(
    config: &UniformConfig,
    detector: TemplateDetector,
) -> Result<uniform_check::TemplatePipeline> {
    if config.legacy_placeholders {
        log::warn!("--legacy-placeholders needs the backend-tract build; ignored");
    }
    log::debug!(
        "ssd model {} unused in this build",
        config.assets.ssd_model.display()
    );
    if detector.is_empty() {
        log::warn!("no clothing templates loaded; every frame will report no items");
    }
    Ok(uniform_check::TemplatePipeline::template(detector))
}

fn run<D, P>(
    mut app: App<D, P, SnapshotSurface>,
    config: &UniformConfig,
    max_cycles: Option<u64>,
    ui: &ui::Ui,
) -> Result<()>
where
    D: Detector,
    P: CompliancePolicy,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;
    }

    {
        let _stage = ui.stage("Open stream");
        app.toggle()?;
    }
    log::info!(
        "uniform_monitor running (tick {}ms); Ctrl-C to stop",
        config.tick.as_millis()
    );

    let mut live = ui.live();
    let mut last_health_log = Instant::now();
    while !shutdown.load(Ordering::SeqCst) {
        let started = Instant::now();
        if let TickOutcome::Rendered {
            reference,
            verdicts,
            show_status,
        } = app.tick()?
        {
            live.cycle(&summary_line(reference, &verdicts, show_status));
        }

        if max_cycles.is_some_and(|max| app.stats().cycles >= max) {
            log::info!("reached {} cycles", app.stats().cycles);
            break;
        }

        if last_health_log.elapsed() >= HEALTH_LOG_EVERY {
            if let Some(stats) = app.source_stats() {
                log::info!(
                    "stream health={} frames={} url={}",
                    app.source_healthy(),
                    stats.frames_captured,
                    stats.endpoint
                );
            }
            last_health_log = Instant::now();
        }

        if let Some(rest) = config.tick.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let stats = app.stats();
    app.stop()?;
    live.finish(&format!(
        "stopped after {} cycles ({} skipped)",
        stats.cycles, stats.skipped
    ));
    Ok(())
}

fn summary_line(reference: ReferenceChoice, verdicts: &[String], show_status: bool) -> String {
    if !show_status {
        return "no person in view".to_string();
    }
    format!("{}: {}", reference.heading(), verdicts.join("; "))
}
