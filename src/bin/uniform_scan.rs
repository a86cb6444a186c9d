//! uniform_scan - judge captured still images offline
//!
//! Runs the template-matching pipeline over each image given on the command
//! line and prints the status panel. With `--out`, the annotated frames are
//! written into that directory as `<stem>.annotated.png`.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use uniform_check::assets::{load_templates, read_image};
use uniform_check::{AssetPaths, Frame, TemplateDetector, TemplatePipeline};

#[path = "../ui.rs"]
#[allow(dead_code)]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check still images for uniform compliance")]
struct Args {
    /// Images to check
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Directory holding tshirt.jpg, pants.jpg and shoes.jpg
    #[arg(long, env = "UNIFORM_ASSET_DIR", default_value = "uniform", value_name = "DIR")]
    assets: PathBuf,

    /// Frame width each image is resized to
    #[arg(long, default_value_t = uniform_check::frame::DEFAULT_FRAME_WIDTH)]
    width: u32,

    /// Frame height each image is resized to
    #[arg(long, default_value_t = uniform_check::frame::DEFAULT_FRAME_HEIGHT)]
    height: u32,

    /// Minimum correlation coefficient for a template match
    #[arg(long, default_value_t = uniform_check::detect::MATCH_THRESHOLD)]
    threshold: f32,

    /// Write annotated frames into this directory
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.width == 0 || args.height == 0 {
        return Err(anyhow!("frame size must be non-zero"));
    }
    if !(args.threshold > 0.0 && args.threshold <= 1.0) {
        return Err(anyhow!("--threshold must be in (0, 1]"));
    }
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let mut pipeline = {
        let _stage = ui.stage("Load templates");
        let templates = load_templates(&AssetPaths::in_dir(&args.assets));
        if templates.is_empty() {
            log::warn!("no templates under {}", args.assets.display());
        }
        let detector = TemplateDetector::new(templates).with_threshold(args.threshold);
        TemplatePipeline::template(detector)
    };
    if let Some(out) = &args.out {
        std::fs::create_dir_all(out)
            .with_context(|| format!("create output dir {}", out.display()))?;
    }

    let mut failures = 0usize;
    for path in &args.images {
        let _stage = ui.stage(&format!("Check {}", path.display()));
        match scan(&mut pipeline, path, &args) {
            Ok(status) => {
                println!("=== {} ===", path.display());
                println!("{status}");
            }
            Err(e) => {
                failures += 1;
                log::error!("{}: {:#}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} image(s) failed", failures, args.images.len()));
    }
    Ok(())
}

fn scan(pipeline: &mut TemplatePipeline, path: &Path, args: &Args) -> Result<String> {
    let frame = Frame::from_image(read_image(path)?).fit_to(args.width, args.height);
    let report = pipeline.run(&frame)?;
    if let Some(out) = &args.out {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("frame");
        let target = out.join(format!("{stem}.annotated.png"));
        report
            .annotated
            .as_image()
            .save(&target)
            .with_context(|| format!("write {}", target.display()))?;
    }
    Ok(report.status_text())
}
