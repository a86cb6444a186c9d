use anyhow::Result;
use image::{Rgb, RgbImage};

use uniform_check::surface::{SNAPSHOT_FILE, STATUS_FILE};
use uniform_check::{
    App, CycleReport, ReferenceChoice, ReferenceImages, SnapshotSurface, SourceConfig, Surface,
    TemplateDetector, TemplatePipeline, TickOutcome,
};

#[derive(Default)]
struct RecordingSurface {
    rendered: Vec<(Vec<String>, bool)>,
    references_seen: usize,
    clears: usize,
}

impl Surface for RecordingSurface {
    fn render(&mut self, report: &CycleReport, reference: Option<&RgbImage>) -> Result<()> {
        self.rendered
            .push((report.verdicts.clone(), report.show_status));
        if reference.is_some() {
            self.references_seen += 1;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }
}

fn still_config(dir: &tempfile::TempDir) -> SourceConfig {
    let path = dir.path().join("frame.png");
    RgbImage::from_pixel(64, 48, Rgb([30, 30, 30]))
        .save(&path)
        .expect("write frame");
    SourceConfig {
        url: path.display().to_string(),
        width: 80,
        height: 60,
    }
}

fn girl_only() -> ReferenceImages {
    ReferenceImages::new(None, Some(RgbImage::from_pixel(200, 300, Rgb([1, 2, 3]))))
}

fn template_app<S: Surface>(
    config: SourceConfig,
    surface: S,
) -> App<TemplateDetector, uniform_check::PresencePolicy, S> {
    App::new(
        config,
        TemplatePipeline::template(TemplateDetector::default()),
        girl_only(),
        surface,
    )
}

#[test]
fn start_tick_stop_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = template_app(still_config(&dir), RecordingSurface::default());

    assert_eq!(app.tick().expect("idle tick"), TickOutcome::Idle);
    assert!(!app.is_running());

    app.start().expect("start");
    assert!(app.is_running());
    assert!(app.source_healthy());

    let outcome = app.tick().expect("tick");
    assert_eq!(
        outcome,
        TickOutcome::Rendered {
            reference: ReferenceChoice::Girl,
            verdicts: vec!["Not Wearing Uniform: No items detected".to_string()],
            show_status: true,
        }
    );
    app.tick().expect("tick");
    assert_eq!(app.stats().cycles, 2);
    assert_eq!(app.source_stats().expect("stats").frames_captured, 2);

    app.stop().expect("stop");
    assert!(!app.is_running());
    assert!(app.source_stats().is_none());
    assert_eq!(app.tick().expect("tick after stop"), TickOutcome::Idle);

    let surface = app.surface();
    assert_eq!(surface.rendered.len(), 2);
    assert_eq!(surface.references_seen, 2);
    assert_eq!(surface.clears, 1);
}

#[test]
fn toggle_flips_running_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = template_app(still_config(&dir), RecordingSurface::default());

    assert!(app.toggle().expect("toggle on"));
    assert!(!app.toggle().expect("toggle off"));
    assert!(app.toggle().expect("toggle on again"));
    assert_eq!(app.surface().clears, 1);

    // stop when already stopped is a no-op
    app.stop().expect("stop");
    app.stop().expect("stop again");
    assert_eq!(app.surface().clears, 2);
}

#[test]
fn unreadable_endpoint_fails_to_start() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SourceConfig {
        url: dir.path().join("missing.png").display().to_string(),
        ..SourceConfig::default()
    };
    let mut app = template_app(config, RecordingSurface::default());

    assert!(app.start().is_err());
    assert!(!app.is_running());
}

#[test]
fn ended_stream_skips_ticks() {
    let config = SourceConfig {
        url: "stub://gate?frames=1".to_string(),
        width: 40,
        height: 30,
    };
    let mut app = template_app(config, RecordingSurface::default());
    app.start().expect("start");

    assert!(matches!(app.tick().expect("tick"), TickOutcome::Rendered { .. }));
    assert_eq!(app.tick().expect("tick"), TickOutcome::Skipped);
    assert_eq!(app.tick().expect("tick"), TickOutcome::Skipped);
    assert!(app.is_running());
    assert_eq!(app.stats().skipped, 2);
}

#[test]
fn snapshot_surface_writes_and_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let surface = SnapshotSurface::new(&out).expect("surface");
    let mut app = template_app(still_config(&dir), surface);

    app.start().expect("start");
    app.tick().expect("tick");

    let status = std::fs::read_to_string(out.join(STATUS_FILE)).expect("status");
    assert!(status.starts_with("Girl's Uniform Detected\n\n"));
    assert!(status.contains("Not Wearing Uniform: No items detected"));
    let snapshot = image::open(out.join(SNAPSHOT_FILE)).expect("snapshot").into_rgb8();
    assert_eq!(snapshot.dimensions(), (80 + 10 + 200, 300));
    assert_eq!(snapshot.get_pixel(90, 0), &Rgb([1, 2, 3]));

    app.stop().expect("stop");
    assert!(!out.join(SNAPSHOT_FILE).exists());
    assert_eq!(std::fs::read_to_string(out.join(STATUS_FILE)).expect("status"), "");
}
