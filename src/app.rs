//! Application state threaded through the timer loop.
//!
//! `App` owns the running flag, the open frame source, the pipeline and the
//! reference images. The caller drives it: `tick` once per timer period,
//! `toggle` on the start/stop command. One cycle runs at a time and a stop
//! only takes effect between ticks.

use anyhow::Result;
use image::RgbImage;

use crate::assets::ReferenceImages;
use crate::compliance::{CompliancePolicy, VerdictList};
use crate::detect::Detector;
use crate::ingest::{FrameSource, SourceConfig, SourceStats};
use crate::pipeline::{CycleReport, Pipeline, ReferenceChoice};

/// Where cycle results are shown.
pub trait Surface {
    /// Show one cycle. When `report.show_status` is false only the frame is
    /// shown and the status panel is blank.
    fn render(&mut self, report: &CycleReport, reference: Option<&RgbImage>) -> Result<()>;

    /// Blank the display (on stop).
    fn clear(&mut self) -> Result<()>;
}

/// What one tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running.
    Idle,
    /// No frame (or the detector failed); nothing rendered this tick.
    Skipped,
    /// A cycle was rendered.
    Rendered {
        reference: ReferenceChoice,
        verdicts: VerdictList,
        show_status: bool,
    },
}

/// Counters for the periodic health log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppStats {
    pub cycles: u64,
    pub skipped: u64,
}

pub struct App<D, P, S> {
    source_config: SourceConfig,
    source: Option<FrameSource>,
    pipeline: Pipeline<D, P>,
    references: ReferenceImages,
    surface: S,
    stats: AppStats,
}

impl<D, P, S> App<D, P, S>
where
    D: Detector,
    P: CompliancePolicy,
    S: Surface,
{
    pub fn new(
        source_config: SourceConfig,
        pipeline: Pipeline<D, P>,
        references: ReferenceImages,
        surface: S,
    ) -> Self {
        Self {
            source_config,
            source: None,
            pipeline,
            references,
            surface,
            stats: AppStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    /// Open the source and start running. No-op when already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let source = FrameSource::open(self.source_config.clone())?;
        log::info!("started: {}", source.stats().endpoint);
        self.source = Some(source);
        Ok(())
    }

    /// Stop running, release the source and blank the surface.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut source) = self.source.take() else {
            return Ok(());
        };
        let stats = source.stats();
        source.close();
        log::info!(
            "stopped: {} frames from {} ({} cycles, {} skipped)",
            stats.frames_captured,
            stats.endpoint,
            self.stats.cycles,
            self.stats.skipped
        );
        self.surface.clear()
    }

    /// Start/stop command. Returns the new running state.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_running() {
            self.stop()?;
        } else {
            self.start()?;
        }
        Ok(self.is_running())
    }

    /// Run one cycle if running.
    ///
    /// Read and detection failures skip the tick; the next tick retries.
    /// Only surface errors are returned.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let Some(source) = self.source.as_mut() else {
            return Ok(TickOutcome::Idle);
        };
        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.skipped += 1;
                log::debug!("frame unavailable: {:#}", e);
                return Ok(TickOutcome::Skipped);
            }
        };
        let report = match self.pipeline.run(&frame) {
            Ok(report) => report,
            Err(e) => {
                self.stats.skipped += 1;
                log::warn!("detection failed: {:#}", e);
                return Ok(TickOutcome::Skipped);
            }
        };
        let reference = self.references.get(report.reference);
        self.surface.render(&report, reference)?;
        self.stats.cycles += 1;
        Ok(TickOutcome::Rendered {
            reference: report.reference,
            verdicts: report.verdicts,
            show_status: report.show_status,
        })
    }

    pub fn stats(&self) -> AppStats {
        self.stats
    }

    pub fn source_stats(&self) -> Option<SourceStats> {
        self.source.as_ref().map(FrameSource::stats)
    }

    pub fn source_healthy(&self) -> bool {
        self.source.as_ref().is_some_and(FrameSource::is_healthy)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
