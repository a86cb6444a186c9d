//! Headless presentation surface.
//!
//! `SnapshotSurface` stands in for a window: it writes the annotated frame
//! (with the reference uniform composited to its right) to `latest.png`, the
//! status panel to `status.txt`, and logs whenever the verdict changes.

use anyhow::{Context, Result};
use image::{imageops, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::Surface;
use crate::assets::{REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::compliance::VerdictList;
use crate::pipeline::CycleReport;

pub const SNAPSHOT_FILE: &str = "latest.png";
pub const STATUS_FILE: &str = "status.txt";

const PANEL_GAP: u32 = 10;
const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);

pub struct SnapshotSurface {
    dir: PathBuf,
    snapshot_every: u64,
    rendered: u64,
    last_verdicts: Option<VerdictList>,
}

impl SnapshotSurface {
    /// Create the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("create snapshot dir {}", dir.display()))?;
        Ok(Self {
            dir,
            snapshot_every: 1,
            rendered: 0,
            last_verdicts: None,
        })
    }

    /// Write the PNG only every `n`-th render. The status file is always written.
    pub fn with_snapshot_every(mut self, n: u64) -> Self {
        self.snapshot_every = n.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_status(&self, text: &str) -> Result<()> {
        let path = self.dir.join(STATUS_FILE);
        fs::write(&path, text).with_context(|| format!("write {}", path.display()))
    }

    fn log_verdict_change(&mut self, report: &CycleReport) {
        let verdicts = if report.show_status {
            Some(&report.verdicts)
        } else {
            None
        };
        if self.last_verdicts.as_ref() == verdicts {
            return;
        }
        match verdicts {
            Some(v) => log::info!("{}: {}", report.reference.heading(), v.join("; ")),
            None => log::info!("no person in view"),
        }
        self.last_verdicts = verdicts.cloned();
    }
}

impl Surface for SnapshotSurface {
    fn render(&mut self, report: &CycleReport, reference: Option<&RgbImage>) -> Result<()> {
        self.log_verdict_change(report);
        let text = if report.show_status {
            report.status_text()
        } else {
            String::new()
        };
        self.write_status(&text)?;

        if self.rendered % self.snapshot_every == 0 {
            let reference = reference.filter(|_| report.show_status);
            let canvas = compose(report.annotated.as_image(), reference);
            let path = self.dir.join(SNAPSHOT_FILE);
            canvas
                .save(&path)
                .with_context(|| format!("write {}", path.display()))?;
        }
        self.rendered += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.last_verdicts = None;
        self.write_status("")?;
        let path = self.dir.join(SNAPSHOT_FILE);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Frame on the left, reference panel on the right.
pub fn compose(frame: &RgbImage, reference: Option<&RgbImage>) -> RgbImage {
    let width = frame.width() + PANEL_GAP + REFERENCE_WIDTH;
    let height = frame.height().max(REFERENCE_HEIGHT);
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    imageops::replace(&mut canvas, frame, 0, 0);
    if let Some(reference) = reference {
        let x = (frame.width() + PANEL_GAP) as i64;
        imageops::replace(&mut canvas, reference, x, 0);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_places_reference_right_of_frame() {
        let frame = RgbImage::from_pixel(40, 30, Rgb([255, 0, 0]));
        let reference = RgbImage::from_pixel(REFERENCE_WIDTH, REFERENCE_HEIGHT, Rgb([0, 0, 255]));
        let canvas = compose(&frame, Some(&reference));
        assert_eq!(
            canvas.dimensions(),
            (40 + PANEL_GAP + REFERENCE_WIDTH, REFERENCE_HEIGHT)
        );
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(40 + PANEL_GAP, 0), &Rgb([0, 0, 255]));
        assert_eq!(canvas.get_pixel(40, 0), &BACKGROUND);
    }

    #[test]
    fn compose_without_reference_leaves_panel_blank() {
        let frame = RgbImage::from_pixel(10, 400, Rgb([1, 1, 1]));
        let canvas = compose(&frame, None);
        assert_eq!(canvas.height(), 400);
        assert_eq!(canvas.get_pixel(10 + PANEL_GAP + 5, 5), &BACKGROUND);
    }
}
