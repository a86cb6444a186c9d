//! Still-image frame source.
//!
//! Serves one decoded image file on every read. Used for headless runs and
//! tests where a camera is not available. Only local paths are accepted.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use super::SourceStats;
use crate::frame::Frame;

pub(crate) struct StillSource {
    path: PathBuf,
    frame: Option<Frame>,
    frame_count: u64,
}

impl StillSource {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            frame: None,
            frame_count: 0,
        }
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        let image = image::open(&self.path)
            .with_context(|| format!("open still image {}", self.path.display()))?;
        self.frame = Some(Frame::from_image(image.into_rgb8()));
        log::info!("StillSource: loaded {}", self.path.display());
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| anyhow!("still source not connected; call connect() first"))?;
        self.frame_count += 1;
        Ok(frame.clone())
    }

    pub(crate) fn close(&mut self) {
        self.frame = None;
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.frame.is_some()
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            endpoint: self.path.display().to_string(),
        }
    }
}
