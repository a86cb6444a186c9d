//! Synthetic source (`stub://`) for demos and tests.

use anyhow::{anyhow, Result};

use super::SourceStats;
use crate::frame::Frame;

/// Frames produced before the synthetic stream reports end-of-stream.
/// `stub://name?frames=N` overrides it; `0` means unbounded.
const DEFAULT_STUB_FRAMES: u64 = 0;

pub(crate) struct SyntheticSource {
    endpoint: String,
    width: u32,
    height: u32,
    frame_limit: u64,
    frame_count: u64,
    connected: bool,
}

impl SyntheticSource {
    pub(crate) fn new(endpoint: String, width: u32, height: u32) -> Self {
        let frame_limit = parse_frame_limit(&endpoint).unwrap_or(DEFAULT_STUB_FRAMES);
        Self {
            endpoint,
            width,
            height,
            frame_limit,
            frame_count: 0,
            connected: false,
        }
    }

    /// Synthetic sources are always reachable.
    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.endpoint);
        self.connected = true;
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        if !self.connected {
            return Err(anyhow!("synthetic source not connected"));
        }
        if self.frame_limit > 0 && self.frame_count >= self.frame_limit {
            return Err(anyhow!("synthetic stream ended"));
        }
        self.frame_count += 1;
        Frame::from_rgb(self.generate_pixels(), self.width, self.height)
    }

    /// Vertical gradient with a slowly moving offset.
    fn generate_pixels(&self) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut pixels = vec![0u8; w * h * 3];
        for y in 0..h {
            let shade = ((y * 255 / h.max(1)) as u64 + self.frame_count) % 256;
            let row = &mut pixels[y * w * 3..(y + 1) * w * 3];
            row.fill(shade as u8);
        }
        pixels
    }

    pub(crate) fn close(&mut self) {
        self.connected = false;
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.connected
    }

    pub(crate) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            endpoint: self.endpoint.clone(),
        }
    }
}

fn parse_frame_limit(endpoint: &str) -> Option<u64> {
    let (_, query) = endpoint.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "frames")
        .and_then(|(_, value)| value.parse().ok())
}
