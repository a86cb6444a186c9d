//! Frame ingestion sources.
//!
//! `FrameSource` wraps one of:
//! - HTTP MJPEG / JPEG snapshot endpoints (`http://`, `https://`)
//! - a local still image (plain path or `file://`)
//! - a synthetic generator (`stub://`)
//!
//! Every frame handed out is resized to the configured run size. A source
//! holds its resource (socket, decoded image) from `connect` until `close`.
//! There is no reconnection logic: a failed read is reported to the caller,
//! which skips that cycle and tries again on the next tick.

mod mjpeg;
mod still;
mod synthetic;

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use url::Url;

use crate::frame::{Frame, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};

use mjpeg::MjpegSource;
use still::StillSource;
use synthetic::SyntheticSource;

/// Stream endpoint used when none is configured.
pub const DEFAULT_STREAM_URL: &str = "http://127.0.0.1:8080/video";

/// Configuration for a frame source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    /// Endpoint: `http(s)://…`, `file://…`, a local path, or `stub://…`.
    pub url: String,
    /// Output frame width.
    pub width: u32,
    /// Output frame height.
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub endpoint: String,
}

/// A frame source bound to one endpoint.
pub struct FrameSource {
    backend: SourceBackend,
    width: u32,
    height: u32,
}

enum SourceBackend {
    Http(MjpegSource),
    Still(StillSource),
    Synthetic(SyntheticSource),
}

impl FrameSource {
    /// Resolve the endpoint to a backend. Does not touch the network.
    pub fn new(config: SourceConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!(
                "frame size must be non-zero (got {}x{})",
                config.width,
                config.height
            ));
        }
        let backend = resolve_backend(&config)?;
        Ok(Self {
            backend,
            width: config.width,
            height: config.height,
        })
    }

    /// Resolve and connect in one step.
    pub fn open(config: SourceConfig) -> Result<Self> {
        let mut source = Self::new(config)?;
        source.connect()?;
        Ok(source)
    }

    /// Connect to the endpoint.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            SourceBackend::Http(source) => source.connect(),
            SourceBackend::Still(source) => source.connect(),
            SourceBackend::Synthetic(source) => source.connect(),
        }
    }

    /// Read the next frame, resized to the configured size.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let frame = match &mut self.backend {
            SourceBackend::Http(source) => source.next_frame(),
            SourceBackend::Still(source) => source.next_frame(),
            SourceBackend::Synthetic(source) => source.next_frame(),
        }?;
        Ok(frame.fit_to(self.width, self.height))
    }

    /// Release the underlying resource.
    pub fn close(&mut self) {
        match &mut self.backend {
            SourceBackend::Http(source) => source.close(),
            SourceBackend::Still(source) => source.close(),
            SourceBackend::Synthetic(source) => source.close(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            SourceBackend::Http(source) => source.is_healthy(),
            SourceBackend::Still(source) => source.is_healthy(),
            SourceBackend::Synthetic(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            SourceBackend::Http(source) => source.stats(),
            SourceBackend::Still(source) => source.stats(),
            SourceBackend::Synthetic(source) => source.stats(),
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn resolve_backend(config: &SourceConfig) -> Result<SourceBackend> {
    let url = config.url.trim();
    if url.is_empty() {
        return Err(anyhow!("frame source url is empty"));
    }
    if url.starts_with("stub://") {
        return Ok(SourceBackend::Synthetic(SyntheticSource::new(
            url.to_string(),
            config.width,
            config.height,
        )));
    }
    if !url.contains("://") {
        return Ok(SourceBackend::Still(StillSource::new(PathBuf::from(url))));
    }

    let parsed = Url::parse(url).with_context(|| format!("parse source url {}", url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(SourceBackend::Http(MjpegSource::new(url.to_string()))),
        "file" => {
            let path = parsed
                .to_file_path()
                .map_err(|_| anyhow!("invalid file url {}", url))?;
            Ok(SourceBackend::Still(StillSource::new(path)))
        }
        other => Err(anyhow!(
            "unsupported source scheme '{}'; expected http(s), file or stub",
            other
        )),
    }
}
