use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::AssetPaths;
use crate::detect::{MATCH_THRESHOLD, SSD_CONFIDENCE};
use crate::frame::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use crate::ingest::{SourceConfig, DEFAULT_STREAM_URL};

const DEFAULT_ASSET_DIR: &str = "uniform";
const DEFAULT_OUTPUT_DIR: &str = "uniform-out";
const DEFAULT_TICK_MS: u64 = 10;
const DEFAULT_SNAPSHOT_EVERY: u64 = 1;

#[derive(Debug, Deserialize, Default)]
struct UniformConfigFile {
    stream: Option<StreamConfigFile>,
    assets: Option<AssetConfigFile>,
    output_dir: Option<PathBuf>,
    tick_ms: Option<u64>,
    snapshot_every: Option<u64>,
    legacy_placeholders: Option<bool>,
    match_threshold: Option<f32>,
    ssd_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AssetConfigFile {
    dir: Option<PathBuf>,
    boy_reference: Option<PathBuf>,
    girl_reference: Option<PathBuf>,
    tshirt_template: Option<PathBuf>,
    pants_template: Option<PathBuf>,
    shoes_template: Option<PathBuf>,
    ssd_model: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct UniformConfig {
    pub stream: SourceConfig,
    pub asset_dir: PathBuf,
    pub assets: AssetPaths,
    pub output_dir: PathBuf,
    pub tick: Duration,
    pub snapshot_every: u64,
    /// Fixed clothing boxes for the SSD variant instead of template matching.
    pub legacy_placeholders: bool,
    /// Minimum correlation coefficient for a template match.
    pub match_threshold: f32,
    /// SSD person rows at or below this confidence are dropped.
    pub ssd_confidence: f32,
}

impl Default for UniformConfig {
    fn default() -> Self {
        // Defaults never fail validation.
        Self {
            stream: SourceConfig::default(),
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            assets: AssetPaths::in_dir(DEFAULT_ASSET_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            snapshot_every: DEFAULT_SNAPSHOT_EVERY,
            legacy_placeholders: false,
            match_threshold: MATCH_THRESHOLD,
            ssd_confidence: SSD_CONFIDENCE,
        }
    }
}

impl UniformConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("UNIFORM_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: UniformConfigFile) -> Self {
        let stream = SourceConfig {
            url: file
                .stream
                .as_ref()
                .and_then(|stream| stream.url.clone())
                .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string()),
            width: file
                .stream
                .as_ref()
                .and_then(|stream| stream.width)
                .unwrap_or(DEFAULT_FRAME_WIDTH),
            height: file
                .stream
                .as_ref()
                .and_then(|stream| stream.height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
        };
        let asset_file = file.assets.unwrap_or_default();
        let asset_dir = asset_file
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR));
        let mut assets = AssetPaths::in_dir(&asset_dir);
        override_path(&mut assets.boy_reference, asset_file.boy_reference);
        override_path(&mut assets.girl_reference, asset_file.girl_reference);
        override_path(&mut assets.tshirt_template, asset_file.tshirt_template);
        override_path(&mut assets.pants_template, asset_file.pants_template);
        override_path(&mut assets.shoes_template, asset_file.shoes_template);
        override_path(&mut assets.ssd_model, asset_file.ssd_model);

        Self {
            stream,
            asset_dir,
            assets,
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            tick: Duration::from_millis(file.tick_ms.unwrap_or(DEFAULT_TICK_MS)),
            snapshot_every: file.snapshot_every.unwrap_or(DEFAULT_SNAPSHOT_EVERY),
            legacy_placeholders: file.legacy_placeholders.unwrap_or(false),
            match_threshold: file.match_threshold.unwrap_or(MATCH_THRESHOLD),
            ssd_confidence: file.ssd_confidence.unwrap_or(SSD_CONFIDENCE),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("UNIFORM_STREAM_URL") {
            if !url.trim().is_empty() {
                self.stream.url = url;
            }
        }
        if let Ok(dir) = std::env::var("UNIFORM_ASSET_DIR") {
            if !dir.trim().is_empty() {
                self.set_asset_dir(PathBuf::from(dir));
            }
        }
        if let Ok(dir) = std::env::var("UNIFORM_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(tick) = std::env::var("UNIFORM_TICK_MS") {
            let millis: u64 = tick.trim().parse().map_err(|_| {
                anyhow!("UNIFORM_TICK_MS must be an integer number of milliseconds")
            })?;
            self.tick = Duration::from_millis(millis);
        }
        Ok(())
    }

    /// Point every asset at the conventional names under `dir`.
    pub fn set_asset_dir(&mut self, dir: PathBuf) {
        self.assets = AssetPaths::in_dir(&dir);
        self.asset_dir = dir;
    }

    fn validate(&mut self) -> Result<()> {
        self.stream.url = self.stream.url.trim().to_string();
        if self.stream.url.is_empty() {
            return Err(anyhow!("stream url must not be empty"));
        }
        if self.stream.width == 0 || self.stream.height == 0 {
            return Err(anyhow!(
                "frame size must be non-zero (got {}x{})",
                self.stream.width,
                self.stream.height
            ));
        }
        if self.tick.is_zero() {
            return Err(anyhow!("tick must be greater than zero"));
        }
        if self.snapshot_every == 0 {
            return Err(anyhow!("snapshot_every must be at least 1"));
        }
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(anyhow!(
                "match_threshold must be in (0, 1] (got {})",
                self.match_threshold
            ));
        }
        if !(0.0..1.0).contains(&self.ssd_confidence) {
            return Err(anyhow!(
                "ssd_confidence must be in [0, 1) (got {})",
                self.ssd_confidence
            ));
        }
        Ok(())
    }
}

fn override_path(slot: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(path) = value {
        *slot = path;
    }
}

fn read_config_file(path: &Path) -> Result<UniformConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
