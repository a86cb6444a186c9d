//! Uniform compliance checker
//!
//! Watches a camera stream and reports, per frame, whether the person in view
//! wears the approved uniform.
//!
//! # Architecture
//!
//! Each timer tick runs one cycle:
//!
//! 1. **Acquire**: `ingest::FrameSource` pulls a frame (MJPEG over HTTP, a
//!    still image, or a synthetic `stub://` source) and resizes it.
//! 2. **Detect**: a `detect::Detector` locates clothing items. Two variants
//!    exist: template matching, and an SSD person detector (`backend-tract`).
//! 3. **Judge**: a `compliance::CompliancePolicy` turns the items into
//!    verdicts (presence of every item, or HSV color rules).
//! 4. **Present**: `app::App` hands the `pipeline::CycleReport` to a
//!    `app::Surface`, which draws the annotated frame, the reference uniform
//!    and the status panel.
//!
//! # Module Structure
//!
//! - `frame`: RGB frames and bounding regions
//! - `ingest`: frame sources
//! - `detect`: detector trait and the template/SSD backends
//! - `compliance`: verdict policies and HSV helpers
//! - `pipeline`: detector + policy pairing, annotation
//! - `assets`, `config`: startup inputs
//! - `app`, `surface`: run state and headless presentation

pub mod app;
pub mod assets;
pub mod compliance;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod surface;

pub use app::{App, AppStats, Surface, TickOutcome};
pub use assets::{AssetPaths, ReferenceImages};
pub use compliance::{ColorPolicy, CompliancePolicy, PresencePolicy, VerdictList};
pub use config::UniformConfig;
pub use detect::{
    ClothingStage, ClothingTemplate, DetectedItem, Detector, Label, SsdDetector, SsdModel,
    TemplateDetector,
};
pub use frame::{Frame, Region};
pub use ingest::{FrameSource, SourceConfig, SourceStats};
pub use pipeline::{CycleReport, Pipeline, ReferenceChoice, SsdPipeline, TemplatePipeline};
pub use surface::SnapshotSurface;
