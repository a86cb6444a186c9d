//! Compliance policies.
//!
//! A policy reads the detected items (and the frame, for color checks) and
//! produces the verdict list for the cycle. Policies may mark each item's
//! `correct` flag as a side effect.

mod color;
pub mod hsv;
mod presence;

pub use color::ColorPolicy;
pub use presence::{PresencePolicy, UNIFORM_ABSENT, UNIFORM_COMPLETE, UNIFORM_INCOMPLETE};

use crate::detect::DetectedItem;
use crate::frame::Frame;

/// Ordered, human-readable status messages for one frame. Not deduplicated.
pub type VerdictList = Vec<String>;

pub const UNIFORM_CORRECT: &str = "Uniform is correct";

/// Compliance policy trait.
pub trait CompliancePolicy: Send {
    /// Policy identifier.
    fn name(&self) -> &'static str;

    /// Judge the items of one frame. Never returns an empty list.
    fn evaluate(&self, frame: &Frame, items: &mut [DetectedItem]) -> VerdictList;
}
