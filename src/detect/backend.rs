use anyhow::Result;

use crate::detect::item::DetectedItem;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend turns one frame into labeled regions. Backends must not carry
/// detection state from one frame to the next: the same frame always yields
/// the same items. Frames without anything recognizable produce an empty
/// (or placeholder-only) list, never an error.
pub trait Detector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedItem>>;

    /// True when the verdict should only be shown while a person is in view.
    fn requires_person(&self) -> bool {
        false
    }

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
