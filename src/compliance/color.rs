use super::hsv::{region_contains, HsvRange, BLACK, WHITE};
use super::{CompliancePolicy, VerdictList, UNIFORM_CORRECT};
use crate::detect::{DetectedItem, Label};
use crate::frame::Frame;

/// Color rule per clothing label: the item's region must contain at least
/// one pixel of the required color.
///
/// T-shirts must show white; pants and shoes must show black. Each broken
/// rule adds one message, in item order. Items are marked with the outcome
/// of their rule. Persons are not judged.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColorPolicy;

impl ColorPolicy {
    pub fn new() -> Self {
        Self
    }

    fn rule(label: Label) -> Option<(HsvRange, &'static str)> {
        match label {
            Label::TShirt => Some((WHITE, "Not Allowed: T-shirt color is incorrect")),
            Label::Pants => Some((BLACK, "Not Allowed: Pants color is incorrect")),
            Label::Shoes => Some((BLACK, "Not Allowed: Shoes color is incorrect")),
            Label::Person => None,
        }
    }
}

impl CompliancePolicy for ColorPolicy {
    fn name(&self) -> &'static str {
        "color"
    }

    fn evaluate(&self, frame: &Frame, items: &mut [DetectedItem]) -> VerdictList {
        let mut verdicts = VerdictList::new();
        for item in items.iter_mut() {
            let Some((range, violation)) = Self::rule(item.label) else {
                continue;
            };
            let ok = region_contains(frame, item.bbox, range);
            item.correct = Some(ok);
            if !ok {
                verdicts.push(violation.to_string());
            }
        }
        if verdicts.is_empty() {
            verdicts.push(UNIFORM_CORRECT.to_string());
        }
        verdicts
    }
}
