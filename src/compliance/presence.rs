use std::collections::BTreeSet;

use super::{CompliancePolicy, VerdictList};
use crate::detect::{DetectedItem, Label};
use crate::frame::Frame;

pub const UNIFORM_COMPLETE: &str = "Uniform is complete";
pub const UNIFORM_INCOMPLETE: &str = "Incomplete Uniform: Some items are missing";
pub const UNIFORM_ABSENT: &str = "Not Wearing Uniform: No items detected";

/// Presence rule: every required clothing label must have at least one item
/// marked correct. Produces exactly one message.
#[derive(Clone, Debug)]
pub struct PresencePolicy {
    required: BTreeSet<Label>,
}

impl PresencePolicy {
    /// Requires T-shirt, pants and shoes.
    pub fn new() -> Self {
        Self::with_required(Label::CLOTHING)
    }

    pub fn with_required(labels: impl IntoIterator<Item = Label>) -> Self {
        Self {
            required: labels.into_iter().collect(),
        }
    }
}

impl Default for PresencePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl CompliancePolicy for PresencePolicy {
    fn name(&self) -> &'static str {
        "presence"
    }

    fn evaluate(&self, _frame: &Frame, items: &mut [DetectedItem]) -> VerdictList {
        let present: BTreeSet<Label> = items
            .iter()
            .filter(|item| item.is_correct())
            .map(|item| item.label)
            .collect();
        let found = self.required.intersection(&present).count();

        let verdict = if found == self.required.len() {
            UNIFORM_COMPLETE
        } else if found > 0 {
            UNIFORM_INCOMPLETE
        } else {
            UNIFORM_ABSENT
        };
        vec![verdict.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Region;

    fn found(label: Label) -> DetectedItem {
        DetectedItem::judged(label, Region::new(0, 0, 10, 10), true)
    }

    fn missing(label: Label) -> DetectedItem {
        DetectedItem::judged(label, Region::empty(), false)
    }

    fn verdict(items: &mut [DetectedItem]) -> VerdictList {
        PresencePolicy::new().evaluate(&Frame::filled(1, 1, [0, 0, 0]), items)
    }

    #[test]
    fn all_items_present() {
        let mut items = [found(Label::TShirt), found(Label::Pants), found(Label::Shoes)];
        assert_eq!(verdict(&mut items), vec![UNIFORM_COMPLETE.to_string()]);
    }

    #[test]
    fn only_tshirt_present() {
        let mut items = [found(Label::TShirt), missing(Label::Pants), missing(Label::Shoes)];
        assert_eq!(verdict(&mut items), vec![UNIFORM_INCOMPLETE.to_string()]);
    }

    #[test]
    fn nothing_present() {
        assert_eq!(verdict(&mut []), vec![UNIFORM_ABSENT.to_string()]);
        let mut items = [missing(Label::TShirt)];
        assert_eq!(verdict(&mut items), vec![UNIFORM_ABSENT.to_string()]);
    }

    #[test]
    fn duplicate_hits_count_once() {
        let mut items = [found(Label::Shoes), found(Label::Shoes), found(Label::Shoes)];
        assert_eq!(verdict(&mut items), vec![UNIFORM_INCOMPLETE.to_string()]);
    }

    #[test]
    fn unjudged_items_do_not_count() {
        let mut items = [
            DetectedItem::new(Label::TShirt, Region::new(0, 0, 5, 5)),
            DetectedItem::new(Label::Person, Region::new(0, 0, 5, 5)),
        ];
        assert_eq!(verdict(&mut items), vec![UNIFORM_ABSENT.to_string()]);
    }
}
