use std::fmt;

use crate::frame::Region;

/// Labels the detectors can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Person,
    TShirt,
    Pants,
    Shoes,
}

impl Label {
    /// Clothing labels in rule-evaluation order.
    pub const CLOTHING: [Label; 3] = [Label::TShirt, Label::Pants, Label::Shoes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Person => "person",
            Label::TShirt => "T-shirt",
            Label::Pants => "pants",
            Label::Shoes => "shoes",
        }
    }

    pub fn is_clothing(&self) -> bool {
        !matches!(self, Label::Person)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled region found in a frame.
///
/// `correct` is set by whichever stage judges the item: the template matcher
/// marks presence, the color policy marks rule compliance. `None` means the
/// item has not been judged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectedItem {
    pub label: Label,
    pub bbox: Region,
    pub correct: Option<bool>,
}

impl DetectedItem {
    pub fn new(label: Label, bbox: Region) -> Self {
        Self {
            label,
            bbox,
            correct: None,
        }
    }

    pub fn judged(label: Label, bbox: Region, correct: bool) -> Self {
        Self {
            label,
            bbox,
            correct: Some(correct),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.correct == Some(true)
    }
}

impl fmt::Display for DetectedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.bbox)?;
        match self.correct {
            Some(true) => f.write_str(" - Correct"),
            Some(false) => f.write_str(" - Incorrect"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_lines_match_status_panel_format() {
        let judged = DetectedItem::judged(Label::Pants, Region::new(1, 2, 3, 4), false);
        assert_eq!(judged.to_string(), "pants: (1, 2, 3, 4) - Incorrect");
        let person = DetectedItem::new(Label::Person, Region::new(0, 0, 10, 20));
        assert_eq!(person.to_string(), "person: (0, 0, 10, 20)");
    }
}
