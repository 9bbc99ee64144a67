//! Stage enum representing the fixed workflow sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The workflow stages in their fixed order, plus the terminal End state.
///
/// A session only ever moves forward through this sequence; there is no
/// skipping and no automatic revisiting of an approved earlier stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intent,
    Description,
    Questions,
    End,
}

impl Stage {
    /// Returns all stages in canonical order.
    pub fn all() -> &'static [Stage] {
        &[Stage::Intent, Stage::Description, Stage::Questions, Stage::End]
    }

    /// Returns the 0-based index of this stage in the canonical order.
    pub fn order_index(&self) -> usize {
        Self::all()
            .iter()
            .position(|s| s == self)
            .expect("Stage must be in all() array")
    }

    /// Returns the next stage in order, if any.
    pub fn next(&self) -> Option<Stage> {
        let idx = self.order_index();
        Self::all().get(idx + 1).copied()
    }

    /// Returns true for the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::End)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Intent => "intent",
            Stage::Description => "description",
            Stage::Questions => "questions",
            Stage::End => "end",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_canonical_order() {
        let all = Stage::all();

        assert_eq!(all.len(), 4);
        assert_eq!(all[0], Stage::Intent);
        assert_eq!(all[3], Stage::End);
    }

    #[test]
    fn test_stage_next_follows_sequence() {
        assert_eq!(Stage::Intent.next(), Some(Stage::Description));
        assert_eq!(Stage::Description.next(), Some(Stage::Questions));
        assert_eq!(Stage::Questions.next(), Some(Stage::End));
        assert_eq!(Stage::End.next(), None);
    }

    #[test]
    fn test_stage_terminal() {
        assert!(Stage::End.is_terminal());
        assert!(!Stage::Questions.is_terminal());
    }

    #[test]
    fn test_stage_display_snake_case() {
        assert_eq!(Stage::Intent.to_string(), "intent");
        assert_eq!(Stage::End.to_string(), "end");
    }

    #[test]
    fn test_stage_serde_snake_case() {
        let json = serde_json::to_string(&Stage::Description).unwrap();
        assert_eq!(json, "\"description\"");
    }
}
