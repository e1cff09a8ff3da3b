/// Category state definitions for tracking pipeline progress
///
/// Each selected category moves through a fixed, linear sequence of states
/// while the orchestrator processes it.
use crate::model::{CategoryKey, CategoryStatus};
use std::fmt;
use thiserror::Error;

/// Represents the current state of one category in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryState {
    // ===== Active States =====
    /// Category is selected but no work has started
    Pending,

    /// First page is being fetched to find the page count
    Discovering,

    /// Remaining pages are being fetched and extracted
    Fetching,

    /// Waiting for the aggregator to drain and sorting its output
    Aggregating,

    // ===== Terminal State =====
    /// Category finished with the given completeness
    Done(CategoryStatus),
}

/// Attempted move that skips or reverses a step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition for {category}: {from} -> {to}")]
pub struct InvalidTransition {
    pub category: CategoryKey,
    pub from: CategoryState,
    pub to: CategoryState,
}

impl CategoryState {
    /// Returns true if `next` is the step that directly follows this state
    pub fn can_transition_to(&self, next: CategoryState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Discovering)
                | (Self::Discovering, Self::Fetching)
                | (Self::Fetching, Self::Aggregating)
                | (Self::Aggregating, Self::Done(_))
        )
    }

    /// Moves to `next`, rejecting anything but the following step
    pub fn advance(
        self,
        category: CategoryKey,
        next: CategoryState,
    ) -> Result<CategoryState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                category,
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Discovering => "discovering",
            Self::Fetching => "fetching",
            Self::Aggregating => "aggregating",
            Self::Done(CategoryStatus::Complete) => "done(complete)",
            Self::Done(CategoryStatus::Partial) => "done(partial)",
            Self::Done(CategoryStatus::Failed) => "done(failed)",
        }
    }
}

impl fmt::Display for CategoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
