//! Progress-event wire format emitted by [`crate::orchestrator::Orchestrator::generate_streaming`]
//! and [`crate::orchestrator::Orchestrator::complete_streaming`].
//!
//! The transport that fronts these (SSE or otherwise) is out of scope; what
//! lives here is just the serializable record and the milestone schedule
//! both streaming operations advance through.

use serde::{Deserialize, Serialize};

/// Which stage of a generation run a [`ProgressEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Profile,
    Films,
    Series,
    Books,
    Youtube,
    Saving,
    Done,
    Error,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Profile => "profile",
            Step::Films => "films",
            Step::Series => "series",
            Step::Books => "books",
            Step::Youtube => "youtube",
            Step::Saving => "saving",
            Step::Done => "done",
            Step::Error => "error",
        }
    }
}

/// One point in the streaming progress sequence.
///
/// `progress` is monotonically non-decreasing within a run; `count` tracks
/// the running total of admitted recommendations and is also non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub progress: u8,
    pub status: String,
    pub step: Step,
    pub count: usize,
}

impl ProgressEvent {
    pub fn new(progress: u8, status: impl Into<String>, step: Step, count: usize) -> Self {
        Self {
            progress,
            status: status.into(),
            step,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_as_str_matches_the_documented_wire_values() {
        assert_eq!(Step::Films.as_str(), "films");
        assert_eq!(Step::Youtube.as_str(), "youtube");
        assert_eq!(Step::Error.as_str(), "error");
    }
}
