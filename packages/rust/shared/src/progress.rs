//! Progress observation side channel.
//!
//! The scheduler and pipeline emit one observation per completed unit of
//! work, independent of return values. Front-ends (CLI progress bars, web
//! session displays) implement [`ProgressReporter`]; library code and tests
//! use [`SilentProgress`].

use serde::{Deserialize, Serialize};

/// Pipeline stage an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Classify,
    Discover,
    Fetch,
    Extract,
    Chunk,
}

/// Terminal status of one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Success,
    Error,
}

/// One progress observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage this unit belongs to.
    pub stage: Stage,
    /// Completed units so far, including this one.
    pub current: usize,
    /// Total units scheduled for the stage.
    pub total: usize,
    /// `current / total` rounded to whole percent.
    pub percentage: u8,
    /// URL the unit operated on, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    /// Whether the unit succeeded.
    pub status: UnitStatus,
}

impl ProgressEvent {
    /// Build an event, computing the percentage from `current`/`total`.
    pub fn unit(
        stage: Stage,
        current: usize,
        total: usize,
        current_url: Option<String>,
        status: UnitStatus,
    ) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((current as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            stage,
            current,
            total,
            percentage,
            current_url,
            status,
        }
    }
}

/// Callback for reporting pipeline progress.
pub trait ProgressReporter: Send + Sync {
    /// Called when the pipeline enters a new phase.
    fn phase(&self, stage: Stage);
    /// Called once per completed unit of work.
    fn observe(&self, event: ProgressEvent);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _stage: Stage) {}
    fn observe(&self, _event: ProgressEvent) {}
}
