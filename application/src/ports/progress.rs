//! Progress notification port
//!
//! Defines the interface for reporting progress while a turn runs.

use ensemble_domain::{Branch, FusionOutcome, ModelId, Turn, TurnId};

/// Callback for progress updates during a turn
///
/// Called from the turn's background tasks, so implementations must be
/// thread-safe. Implementations live in the presentation layer.
pub trait TurnProgressNotifier: Send + Sync {
    /// Called once after the branch slots are allocated
    fn on_turn_start(&self, turn_id: &TurnId, selection: &[ModelId]);

    /// Called when the branch at `index` reaches a terminal status
    fn on_branch_complete(&self, index: usize, branch: &Branch);

    /// Called when fusion has produced its outcome
    fn on_fusion_complete(&self, outcome: &FusionOutcome);

    /// Called once the finished turn has been written to the transcript
    fn on_turn_persisted(&self, _turn: &Turn) {}

    /// Called when fusion starts with `contributors` succeeded branches
    fn on_fusion_start(&self, _contributors: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl TurnProgressNotifier for NoProgress {
    fn on_turn_start(&self, _turn_id: &TurnId, _selection: &[ModelId]) {}
    fn on_branch_complete(&self, _index: usize, _branch: &Branch) {}
    fn on_fusion_complete(&self, _outcome: &FusionOutcome) {}
}
