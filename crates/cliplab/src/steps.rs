//! Derivation of the guided step flow from job state.
//!
//! Pure functions only: given the same `(job, override)` inputs the same
//! view comes out, with no hidden time dependence.

use serde::Serialize;

use crate::job::{Job, JobStatus};

/// The ordered steps of the submission flow.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Upload,
    Describe,
    Process,
}

/// Visual state of a single step.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Active,
    Ready,
    Disabled,
}

/// Derived view: the step to show plus each step's visual state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub active_step: Step,
    pub upload: StepState,
    pub describe: StepState,
    pub process: StepState,
}

/// Computes the step view for a job and an optional manual selection.
///
/// Per-step states always follow the rule table; the manual selection only
/// overrides which step is shown as active.
pub fn derive_steps(job: Option<&Job>, manual: Option<Step>) -> StepView {
    let upload = match job {
        Some(_) => StepState::Completed,
        None => StepState::Active,
    };

    let describe = match job {
        Some(j) if j.prompt.is_some() => StepState::Completed,
        Some(j) if j.status == JobStatus::Pending => StepState::Active,
        _ => StepState::Disabled,
    };

    let process = match job {
        Some(j)
            if matches!(
                j.status,
                JobStatus::Processing | JobStatus::Completed | JobStatus::Failed
            ) =>
        {
            StepState::Active
        }
        Some(j) if j.prompt.is_some() => StepState::Ready,
        _ => StepState::Disabled,
    };

    let auto_step = match job {
        None => Step::Upload,
        Some(j) if j.status != JobStatus::Pending => Step::Process,
        Some(j) if j.prompt.is_some() => Step::Process,
        Some(_) => Step::Describe,
    };

    StepView {
        active_step: manual.unwrap_or(auto_step),
        upload,
        describe,
        process,
    }
}

/// Tracks the manual step override.
///
/// A user-selected step suspends auto-navigation so the flow never yanks
/// focus away from a step the user deliberately opened. Only a fresh
/// upload (a new job id entering the session) resets the override; in
/// particular, selecting an older job from history keeps it.
#[derive(Debug, Default)]
pub struct StepController {
    manual: Option<Step>,
}

impl StepController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a deliberate step selection, suspending auto-navigation.
    pub fn select(&mut self, step: Step) {
        self.manual = Some(step);
    }

    /// Drops the override; called when a fresh upload creates a new job.
    pub fn reset(&mut self) {
        self.manual = None;
    }

    /// Derives the view for the given job.
    pub fn view(&self, job: Option<&Job>) -> StepView {
        derive_steps(job, self.manual)
    }
}
