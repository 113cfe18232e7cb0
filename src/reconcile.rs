//! Event reconciliation: folding webhook events into the state store.
//!
//! Pipeline and build events overlap without agreeing. Pipeline events decide
//! which pipeline a ref is on and its overall status, but list only the latest
//! build per job name and fire only on pipeline transitions. Build events fire
//! for every build but cannot establish a ref on their own. Each source owns its
//! own dimension:
//!
//! - A pipeline event creates the ref, or replaces its pipeline fields when the
//!   pipeline id is not older than the stored one. Builds already on record keep
//!   their stored status; builds new to the ref are appended.
//! - A build event overwrites status and timing of one build on a known ref.
//!
//! Application is pure and in-memory; persistence wraps it in a transaction.
//! Re-applying an event is a no-op.

use crate::model::{BranchState, BuildEvent, Event, PipelineEvent, StateStore, Status};

/// What applying an event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First pipeline seen for this ref.
    Established,

    /// A same-or-newer pipeline replaced the stored one.
    Updated,

    /// Older than the stored pipeline; dropped.
    Stale { stored: u64, incoming: u64 },

    /// A build on a known ref was recorded.
    BuildRecorded,

    /// Build event for a project or ref with no pipeline yet; dropped.
    UnknownBranch,
}

impl Outcome {
    /// Whether the store may have changed and needs writing back.
    pub fn changed(self) -> bool {
        matches!(self, Self::Established | Self::Updated | Self::BuildRecorded)
    }
}

/// Applies one event to the store.
pub fn apply(state: &mut StateStore, event: &Event) -> Outcome {
    match event {
        Event::Pipeline(e) => apply_pipeline(state, e),
        Event::Build(e) => apply_build(state, e),
    }
}

fn apply_pipeline(state: &mut StateStore, event: &PipelineEvent) -> Outcome {
    let (builds, web_url, outcome) = match state.branch_mut(&event.project, &event.ref_name) {
        None => (Vec::new(), None, Outcome::Established),

        // Pipeline ids increase per project. An equal id is the same pipeline
        // reaching a later status and must still land.
        Some(stored) if event.pipeline_id < stored.pipeline_id => {
            return Outcome::Stale {
                stored: stored.pipeline_id,
                incoming: event.pipeline_id,
            };
        }

        Some(stored) => (
            std::mem::take(&mut stored.builds),
            stored.web_url.take(),
            Outcome::Updated,
        ),
    };

    let mut branch = BranchState {
        pipeline_id: event.pipeline_id,
        status: event.status.clone(),
        ref_name: event.ref_name.clone(),
        tag: event.tag,
        web_url: event.web_url.clone().or(web_url),
        builds,
    };

    // Stored records win: they carry build-event detail the pipeline payload
    // may predate, and retried builds the payload no longer lists. A payload
    // repeating an id keeps its first record.
    for incoming in &event.builds {
        branch.add_build(incoming);
    }

    state
        .project_entry(&event.project)
        .branches_mut()
        .insert(event.ref_name.clone(), branch);
    outcome
}

fn apply_build(state: &mut StateStore, event: &BuildEvent) -> Outcome {
    let Some(branch) = state.branch_mut(&event.project, &event.ref_name) else {
        return Outcome::UnknownBranch;
    };

    let record = branch.build_or_insert(event.build_id, Status::Created);
    record.status = event.status.clone();
    record.started_at.clone_from(&event.started_at);
    record.finished_at.clone_from(&event.finished_at);
    Outcome::BuildRecorded
}
