//! Core data model for the radiator.
//!
//! These types describe what flows through the system:
//! webhook events in, reconciled pipeline state at rest,
//! investigations on the side, and aggregate views out.

mod event;
mod investigation;
mod project;
mod state;
mod status;
mod view;

pub use event::{BuildEvent, Event, PipelineEvent};
pub use investigation::{Investigation, InvestigationSet};
pub use project::ProjectKey;
pub use state::{BranchState, BuildRecord, StateStore};
pub use status::Status;
pub use view::{PipelineSummary, ProjectView, View};
