//! View: what a radiator query returns.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Status;

/// The aggregate dashboard: matching pipelines grouped by project, plus fleet load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub projects: Vec<ProjectView>,

    /// Builds running anywhere in the fleet, regardless of filters.
    pub running: usize,

    /// Builds created or pending anywhere in the fleet, regardless of filters.
    pub pending: usize,

    /// No listed pipeline has failed.
    pub success: bool,

    /// Seconds between client refreshes, echoed from the query.
    pub refresh: u32,

    pub generated_at: Timestamp,
}

/// The pipelines of one project that made it through the filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    pub namespace: String,
    pub name: String,
    pub pipelines: Vec<PipelineSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: u64,
    pub status: Status,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub tag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

impl View {
    pub fn pipeline_count(&self) -> usize {
        self.projects.iter().map(|p| p.pipelines.len()).sum()
    }
}
