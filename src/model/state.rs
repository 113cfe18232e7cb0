//! Reconciled state: the current pipeline per project and ref.
//!
//! Persisted as nested JSON, `project → ref → branch`:
//!
//! ```text
//! {
//!   "group/app": {
//!     "master": { "pipeline_id": 10, "status": "running", "ref": "master",
//!                 "tag": false, "builds": [{ "id": 1, "status": "running", ... }] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ProjectKey, Status};

/// Every project seen so far, keyed by canonical path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStore {
    projects: BTreeMap<ProjectKey, ProjectState>,
}

/// The branches and tags of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectState {
    branches: BTreeMap<String, BranchState>,
}

/// The latest known pipeline for one ref, plus every build seen on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchState {
    pub pipeline_id: u64,
    pub status: Status,
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub tag: bool,

    /// The project's web URL, used to link to pipelines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// Accumulated builds, in order of first sighting.
    #[serde(default)]
    pub builds: Vec<BuildRecord>,
}

/// One build (job), keyed by id within its branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: u64,
    pub status: Status,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl StateStore {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn projects(&self) -> impl Iterator<Item = (&ProjectKey, &ProjectState)> {
        self.projects.iter()
    }

    #[cfg(test)]
    pub fn branch(&self, key: &ProjectKey, ref_name: &str) -> Option<&BranchState> {
        self.projects.get(key)?.branches.get(ref_name)
    }

    /// Mutable lookup that never creates missing entries.
    pub(crate) fn branch_mut(&mut self, key: &ProjectKey, ref_name: &str) -> Option<&mut BranchState> {
        self.projects.get_mut(key)?.branches.get_mut(ref_name)
    }

    pub(crate) fn project_entry(&mut self, key: &ProjectKey) -> &mut ProjectState {
        self.projects.entry(key.clone()).or_default()
    }

    /// Counts builds across the whole store whose status satisfies `pred`.
    pub fn count_builds(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.projects
            .values()
            .flat_map(ProjectState::branches)
            .flat_map(|(_, branch)| &branch.builds)
            .filter(|b| pred(&b.status))
            .count()
    }
}

impl ProjectState {
    pub fn branches(&self) -> impl Iterator<Item = (&String, &BranchState)> {
        self.branches.iter()
    }

    pub(crate) fn branches_mut(&mut self) -> &mut BTreeMap<String, BranchState> {
        &mut self.branches
    }
}

impl BranchState {
    pub fn build(&self, id: u64) -> Option<&BuildRecord> {
        self.builds.iter().find(|b| b.id == id)
    }

    /// Appends `record` unless a build with its id is already on record.
    pub(crate) fn add_build(&mut self, record: &BuildRecord) {
        if self.build(record.id).is_none() {
            self.builds.push(record.clone());
        }
    }

    /// Returns the record for `id`, appending an empty one if it hasn't been seen.
    ///
    /// `placeholder` is the status given to a freshly appended record.
    pub(crate) fn build_or_insert(&mut self, id: u64, placeholder: Status) -> &mut BuildRecord {
        let index = match self.builds.iter().position(|b| b.id == id) {
            Some(i) => i,
            None => {
                self.builds.push(BuildRecord {
                    id,
                    status: placeholder,
                    started_at: None,
                    finished_at: None,
                });
                self.builds.len() - 1
            }
        };
        &mut self.builds[index]
    }

    /// Link to this branch's pipeline, when the project URL is known.
    pub fn pipeline_url(&self) -> Option<String> {
        self.web_url
            .as_ref()
            .map(|url| format!("{}/pipelines/{}", url.trim_end_matches('/'), self.pipeline_id))
    }
}
