//! Aggregate view: the radiator query over reconciled state.
//!
//! A query selects branches, drops excluded projects, then hides investigated
//! pipelines. The running and pending counters ignore all of that and measure
//! the whole fleet. Reading never mutates the store.

use jiff::Timestamp;
use regex::Regex;

use crate::model::{
    BranchState, InvestigationSet, PipelineSummary, ProjectKey, ProjectView, StateStore, Status,
    View,
};

/// Errors from building a query.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("invalid project filter {pattern:?}: {source}")]
    InvalidFilter {
        pattern: String,
        source: regex::Error,
    },
}

/// Which branches a query looks at.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Watched refs in the given statuses. A tag matches when `tags` is set,
    /// whatever its name.
    Watched {
        branches: Vec<String>,
        tags: bool,
        statuses: Vec<Status>,
    },

    /// Any ref currently in one of the given statuses.
    Current { statuses: Vec<Status> },
}

impl Selection {
    fn matches(&self, branch: &BranchState) -> bool {
        match self {
            Self::Watched {
                branches,
                tags,
                statuses,
            } => {
                let watched = branches.contains(&branch.ref_name) || (*tags && branch.tag);
                watched && statuses.contains(&branch.status)
            }
            Self::Current { statuses } => statuses.contains(&branch.status),
        }
    }
}

/// A radiator query.
#[derive(Debug, Clone)]
pub struct Query {
    pub selection: Selection,

    /// Projects whose `namespace/name` matches any of these are dropped.
    pub exclusions: Vec<Regex>,

    pub refresh: u32,
}

impl Query {
    pub fn new(selection: Selection, refresh: u32) -> Self {
        Self {
            selection,
            exclusions: Vec::new(),
            refresh,
        }
    }

    /// Adds project exclusion patterns.
    pub fn excluding<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, ViewError> {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|source| ViewError::InvalidFilter {
                pattern: pattern.to_string(),
                source,
            })?;
            self.exclusions.push(regex);
        }
        Ok(self)
    }

    fn excludes(&self, project: &ProjectKey) -> bool {
        self.exclusions
            .iter()
            .any(|re| re.is_match(project.as_str()))
    }
}

/// Runs a query against a snapshot of the store.
pub fn query(state: &StateStore, investigations: &InvestigationSet, query: &Query) -> View {
    let projects: Vec<ProjectView> = state
        .projects()
        .filter(|(key, _)| !query.excludes(key))
        .filter_map(|(key, project)| {
            let pipelines: Vec<PipelineSummary> = project
                .branches()
                .map(|(_, branch)| branch)
                .filter(|branch| query.selection.matches(branch))
                .filter(|branch| !investigations.is_suppressed(key, branch.pipeline_id))
                .map(summarize)
                .collect();

            (!pipelines.is_empty()).then(|| ProjectView {
                namespace: key.namespace().to_string(),
                name: key.name().to_string(),
                pipelines,
            })
        })
        .collect();

    let success = !projects
        .iter()
        .flat_map(|p| &p.pipelines)
        .any(|p| p.status == Status::Failed);

    View {
        projects,
        running: state.count_builds(|s| *s == Status::Running),
        pending: state.count_builds(Status::is_queued),
        success,
        refresh: query.refresh,
        generated_at: Timestamp::now(),
    }
}

fn summarize(branch: &BranchState) -> PipelineSummary {
    PipelineSummary {
        id: branch.pipeline_id,
        status: branch.status.clone(),
        ref_name: branch.ref_name.clone(),
        tag: branch.tag,
        web_url: branch.pipeline_url(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::model::{Event, Investigation};
    use crate::reconcile;

    fn seed(events: &[serde_json::Value]) -> StateStore {
        let mut state = StateStore::default();
        for e in events {
            reconcile::apply(&mut state, &Event::from_value(e.clone()).unwrap());
        }
        state
    }

    fn pipeline(project: &str, r: &str, tag: bool, id: u64, status: &str, builds: &[(u64, &str)]) -> serde_json::Value {
        let builds: Vec<_> = builds
            .iter()
            .map(|(id, status)| json!({ "id": id, "status": status }))
            .collect();
        json!({
            "object_kind": "pipeline",
            "project": { "path_with_namespace": project, "web_url": format!("https://gitlab/{project}") },
            "object_attributes": { "id": id, "ref": r, "tag": tag, "status": status },
            "builds": builds,
        })
    }

    fn watched(branches: &[&str], tags: bool) -> Query {
        Query::new(
            Selection::Watched {
                branches: branches.iter().map(ToString::to_string).collect(),
                tags,
                statuses: vec![Status::Failed],
            },
            60,
        )
    }

    fn ids(view: &View) -> Vec<(String, u64)> {
        view.projects
            .iter()
            .flat_map(|p| {
                p.pipelines
                    .iter()
                    .map(move |s| (format!("{}/{}", p.namespace, p.name), s.id))
            })
            .collect()
    }

    fn fleet() -> StateStore {
        seed(&[
            pipeline("g/p", "master", false, 42, "failed", &[(1, "failed"), (2, "running")]),
            pipeline("g/p", "feature", false, 43, "failed", &[(3, "pending")]),
            pipeline("g/q", "develop", false, 50, "success", &[(4, "created")]),
            pipeline("g/r", "v1.0", true, 60, "failed", &[(5, "running")]),
            pipeline("other/s", "master", false, 70, "running", &[(6, "running")]),
        ])
    }

    #[test]
    fn watched_view_selects_failed_pipelines_on_watched_refs() {
        let view = query(&fleet(), &InvestigationSet::default(), &watched(&["master", "develop"], false));

        assert_eq!(ids(&view), vec![("g/p".to_string(), 42)]);
        assert!(!view.success);
    }

    #[test]
    fn tags_are_included_regardless_of_name() {
        let view = query(&fleet(), &InvestigationSet::default(), &watched(&["master"], true));

        assert_eq!(
            ids(&view),
            vec![("g/p".to_string(), 42), ("g/r".to_string(), 60)]
        );
    }

    #[test]
    fn counters_cover_the_whole_fleet() {
        let q = watched(&["nothing-matches"], false);
        let view = query(&fleet(), &InvestigationSet::default(), &q);

        assert!(view.projects.is_empty());
        assert_eq!(view.running, 3);
        assert_eq!(view.pending, 2);
    }

    #[test]
    fn exclusions_drop_matching_projects() {
        let q = watched(&["master"], true).excluding(&["^g/r$"]).unwrap();
        let view = query(&fleet(), &InvestigationSet::default(), &q);

        assert_eq!(ids(&view), vec![("g/p".to_string(), 42)]);
    }

    #[test]
    fn invalid_exclusion_is_an_error() {
        let err = watched(&["master"], true).excluding(&["("]).unwrap_err();
        assert!(matches!(err, ViewError::InvalidFilter { .. }));
    }

    #[test]
    fn investigation_hides_only_that_pipeline() {
        let state = seed(&[
            pipeline("g/p", "master", false, 42, "failed", &[]),
            pipeline("g/p", "develop", false, 44, "failed", &[]),
        ]);
        let investigations: InvestigationSet =
            [Investigation::new("g", "p", 42).unwrap()].into_iter().collect();

        let view = query(&state, &investigations, &watched(&["master", "develop"], false));

        assert_eq!(ids(&view), vec![("g/p".to_string(), 44)]);
        // The raw store still has it.
        assert_eq!(
            state
                .branch(&ProjectKey::from_path("g/p"), "master")
                .unwrap()
                .pipeline_id,
            42
        );
    }

    #[test]
    fn project_with_every_entry_suppressed_disappears() {
        let investigations: InvestigationSet =
            [Investigation::new("g", "p", 42).unwrap()].into_iter().collect();

        let view = query(&fleet(), &investigations, &watched(&["master"], false));

        assert!(view.projects.is_empty());
    }

    #[test]
    fn success_with_no_failures() {
        let state = seed(&[
            pipeline("g/p", "master", false, 1, "success", &[]),
            pipeline("g/q", "master", false, 2, "success", &[]),
        ]);
        let q = Query::new(
            Selection::Watched {
                branches: vec!["master".into()],
                tags: false,
                statuses: vec![Status::Success, Status::Failed],
            },
            60,
        );

        let view = query(&state, &InvestigationSet::default(), &q);

        assert_eq!(view.pipeline_count(), 2);
        assert!(view.success);
    }

    #[test]
    fn bare_project_can_be_suppressed() {
        let state = seed(&[pipeline("solo", "master", false, 42, "failed", &[])]);
        let q = watched(&["master"], false);

        let shown = query(&state, &InvestigationSet::default(), &q);
        assert_eq!(ids(&shown), vec![("/solo".to_string(), 42)]);

        let investigations: InvestigationSet =
            [Investigation::new("-", "solo", 42).unwrap()].into_iter().collect();
        let view = query(&state, &investigations, &q);

        assert!(view.projects.is_empty());
        assert!(view.success);
    }

    #[test]
    fn success_when_only_failure_is_suppressed() {
        let state = seed(&[pipeline("g/p", "master", false, 42, "failed", &[])]);
        let investigations: InvestigationSet =
            [Investigation::new("g", "p", 42).unwrap()].into_iter().collect();

        let view = query(&state, &investigations, &watched(&["master"], false));

        assert!(view.success);
    }

    #[test]
    fn failure_when_unsuppressed() {
        let state = seed(&[pipeline("g/p", "master", false, 42, "failed", &[])]);

        let view = query(&state, &InvestigationSet::default(), &watched(&["master"], false));

        assert!(!view.success);
    }

    #[test]
    fn current_view_selects_by_status_on_any_ref() {
        let q = Query::new(
            Selection::Current {
                statuses: vec![Status::Running, Status::Pending],
            },
            30,
        );

        let view = query(&fleet(), &InvestigationSet::default(), &q);

        assert_eq!(ids(&view), vec![("other/s".to_string(), 70)]);
        assert_eq!(view.refresh, 30);
        assert!(view.success);
    }

    #[test]
    fn summaries_link_to_pipeline() {
        let view = query(&fleet(), &InvestigationSet::default(), &watched(&["master"], false));

        assert_eq!(
            view.projects[0].pipelines[0].web_url.as_deref(),
            Some("https://gitlab/g/p/pipelines/42")
        );
    }
}
