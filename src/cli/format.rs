//! Output formatting for CLI display.

use crate::model::{Event, View};
use crate::reconcile::Outcome;

/// Render a view as a plain-text radiator.
///
/// One line per pipeline, then the fleet-wide counters.
pub(super) fn format_view(view: &View) -> String {
    let mut out = String::new();

    if view.pipeline_count() == 0 {
        out.push_str("All clear\n");
    }

    for project in &view.projects {
        for p in &project.pipelines {
            let name = if project.namespace.is_empty() {
                project.name.clone()
            } else {
                format!("{}/{}", project.namespace, project.name)
            };
            let kind = if p.tag { "tag" } else { "branch" };
            out.push_str(&format!(
                "{:<8}  {name}  {kind} {}  #{}",
                p.status.as_str().to_uppercase(),
                p.ref_name,
                p.id
            ));
            if let Some(url) = &p.web_url {
                out.push_str(&format!("  {url}"));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "\n▶ {} running   ❚❚ {} pending\n",
        view.running, view.pending
    ));
    out.push_str(&format!("refresh {}s\n", view.refresh));
    out
}

/// Describe what an ingested event did.
pub(super) fn format_outcome(event: &Event, outcome: Outcome) -> String {
    let subject = format!("{} {}@{}", event.kind(), event.project(), event.ref_name());
    match outcome {
        Outcome::Established => format!("{subject}: new ref"),
        Outcome::Updated => format!("{subject}: updated"),
        Outcome::Stale { stored, incoming } => {
            format!("{subject}: ignored, pipeline #{incoming} is older than #{stored}")
        }
        Outcome::BuildRecorded => format!("{subject}: build recorded"),
        Outcome::UnknownBranch => format!("{subject}: ignored, no pipeline seen for this ref yet"),
    }
}
