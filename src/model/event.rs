//! Webhook events: the two kinds of payload GitLab sends us.
//!
//! Payloads are decoded in two steps: `object_kind` picks the variant, then the
//! variant's own shape is deserialized. Anything other than `pipeline` or
//! `build` is rejected outright rather than guessed at from field presence.

use serde::Deserialize;
use serde_json::Value;

use super::{BuildRecord, ProjectKey, Status};

/// Errors from decoding a webhook payload.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("event has no object_kind")]
    MissingKind,

    #[error("unknown object_kind: {0}")]
    UnknownKind(String),

    #[error("malformed {kind} event: {source}")]
    Malformed {
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// A decoded webhook event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Pipeline(PipelineEvent),
    Build(BuildEvent),
}

/// A pipeline changed status.
///
/// `builds` holds only the latest build per job name, never retries.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEvent {
    pub project: ProjectKey,
    pub web_url: Option<String>,
    pub pipeline_id: u64,
    pub ref_name: String,
    pub tag: bool,
    pub status: Status,
    pub builds: Vec<BuildRecord>,
}

/// A single build (job) changed status.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildEvent {
    pub project: ProjectKey,
    pub ref_name: String,
    pub build_id: u64,
    pub status: Status,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl Event {
    /// Decodes one webhook payload.
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        let value: Value = serde_json::from_str(json).map_err(EventError::InvalidJson)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let kind = value
            .get("object_kind")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(EventError::MissingKind)?;

        match kind.as_str() {
            "pipeline" => {
                let raw: RawPipeline = serde_json::from_value(value)
                    .map_err(|source| EventError::Malformed { kind: "pipeline", source })?;
                Ok(Self::Pipeline(raw.into()))
            }
            "build" => {
                let raw: RawBuild = serde_json::from_value(value)
                    .map_err(|source| EventError::Malformed { kind: "build", source })?;
                Ok(Self::Build(raw.into()))
            }
            _ => Err(EventError::UnknownKind(kind)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pipeline(_) => "pipeline",
            Self::Build(_) => "build",
        }
    }

    pub fn project(&self) -> &ProjectKey {
        match self {
            Self::Pipeline(e) => &e.project,
            Self::Build(e) => &e.project,
        }
    }

    pub fn ref_name(&self) -> &str {
        match self {
            Self::Pipeline(e) => &e.ref_name,
            Self::Build(e) => &e.ref_name,
        }
    }
}

// ── Wire shapes ──

#[derive(Deserialize)]
struct RawPipeline {
    project: RawProject,
    object_attributes: RawPipelineAttributes,
    #[serde(default)]
    builds: Vec<RawPipelineBuild>,
}

#[derive(Deserialize)]
struct RawProject {
    path_with_namespace: String,
    #[serde(default)]
    web_url: Option<String>,
}

#[derive(Deserialize)]
struct RawPipelineAttributes {
    id: u64,
    #[serde(rename = "ref")]
    ref_name: String,
    #[serde(default)]
    tag: bool,
    status: Status,
}

#[derive(Deserialize)]
struct RawPipelineBuild {
    id: u64,
    status: Status,
    #[serde(default)]
    started_at: Option<String>,
    #[serde(default)]
    finished_at: Option<String>,
}

#[derive(Deserialize)]
struct RawBuild {
    project_name: String,
    #[serde(rename = "ref")]
    ref_name: String,
    build_id: u64,
    build_status: Status,
    #[serde(default)]
    build_started_at: Option<String>,
    #[serde(default)]
    build_finished_at: Option<String>,
}

impl From<RawPipeline> for PipelineEvent {
    fn from(raw: RawPipeline) -> Self {
        Self {
            project: ProjectKey::from_path(&raw.project.path_with_namespace),
            web_url: raw.project.web_url,
            pipeline_id: raw.object_attributes.id,
            ref_name: raw.object_attributes.ref_name,
            tag: raw.object_attributes.tag,
            status: raw.object_attributes.status,
            builds: raw
                .builds
                .into_iter()
                .map(|b| BuildRecord {
                    id: b.id,
                    status: b.status,
                    started_at: b.started_at,
                    finished_at: b.finished_at,
                })
                .collect(),
        }
    }
}

impl From<RawBuild> for BuildEvent {
    fn from(raw: RawBuild) -> Self {
        Self {
            project: ProjectKey::from_display_name(&raw.project_name),
            ref_name: raw.ref_name,
            build_id: raw.build_id,
            status: raw.build_status,
            started_at: raw.build_started_at,
            finished_at: raw.build_finished_at,
        }
    }
}
