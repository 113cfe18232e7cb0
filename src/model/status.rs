//! Status: the lifecycle state GitLab reports for pipelines and builds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A pipeline or build status.
///
/// GitLab grows new statuses over time (`waiting_for_resource`, `preparing`, ...),
/// so anything unrecognized is kept verbatim in `Other` and written back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Created,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
            Self::Other(s) => s,
        }
    }

    /// Waiting for a runner.
    ///
    /// Build events do not distinguish `created` from `pending`, so both count.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Created | Self::Pending)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "created" => Self::Created,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            "skipped" => Self::Skipped,
            "manual" => Self::Manual,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        assert_eq!(Status::from("failed"), Status::Failed);
        assert_eq!(Status::from("created"), Status::Created);
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status: Status = serde_json::from_str("\"waiting_for_resource\"").unwrap();
        assert_eq!(status, Status::Other("waiting_for_resource".into()));
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"waiting_for_resource\""
        );
    }

    #[test]
    fn created_and_pending_are_queued() {
        assert!(Status::Created.is_queued());
        assert!(Status::Pending.is_queued());
        assert!(!Status::Running.is_queued());
    }
}
