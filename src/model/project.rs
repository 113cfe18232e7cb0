//! Project keys: one canonical name per GitLab project.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Group recorded for a project whose key has no namespace.
const BARE_GROUP: &str = "-";

/// Canonical `namespace/name` key for a project.
///
/// Pipeline events identify a project by `path_with_namespace` (`group/app`),
/// build events by a display name (`group / app`). Both normalize here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    /// From a pipeline event's `path_with_namespace`.
    pub fn from_path(path: &str) -> Self {
        Self(path.to_string())
    }

    /// From a build event's `project_name`.
    pub fn from_display_name(name: &str) -> Self {
        Self(name.replace(" / ", "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last `/`. Empty for a bare name.
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(ns, _)| ns)
    }

    /// The namespace as written in investigation lines, `-` for a bare name.
    pub fn group(&self) -> &str {
        match self.namespace() {
            "" => BARE_GROUP,
            ns => ns,
        }
    }

    /// The last path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_normalizes_to_path() {
        assert_eq!(
            ProjectKey::from_display_name("Platform / web-app"),
            ProjectKey::from_path("Platform/web-app")
        );
    }

    #[test]
    fn splits_namespace_and_name() {
        let key = ProjectKey::from_path("g/p");
        assert_eq!(key.namespace(), "g");
        assert_eq!(key.group(), "g");
        assert_eq!(key.name(), "p");
    }

    #[test]
    fn nested_groups_keep_full_namespace() {
        let key = ProjectKey::from_display_name("org / team / svc");
        assert_eq!(key.namespace(), "org/team");
        assert_eq!(key.name(), "svc");
    }

    #[test]
    fn bare_name_has_empty_namespace() {
        let key = ProjectKey::from_path("solo");
        assert_eq!(key.namespace(), "");
        assert_eq!(key.group(), "-");
        assert_eq!(key.name(), "solo");
    }
}
