//! Investigations: failing pipelines a human has acknowledged.
//!
//! Stored one per line as `group project id`. A project without a namespace
//! is recorded under the group `-`.

use std::{collections::HashSet, fmt, str::FromStr};

use super::ProjectKey;

/// Errors from building or parsing an investigation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvestigationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must not contain whitespace: {value:?}")]
    Whitespace { field: &'static str, value: String },

    #[error("expected `group project id`, got {0:?}")]
    Malformed(String),

    #[error("invalid id {0:?}")]
    InvalidId(String),
}

/// A suppressed radiator entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Investigation {
    group: String,
    project: String,
    id: u64,
}

impl Investigation {
    pub fn new(group: &str, project: &str, id: u64) -> Result<Self, InvestigationError> {
        Ok(Self {
            group: check_field("group", group)?,
            project: check_field("project", project)?,
            id,
        })
    }
}

fn check_field(field: &'static str, value: &str) -> Result<String, InvestigationError> {
    if value.is_empty() {
        return Err(InvestigationError::Empty { field });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(InvestigationError::Whitespace {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

impl fmt::Display for Investigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.group, self.project, self.id)
    }
}

impl FromStr for Investigation {
    type Err = InvestigationError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let (Some(group), Some(project), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(InvestigationError::Malformed(line.to_string()));
        };
        let id = id
            .parse()
            .map_err(|_| InvestigationError::InvalidId(id.to_string()))?;
        Self::new(group, project, id)
    }
}

/// The set of recorded investigations. Membership is all that matters.
#[derive(Debug, Clone, Default)]
pub struct InvestigationSet {
    entries: HashSet<Investigation>,
}

impl InvestigationSet {
    pub fn insert(&mut self, investigation: Investigation) {
        self.entries.insert(investigation);
    }

    /// Whether pipeline `id` of `project` has been acknowledged.
    pub fn is_suppressed(&self, project: &ProjectKey, id: u64) -> bool {
        self.entries.contains(&Investigation {
            group: project.group().to_string(),
            project: project.name().to_string(),
            id,
        })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Investigation> for InvestigationSet {
    fn from_iter<I: IntoIterator<Item = Investigation>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_form_round_trips() {
        let inv = Investigation::new("g", "p", 42).unwrap();
        assert_eq!(inv.to_string(), "g p 42");
        assert_eq!("g p 42".parse::<Investigation>().unwrap(), inv);
    }

    #[test]
    fn rejects_whitespace_in_fields() {
        let err = Investigation::new("my group", "p", 1).unwrap_err();
        assert!(matches!(err, InvestigationError::Whitespace { field: "group", .. }));
    }

    #[test]
    fn rejects_short_and_long_lines() {
        assert!(matches!(
            "g p".parse::<Investigation>(),
            Err(InvestigationError::Malformed(_))
        ));
        assert!(matches!(
            "g p 1 extra".parse::<Investigation>(),
            Err(InvestigationError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_id() {
        assert_eq!(
            "g p abc".parse::<Investigation>(),
            Err(InvestigationError::InvalidId("abc".into()))
        );
    }

    #[test]
    fn duplicates_collapse() {
        let set: InvestigationSet = [
            Investigation::new("g", "p", 42).unwrap(),
            Investigation::new("g", "p", 42).unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 1);
        assert!(set.is_suppressed(&ProjectKey::from_path("g/p"), 42));
        assert!(!set.is_suppressed(&ProjectKey::from_path("g/p"), 43));
        assert!(!set.is_suppressed(&ProjectKey::from_path("g/q"), 42));
    }

    #[test]
    fn nested_namespace_is_the_group() {
        let set: InvestigationSet = [Investigation::new("org/team", "svc", 5).unwrap()]
            .into_iter()
            .collect();

        assert!(set.is_suppressed(&ProjectKey::from_display_name("org / team / svc"), 5));
    }

    #[test]
    fn bare_project_is_suppressed_under_dash_group() {
        let set: InvestigationSet = ["- solo 42".parse::<Investigation>().unwrap()]
            .into_iter()
            .collect();

        assert!(set.is_suppressed(&ProjectKey::from_path("solo"), 42));
        assert!(!set.is_suppressed(&ProjectKey::from_path("g/solo"), 42));
    }
}
