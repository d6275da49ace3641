//! Validation issues and their identity keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::enums::{IssueType, Severity, ValidationGroup};
use crate::errors::CoreError;

/// One classified finding from a validation run.
///
/// Issues are re-derived fresh each run; nothing accumulates across runs
/// except via the suppression store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub issue_type: IssueType,
    pub severity: Severity,
    /// Entity id, service id, registry id, or template excerpt.
    pub subject: String,
    pub rule_id: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Build an issue at the type's default severity.
    #[must_use]
    pub fn new(
        issue_type: IssueType,
        subject: impl Into<String>,
        rule_id: &str,
        path: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity: issue_type.default_severity(),
            subject: subject.into(),
            rule_id: rule_id.to_string(),
            path: path.to_string(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach a nearest-match suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The identity key used for deduplication and suppression matching.
    #[must_use]
    pub fn key(&self) -> IssueKey {
        IssueKey {
            issue_type: self.issue_type,
            subject: self.subject.clone(),
            rule_id: self.rule_id.clone(),
            path: self.path.clone(),
        }
    }

    /// The presentation group, via the issue type.
    #[must_use]
    pub const fn group(&self) -> ValidationGroup {
        self.issue_type.group()
    }
}

/// Identity key of an issue: `(issue_type, subject, rule_id, path)`.
///
/// Serialized as `issue_type:subject:rule_id:path` for persistence and the
/// CLI suppress commands. The path segment is last so slash-joined tree paths
/// survive unescaped; subjects and rule ids never contain `:`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssueKey {
    pub issue_type: IssueType,
    pub subject: String,
    pub rule_id: String,
    pub path: String,
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.issue_type, self.subject, self.rule_id, self.path
        )
    }
}

impl FromStr for IssueKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let (Some(ty), Some(subject), Some(rule_id), Some(path)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::MalformedKey(s.to_string()));
        };
        Ok(Self {
            issue_type: ty.parse()?,
            subject: subject.to_string(),
            rule_id: rule_id.to_string(),
            path: path.to_string(),
        })
    }
}
