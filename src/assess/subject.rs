use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::RecordId;
use crate::builder::slugify;

/// What an assessment record is about: a person, a project, a course.
///
/// Hosts with a richer notion of subject implement this for their own type; the crate only needs
/// a stable identity, a display string, and the back-reference to the owning record.
pub trait AssessmentSubject: fmt::Display + Clone + Send + Sync {
    fn identity(&self) -> String;

    fn record(&self) -> Option<&RecordId>;

    /// Copy of this subject attached to another record.
    fn with_record(&self, record: RecordId) -> Self;
}

/// Default subject: a short label with an optional description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
}

impl SubjectRecord {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: String::new(),
            record: None,
        }
    }
}

impl fmt::Display for SubjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl AssessmentSubject for SubjectRecord {
    fn identity(&self) -> String {
        match &self.record {
            Some(record) => format!("subject-{record}"),
            None => format!("subject-{}", slugify(&self.label)),
        }
    }

    fn record(&self) -> Option<&RecordId> {
        self.record.as_ref()
    }

    fn with_record(&self, record: RecordId) -> Self {
        Self {
            record: Some(record),
            ..self.clone()
        }
    }
}
