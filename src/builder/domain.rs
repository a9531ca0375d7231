use std::fmt;

use serde::{Deserialize, Serialize};

use super::choices::MetricChoices;
use super::slug::slugify;

macro_rules! slug_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

slug_id!(
    /// Slug identifying an [`Activity`].
    ActivityId
);
slug_id!(
    /// Slug identifying a [`Topic`].
    TopicId
);
slug_id!(
    /// Slug identifying an [`AssessmentCategory`].
    CategoryId
);
slug_id!(QuestionId);
slug_id!(MetricId);

/// Publication status for catalog entries; only active entries are offered to assessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    #[default]
    Active,
    Retired,
}

impl Status {
    pub const fn label(self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Active => "Active",
            Status::Retired => "Retired",
        }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, Status::Active)
    }
}

/// Fields shared by the two axes of the assessment matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: Status,
}

impl Classification {
    pub fn new(label: impl Into<String>, slug: impl Into<String>, order: u32) -> Self {
        Self {
            label: label.into(),
            slug: slug.into(),
            description: String::new(),
            order,
            status: Status::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Kind of activity being assessed, e.g. "Teaching & Learning". Columns of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Activity(pub Classification);

impl Activity {
    pub fn id(&self) -> ActivityId {
        ActivityId(self.0.slug.clone())
    }
}

/// Concern an activity is assessed against, e.g. "Quality". Rows of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(pub Classification);

impl Topic {
    pub fn id(&self) -> TopicId {
        TopicId(self.0.slug.clone())
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.label)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.label)
    }
}

/// One Activity / Topic cell of the matrix; questions are grouped under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentCategory {
    pub activity: ActivityId,
    pub topic: TopicId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
}

impl AssessmentCategory {
    pub fn new(activity: ActivityId, topic: TopicId) -> Self {
        Self {
            activity,
            topic,
            label: String::new(),
            slug: String::new(),
            description: String::new(),
            status: Status::Active,
        }
    }

    pub fn id(&self) -> CategoryId {
        CategoryId(self.slug.clone())
    }

    pub fn default_label(activity: &Activity, topic: &Topic) -> String {
        format!("{activity} - {topic}")
    }

    /// Fill a blank label and slug from the owning activity and topic.
    pub(crate) fn apply_defaults(&mut self, activity: &Activity, topic: &Topic) {
        if self.label.trim().is_empty() {
            self.label = Self::default_label(activity, topic);
        }
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.label);
        }
    }
}

impl fmt::Display for AssessmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Link to documentation that helps assessors complete a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub category: CategoryId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    pub id: QuestionId,
    pub category: CategoryId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: Status,
}

impl fmt::Display for AssessmentQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.description)
    }
}

/// A single scorable criterion within a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentMetric {
    pub id: MetricId,
    pub question: QuestionId,
    pub label: String,
    pub description: String,
    pub choices: MetricChoices,
    pub order: u32,
    pub status: Status,
}

impl AssessmentMetric {
    pub fn slug(&self) -> String {
        slugify(&self.label)
    }

    /// True iff `score` is one of this metric's choices.
    pub fn validate(&self, score: u8) -> bool {
        self.choices.validate(score)
    }

    pub fn choice_display(&self, score: u8) -> Option<&str> {
        self.choices.choice_display(score)
    }
}

impl fmt::Display for AssessmentMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
