//! Assessment catalog: the Activity x Topic matrix, its questions, and their scoring metrics.

pub mod catalog;
pub mod choices;
pub mod domain;
mod slug;
pub mod validators;

#[cfg(test)]
pub(crate) mod tests;

pub use catalog::{Catalog, CatalogError};
pub use choices::{MetricChoices, ScoreMap};
pub use domain::{
    Activity, ActivityId, AssessmentCategory, AssessmentMetric, AssessmentQuestion, CategoryId,
    Classification, MetricId, QuestionId, ReferenceDocument, Status, Topic, TopicId,
};
pub use slug::slugify;
pub use validators::ChoiceValidationError;
