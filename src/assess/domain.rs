use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::subject::{AssessmentSubject, SubjectRecord};
use crate::builder::{
    ActivityId, AssessmentCategory, AssessmentMetric, AssessmentQuestion, Catalog, CategoryId,
    MetricId, ReferenceDocument, TopicId,
};
use crate::scoring::{mean_score, score_class, ScoreClasses, Scored};

/// Identifier wrapper for assessment records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

/// Identifier wrapper for assessment groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentType {
    #[serde(rename = "qa")]
    QualityAssurance,
    #[serde(rename = "qc")]
    QualityControl,
}

impl AssessmentType {
    pub const fn code(self) -> &'static str {
        match self {
            AssessmentType::QualityAssurance => "qa",
            AssessmentType::QualityControl => "qc",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AssessmentType::QualityAssurance => "Quality Assurance",
            AssessmentType::QualityControl => "Quality Control",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Draft,
    Complete,
}

impl RecordStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RecordStatus::Draft => "Draft",
            RecordStatus::Complete => "Complete",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    None,
    Spreadsheet,
    Notes,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentType::None => "None / Missing",
            DocumentType::Spreadsheet => "Spreadsheet",
            DocumentType::Notes => "Notes",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentLocation {
    #[default]
    Attached,
    Url,
}

impl DocumentLocation {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentLocation::Attached => "Attached",
            DocumentLocation::Url => "Link",
        }
    }
}

/// Paper trail for how a metric score was derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingDoc {
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub document_location: DocumentLocation,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Storage path of an attached file.
    #[serde(default)]
    pub file: Option<String>,
}

impl SupportingDoc {
    /// Where the document can be fetched: the attached file first, then the link.
    pub fn href(&self) -> Option<&str> {
        self.file.as_deref().or(self.url.as_deref())
    }
}

impl fmt::Display for SupportingDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(url) = &self.url {
            return f.write_str(url);
        }
        if let Some(file) = &self.file {
            let name = Path::new(file)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(file);
            return f.write_str(name);
        }
        f.write_str(&self.description)
    }
}

/// Storage path for a supporting document attachment:
/// `support_docs/<category slug>/<metric slug>/<year>/<filename>`.
pub fn supporting_doc_directory_path(
    category: &AssessmentCategory,
    metric: &AssessmentMetric,
    year: i32,
    filename: &str,
) -> String {
    format!(
        "support_docs/{}/{}/{}/{}",
        category.slug,
        metric.slug(),
        year,
        filename
    )
}

/// Score recorded for one metric within a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: MetricId,
    #[serde(default = "default_applicable")]
    pub applicable: bool,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub docs: Vec<SupportingDoc>,
}

fn default_applicable() -> bool {
    true
}

impl MetricScore {
    pub fn new(metric: MetricId, score: u8) -> Self {
        Self {
            metric,
            applicable: true,
            score,
            comments: String::new(),
            docs: Vec::new(),
        }
    }

    /// The score, or "N/A" when the metric does not apply.
    pub fn display_score(&self) -> String {
        if self.applicable {
            self.score.to_string()
        } else {
            "N/A".to_string()
        }
    }

    pub fn score_class(&self) -> String {
        score_class(self)
    }

    /// Check the metric belongs to `category` and, when it applies, that the score is one of the
    /// metric's choices.
    pub fn clean(
        &self,
        category: &CategoryId,
        catalog: &Catalog,
    ) -> Result<(), ScoreValidationError> {
        let metric = catalog
            .metric(&self.metric)
            .ok_or_else(|| ScoreValidationError::UnknownMetric(self.metric.clone()))?;

        let metric_category = catalog
            .question(&metric.question)
            .map(|question| &question.category);
        if metric_category != Some(category) {
            return Err(ScoreValidationError::WrongCategory {
                metric: self.metric.clone(),
                category: category.clone(),
            });
        }

        if self.applicable && !metric.validate(self.score) {
            return Err(ScoreValidationError::InvalidScore {
                metric: self.metric.clone(),
                score: self.score,
                choices: metric.choices.to_string(),
            });
        }
        Ok(())
    }
}

impl Scored for MetricScore {
    fn applicable(&self) -> bool {
        self.applicable
    }

    fn score(&self) -> u8 {
        self.score
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreValidationError {
    #[error("unknown metric '{0}'")]
    UnknownMetric(MetricId),
    #[error("invalid metric '{metric}' for assessment in category {category}")]
    WrongCategory { metric: MetricId, category: CategoryId },
    #[error("invalid score {score} for metric '{metric}' ({choices})")]
    InvalidScore {
        metric: MetricId,
        score: u8,
        choices: String,
    },
}

/// A single assessment of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord<S = SubjectRecord> {
    pub id: RecordId,
    pub category: CategoryId,
    #[serde(default)]
    pub group: Option<GroupId>,
    pub assessor: String,
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub status: RecordStatus,
    pub created: NaiveDate,
    pub last_edited: DateTime<Utc>,
    pub last_edited_by: String,
    pub subject: Option<S>,
    #[serde(default)]
    pub scores: Vec<MetricScore>,
    /// Aggregate computed ahead of time by the host; preferred over re-averaging `scores`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<f64>,
}

impl<S> AssessmentRecord<S> {
    pub fn applicable_scores(&self) -> impl Iterator<Item = &MetricScore> {
        self.scores.iter().filter(|score| score.applicable)
    }

    /// Mean of the applicable scores; `0.0` when nothing applies yet.
    pub fn assessment_score(&self) -> f64 {
        mean_score(&self.scores, self.avg_score)
    }

    pub fn score_class<'c>(&self, classes: &'c ScoreClasses) -> &'c str {
        classes.classify(Some(self.assessment_score()))
    }

    pub fn is_in_assessment_group(&self) -> bool {
        self.group.is_some()
    }

    pub fn has_subject(&self) -> bool {
        self.subject.is_some()
    }

    pub fn score(&self, metric: &MetricId) -> Option<&MetricScore> {
        self.scores.iter().find(|score| &score.metric == metric)
    }

    pub fn score_mut(&mut self, metric: &MetricId) -> Option<&mut MetricScore> {
        self.scores.iter_mut().find(|score| &score.metric == metric)
    }

    /// Scores grouped under their questions, in question order.
    pub fn scores_by_question<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> Vec<(&'a AssessmentQuestion, Vec<&'a MetricScore>)> {
        catalog
            .questions_for(&self.category)
            .into_iter()
            .map(|question| {
                let scores: Vec<&MetricScore> = self
                    .scores
                    .iter()
                    .filter(|score| {
                        catalog
                            .metric(&score.metric)
                            .is_some_and(|metric| metric.question == question.id)
                    })
                    .collect();
                (question, scores)
            })
            .filter(|(_, scores)| !scores.is_empty())
            .collect()
    }
}

impl<S: AssessmentSubject> fmt::Display for AssessmentRecord<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = self
            .subject
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        write!(
            f,
            "{} ({}): {}",
            subject,
            self.category,
            self.created.format("%b-%Y")
        )
    }
}

/// The single activity or topic an assessment group spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRoot {
    Activity(ActivityId),
    Topic(TopicId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assessment group must define either an activity or a topic, not both")]
pub struct GroupRootError;

impl GroupRoot {
    /// Exactly one of `activity` and `topic` must be given.
    pub fn from_parts(
        activity: Option<ActivityId>,
        topic: Option<TopicId>,
    ) -> Result<Self, GroupRootError> {
        match (activity, topic) {
            (Some(activity), None) => Ok(GroupRoot::Activity(activity)),
            (None, Some(topic)) => Ok(GroupRoot::Topic(topic)),
            _ => Err(GroupRootError),
        }
    }
}

/// A batch of records covering every active category of one activity or one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentGroup {
    pub id: GroupId,
    pub root: GroupRoot,
    pub assessor: String,
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub status: RecordStatus,
    pub created: NaiveDate,
}

impl AssessmentGroup {
    pub fn is_activity_group(&self) -> bool {
        matches!(self.root, GroupRoot::Activity(_))
    }

    pub fn is_topic_group(&self) -> bool {
        matches!(self.root, GroupRoot::Topic(_))
    }

    /// Label of the activity or topic at the root of the group.
    pub fn root_label<'a>(&self, catalog: &'a Catalog) -> Option<&'a str> {
        match &self.root {
            GroupRoot::Activity(id) => catalog.activity(id).map(|a| a.0.label.as_str()),
            GroupRoot::Topic(id) => catalog.topic(id).map(|t| t.0.label.as_str()),
        }
    }

    /// Active categories covered by this group.
    pub fn category_set<'a>(&self, catalog: &'a Catalog) -> Vec<&'a AssessmentCategory> {
        match &self.root {
            GroupRoot::Activity(id) => catalog.categories_for_activity(id),
            GroupRoot::Topic(id) => catalog.categories_for_topic(id),
        }
    }

    pub fn metric_set<'a>(&self, catalog: &'a Catalog) -> Vec<&'a AssessmentMetric> {
        self.category_set(catalog)
            .into_iter()
            .flat_map(|category| catalog.metrics_for_category(&category.id()))
            .collect()
    }

    pub fn reference_docs<'a>(&self, catalog: &'a Catalog) -> Vec<&'a ReferenceDocument> {
        match &self.root {
            GroupRoot::Activity(id) => catalog.reference_docs_for_activity(id),
            GroupRoot::Topic(id) => catalog.reference_docs_for_topic(id),
        }
    }

    /// Mean over every metric score of every record in the group.
    pub fn group_score<S>(&self, records: &[AssessmentRecord<S>]) -> f64 {
        mean_score(self.member_scores(records), None)
    }

    pub fn score_class<'c, S>(
        &self,
        records: &[AssessmentRecord<S>],
        classes: &'c ScoreClasses,
    ) -> &'c str {
        classes.classify(Some(self.group_score(records)))
    }

    /// The member record edited most recently.
    pub fn last_edited_assessment<'r, S>(
        &self,
        records: &'r [AssessmentRecord<S>],
    ) -> Option<&'r AssessmentRecord<S>> {
        records
            .iter()
            .filter(|record| record.group.as_ref() == Some(&self.id))
            .max_by_key(|record| record.last_edited)
    }

    /// Subject of the first member record.
    pub fn subject<'r, S>(&self, records: &'r [AssessmentRecord<S>]) -> Option<&'r S> {
        records
            .iter()
            .filter(|record| record.group.as_ref() == Some(&self.id))
            .find_map(|record| record.subject.as_ref())
    }

    fn member_scores<'r, S>(
        &'r self,
        records: &'r [AssessmentRecord<S>],
    ) -> impl Iterator<Item = &'r MetricScore> {
        records
            .iter()
            .filter(move |record| record.group.as_ref() == Some(&self.id))
            .flat_map(|record| record.scores.iter())
    }
}
