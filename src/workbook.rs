//! JSON workbook: a whole catalog plus its assessment groups and records in one document.
//!
//! ```json
//! {
//!   "activities": [{ "label": "Teaching & Learning", "slug": "teaching", "order": 1 }],
//!   "topics": [{ "label": "Quality", "slug": "quality", "order": 1 }],
//!   "categories": [{ "activity": "teaching", "topic": "quality" }],
//!   "choice_types": { "compliance": { "label": "Compliance", "choices": { "No": 0, "Yes": 2 } } },
//!   "questions": [{ "id": "q-visual", "category": "teaching-learning-quality", "label": "Visual" }],
//!   "metrics": [{ "id": "m-font", "question": "q-visual", "label": "Font size", "choices": "compliance" }],
//!   "groups": [],
//!   "records": []
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::assess::{
    AssessmentGroup, AssessmentRecord, AssessmentRepository, AssessmentType, GroupId, GroupRoot,
    GroupRootError, InMemoryAssessmentRepository, RecordId, RecordStatus, RepositoryError,
    ScoreValidationError, SubjectRecord,
};
use crate::builder::{
    Activity, ActivityId, AssessmentCategory, AssessmentMetric, AssessmentQuestion, Catalog,
    CatalogError, ChoiceValidationError, MetricChoices, MetricId, QuestionId, ReferenceDocument,
    ScoreMap, Status, Topic, TopicId,
};

#[derive(Debug)]
pub enum WorkbookError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Catalog(CatalogError),
    UnknownChoiceType { metric: MetricId, name: String },
    Choices { name: String, source: ChoiceValidationError },
    GroupRoot { group: GroupId, source: GroupRootError },
    UnknownGroup { record: RecordId, group: GroupId },
    InvalidScore { record: RecordId, source: ScoreValidationError },
    Repository(RepositoryError),
}

impl fmt::Display for WorkbookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkbookError::Io(err) => write!(f, "failed to read workbook: {err}"),
            WorkbookError::Json(err) => write!(f, "invalid workbook JSON: {err}"),
            WorkbookError::Catalog(err) => write!(f, "inconsistent catalog: {err}"),
            WorkbookError::UnknownChoiceType { metric, name } => {
                write!(f, "metric '{metric}' refers to unknown choice type '{name}'")
            }
            WorkbookError::Choices { name, source } => {
                write!(f, "choice type '{name}' is invalid: {source}")
            }
            WorkbookError::GroupRoot { group, source } => write!(f, "group '{group}': {source}"),
            WorkbookError::UnknownGroup { record, group } => {
                write!(f, "record '{record}' refers to unknown group '{group}'")
            }
            WorkbookError::InvalidScore { record, source } => {
                write!(f, "record '{record}' has an invalid score: {source}")
            }
            WorkbookError::Repository(err) => write!(f, "could not store workbook entry: {err}"),
        }
    }
}

impl std::error::Error for WorkbookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkbookError::Io(err) => Some(err),
            WorkbookError::Json(err) => Some(err),
            WorkbookError::Catalog(err) => Some(err),
            WorkbookError::UnknownChoiceType { .. } | WorkbookError::UnknownGroup { .. } => None,
            WorkbookError::Choices { source, .. } => Some(source),
            WorkbookError::GroupRoot { source, .. } => Some(source),
            WorkbookError::InvalidScore { source, .. } => Some(source),
            WorkbookError::Repository(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for WorkbookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for WorkbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<CatalogError> for WorkbookError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

impl From<RepositoryError> for WorkbookError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

#[derive(Debug, Deserialize)]
struct WorkbookDocument {
    #[serde(default)]
    activities: Vec<Activity>,
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    categories: Vec<AssessmentCategory>,
    #[serde(default)]
    choice_types: BTreeMap<String, ChoiceTypeEntry>,
    #[serde(default)]
    questions: Vec<AssessmentQuestion>,
    #[serde(default)]
    metrics: Vec<MetricEntry>,
    #[serde(default)]
    reference_docs: Vec<ReferenceDocument>,
    #[serde(default)]
    groups: Vec<GroupEntry>,
    #[serde(default)]
    records: Vec<AssessmentRecord<SubjectRecord>>,
}

#[derive(Debug, Deserialize)]
struct ChoiceTypeEntry {
    #[serde(default)]
    label: Option<String>,
    /// Choice label to score, either inline or as a JSON-encoded string.
    choices: Value,
}

#[derive(Debug, Deserialize)]
struct MetricEntry {
    id: MetricId,
    question: QuestionId,
    label: String,
    #[serde(default)]
    description: String,
    /// Name of a choice type; the score map itself when absent.
    #[serde(default)]
    choices: Option<String>,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    id: GroupId,
    #[serde(default)]
    activity: Option<ActivityId>,
    #[serde(default)]
    topic: Option<TopicId>,
    assessor: String,
    assessment_type: AssessmentType,
    #[serde(default)]
    status: RecordStatus,
    created: NaiveDate,
}

/// A loaded workbook: the catalog and a repository seeded with its groups and records.
pub struct Workbook {
    pub catalog: Catalog,
    pub repository: InMemoryAssessmentRepository<SubjectRecord>,
}

impl Workbook {
    pub fn from_path<P: AsRef<Path>>(path: P, scores: &ScoreMap) -> Result<Self, WorkbookError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, scores)
    }

    pub fn from_reader<R: Read>(reader: R, scores: &ScoreMap) -> Result<Self, WorkbookError> {
        let document: WorkbookDocument = serde_json::from_reader(reader)?;
        let catalog = build_catalog(&document, scores)?;
        let repository: InMemoryAssessmentRepository<SubjectRecord> =
            InMemoryAssessmentRepository::default();

        for entry in document.groups {
            let root = GroupRoot::from_parts(entry.activity, entry.topic).map_err(|source| {
                WorkbookError::GroupRoot {
                    group: entry.id.clone(),
                    source,
                }
            })?;
            repository.insert_group(AssessmentGroup {
                id: entry.id,
                root,
                assessor: entry.assessor,
                assessment_type: entry.assessment_type,
                status: entry.status,
                created: entry.created,
            })?;
        }

        for record in document.records {
            if catalog.category(&record.category).is_none() {
                return Err(CatalogError::UnknownCategory(record.category).into());
            }
            if let Some(group) = &record.group {
                if repository.fetch_group(group)?.is_none() {
                    return Err(WorkbookError::UnknownGroup {
                        record: record.id,
                        group: group.clone(),
                    });
                }
            }
            for score in &record.scores {
                score
                    .clean(&record.category, &catalog)
                    .map_err(|source| WorkbookError::InvalidScore {
                        record: record.id.clone(),
                        source,
                    })?;
            }
            repository.insert(record)?;
        }

        debug!(
            categories = catalog.active_categories().len(),
            "loaded assessment workbook"
        );
        Ok(Self {
            catalog,
            repository,
        })
    }
}

fn build_catalog(
    document: &WorkbookDocument,
    scores: &ScoreMap,
) -> Result<Catalog, WorkbookError> {
    let mut catalog = Catalog::new();
    for activity in &document.activities {
        catalog.add_activity(activity.clone())?;
    }
    for topic in &document.topics {
        catalog.add_topic(topic.clone())?;
    }
    for category in &document.categories {
        catalog.add_category(category.clone())?;
    }
    for question in &document.questions {
        catalog.add_question(question.clone())?;
    }

    let mut choice_types = BTreeMap::new();
    for (name, entry) in &document.choice_types {
        let raw = match &entry.choices {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let label = entry.label.clone().unwrap_or_else(|| name.clone());
        let choices = MetricChoices::from_json(label, &raw, scores).map_err(|source| {
            WorkbookError::Choices {
                name: name.clone(),
                source,
            }
        })?;
        choice_types.insert(name.as_str(), choices);
    }

    for entry in &document.metrics {
        let choices = match &entry.choices {
            Some(name) => choice_types
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| WorkbookError::UnknownChoiceType {
                    metric: entry.id.clone(),
                    name: name.clone(),
                })?,
            None => MetricChoices::from_score_map("Score", scores),
        };
        catalog.add_metric(AssessmentMetric {
            id: entry.id.clone(),
            question: entry.question.clone(),
            label: entry.label.clone(),
            description: entry.description.clone(),
            choices,
            order: entry.order,
            status: entry.status,
        })?;
    }

    for doc in &document.reference_docs {
        catalog.add_reference_doc(doc.clone())?;
    }
    Ok(catalog)
}
