use std::collections::BTreeMap;

use super::domain::{
    Activity, ActivityId, AssessmentCategory, AssessmentMetric, AssessmentQuestion, CategoryId,
    MetricId, QuestionId, ReferenceDocument, Topic, TopicId,
};
use crate::matrix::{index_vector, sparse_to_option_matrix, LayoutError};
use crate::report::MatrixView;

/// Error raised when a catalog entry conflicts with, or refers to something missing from, the
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{kind} with slug '{slug}' already exists")]
    DuplicateSlug { kind: &'static str, slug: String },
    #[error("an active {kind} labelled '{label}' already exists")]
    DuplicateLabel { kind: &'static str, label: String },
    #[error("a category for activity '{activity}' and topic '{topic}' already exists")]
    DuplicateCategory { activity: ActivityId, topic: TopicId },
    #[error("unknown activity '{0}'")]
    UnknownActivity(ActivityId),
    #[error("unknown topic '{0}'")]
    UnknownTopic(TopicId),
    #[error("unknown category '{0}'")]
    UnknownCategory(CategoryId),
    #[error("unknown question '{0}'")]
    UnknownQuestion(QuestionId),
    #[error("unknown metric '{0}'")]
    UnknownMetric(MetricId),
}

/// In-memory catalog of the Activity x Topic matrix and everything hanging off it.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    activities: BTreeMap<ActivityId, Activity>,
    topics: BTreeMap<TopicId, Topic>,
    categories: BTreeMap<CategoryId, AssessmentCategory>,
    questions: BTreeMap<QuestionId, AssessmentQuestion>,
    metrics: BTreeMap<MetricId, AssessmentMetric>,
    reference_docs: Vec<ReferenceDocument>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_activity(&mut self, activity: Activity) -> Result<ActivityId, CatalogError> {
        let id = activity.id();
        if self.activities.contains_key(&id) {
            return Err(CatalogError::DuplicateSlug {
                kind: "activity",
                slug: id.0,
            });
        }
        if activity.0.is_active()
            && self
                .activities
                .values()
                .any(|other| other.0.is_active() && other.0.label == activity.0.label)
        {
            return Err(CatalogError::DuplicateLabel {
                kind: "activity",
                label: activity.0.label,
            });
        }
        self.activities.insert(id.clone(), activity);
        Ok(id)
    }

    pub fn add_topic(&mut self, topic: Topic) -> Result<TopicId, CatalogError> {
        let id = topic.id();
        if self.topics.contains_key(&id) {
            return Err(CatalogError::DuplicateSlug {
                kind: "topic",
                slug: id.0,
            });
        }
        if topic.0.is_active()
            && self
                .topics
                .values()
                .any(|other| other.0.is_active() && other.0.label == topic.0.label)
        {
            return Err(CatalogError::DuplicateLabel {
                kind: "topic",
                label: topic.0.label,
            });
        }
        self.topics.insert(id.clone(), topic);
        Ok(id)
    }

    /// Register a category, defaulting a blank label to "Activity - Topic" and a blank slug to
    /// the slugified label.
    pub fn add_category(
        &mut self,
        mut category: AssessmentCategory,
    ) -> Result<CategoryId, CatalogError> {
        let activity = self
            .activities
            .get(&category.activity)
            .ok_or_else(|| CatalogError::UnknownActivity(category.activity.clone()))?;
        let topic = self
            .topics
            .get(&category.topic)
            .ok_or_else(|| CatalogError::UnknownTopic(category.topic.clone()))?;

        if self.category_for(&category.activity, &category.topic).is_some() {
            return Err(CatalogError::DuplicateCategory {
                activity: category.activity,
                topic: category.topic,
            });
        }

        category.apply_defaults(activity, topic);
        let id = category.id();
        if self.categories.contains_key(&id) {
            return Err(CatalogError::DuplicateSlug {
                kind: "category",
                slug: id.0,
            });
        }
        self.categories.insert(id.clone(), category);
        Ok(id)
    }

    pub fn add_question(&mut self, question: AssessmentQuestion) -> Result<(), CatalogError> {
        if !self.categories.contains_key(&question.category) {
            return Err(CatalogError::UnknownCategory(question.category));
        }
        if self.questions.contains_key(&question.id) {
            return Err(CatalogError::DuplicateSlug {
                kind: "question",
                slug: question.id.0,
            });
        }
        self.questions.insert(question.id.clone(), question);
        Ok(())
    }

    pub fn add_metric(&mut self, metric: AssessmentMetric) -> Result<(), CatalogError> {
        if !self.questions.contains_key(&metric.question) {
            return Err(CatalogError::UnknownQuestion(metric.question));
        }
        if self.metrics.contains_key(&metric.id) {
            return Err(CatalogError::DuplicateSlug {
                kind: "metric",
                slug: metric.id.0,
            });
        }
        self.metrics.insert(metric.id.clone(), metric);
        Ok(())
    }

    pub fn add_reference_doc(&mut self, doc: ReferenceDocument) -> Result<(), CatalogError> {
        if !self.categories.contains_key(&doc.category) {
            return Err(CatalogError::UnknownCategory(doc.category));
        }
        self.reference_docs.push(doc);
        Ok(())
    }

    pub fn activity(&self, id: &ActivityId) -> Option<&Activity> {
        self.activities.get(id)
    }

    pub fn topic(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.get(id)
    }

    pub fn category(&self, id: &CategoryId) -> Option<&AssessmentCategory> {
        self.categories.get(id)
    }

    pub fn question(&self, id: &QuestionId) -> Option<&AssessmentQuestion> {
        self.questions.get(id)
    }

    pub fn metric(&self, id: &MetricId) -> Option<&AssessmentMetric> {
        self.metrics.get(id)
    }

    pub fn category_for(
        &self,
        activity: &ActivityId,
        topic: &TopicId,
    ) -> Option<&AssessmentCategory> {
        self.categories
            .values()
            .find(|category| &category.activity == activity && &category.topic == topic)
    }

    /// Active activities in display order.
    pub fn active_activities(&self) -> Vec<&Activity> {
        let mut activities: Vec<&Activity> = self
            .activities
            .values()
            .filter(|activity| activity.0.is_active())
            .collect();
        activities.sort_by(|a, b| (a.0.order, &a.0.slug).cmp(&(b.0.order, &b.0.slug)));
        activities
    }

    /// Active topics in display order.
    pub fn active_topics(&self) -> Vec<&Topic> {
        let mut topics: Vec<&Topic> = self
            .topics
            .values()
            .filter(|topic| topic.0.is_active())
            .collect();
        topics.sort_by(|a, b| (a.0.order, &a.0.slug).cmp(&(b.0.order, &b.0.slug)));
        topics
    }

    /// Categories that are active themselves and whose activity and topic are active too.
    pub fn active_categories(&self) -> Vec<&AssessmentCategory> {
        self.categories
            .values()
            .filter(|category| self.is_category_active(category))
            .collect()
    }

    pub fn is_category_active(&self, category: &AssessmentCategory) -> bool {
        category.status.is_active()
            && self
                .activities
                .get(&category.activity)
                .is_some_and(|activity| activity.0.is_active())
            && self
                .topics
                .get(&category.topic)
                .is_some_and(|topic| topic.0.is_active())
    }

    pub fn categories_for_activity(&self, activity: &ActivityId) -> Vec<&AssessmentCategory> {
        let mut categories: Vec<&AssessmentCategory> = self
            .active_categories()
            .into_iter()
            .filter(|category| &category.activity == activity)
            .collect();
        categories.sort_by_key(|category| self.topic(&category.topic).map(|t| t.0.order));
        categories
    }

    pub fn categories_for_topic(&self, topic: &TopicId) -> Vec<&AssessmentCategory> {
        let mut categories: Vec<&AssessmentCategory> = self
            .active_categories()
            .into_iter()
            .filter(|category| &category.topic == topic)
            .collect();
        categories.sort_by_key(|category| self.activity(&category.activity).map(|a| a.0.order));
        categories
    }

    /// Every question of a category, whatever its status, in display order.
    pub fn questions_for(&self, category: &CategoryId) -> Vec<&AssessmentQuestion> {
        let mut questions: Vec<&AssessmentQuestion> = self
            .questions
            .values()
            .filter(|question| &question.category == category)
            .collect();
        questions.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));
        questions
    }

    pub fn metrics_for_question(&self, question: &QuestionId) -> Vec<&AssessmentMetric> {
        let mut metrics: Vec<&AssessmentMetric> = self
            .metrics
            .values()
            .filter(|metric| &metric.question == question)
            .collect();
        metrics.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));
        metrics
    }

    /// Metrics of a category ordered by question, then by metric.
    pub fn metrics_for_category(&self, category: &CategoryId) -> Vec<&AssessmentMetric> {
        self.questions_for(category)
            .into_iter()
            .flat_map(|question| self.metrics_for_question(&question.id))
            .collect()
    }

    pub fn question_count(&self, category: &CategoryId) -> usize {
        self.questions
            .values()
            .filter(|question| &question.category == category)
            .count()
    }

    pub fn metric_count(&self, question: &QuestionId) -> usize {
        self.metrics
            .values()
            .filter(|metric| &metric.question == question)
            .count()
    }

    pub fn reference_docs_for(&self, category: &CategoryId) -> Vec<&ReferenceDocument> {
        let mut docs: Vec<&ReferenceDocument> = self
            .reference_docs
            .iter()
            .filter(|doc| &doc.category == category)
            .collect();
        docs.sort_by_key(|doc| doc.order);
        docs
    }

    /// Reference documents for every category of an activity.
    pub fn reference_docs_for_activity(&self, activity: &ActivityId) -> Vec<&ReferenceDocument> {
        self.reference_docs
            .iter()
            .filter(|doc| {
                self.categories
                    .get(&doc.category)
                    .is_some_and(|category| &category.activity == activity)
            })
            .collect()
    }

    /// Reference documents for every category of a topic.
    pub fn reference_docs_for_topic(&self, topic: &TopicId) -> Vec<&ReferenceDocument> {
        self.reference_docs
            .iter()
            .filter(|doc| {
                self.categories
                    .get(&doc.category)
                    .is_some_and(|category| &category.topic == topic)
            })
            .collect()
    }

    /// Active categories laid out with topics as rows and activities as columns.
    pub fn category_matrix(&self) -> Result<MatrixView<Option<&AssessmentCategory>>, LayoutError> {
        let topics = self.active_topics();
        let activities = self.active_activities();
        let row_index = index_vector(topics.iter().map(|topic| topic.id()))?;
        let col_index = index_vector(activities.iter().map(|activity| activity.id()))?;

        let mut categories = self.active_categories();
        categories.sort_by_key(|category| {
            (
                row_index.position(&category.topic),
                col_index.position(&category.activity),
            )
        });

        let cells = sparse_to_option_matrix(
            categories,
            &row_index,
            |category| category.topic.clone(),
            &col_index,
            |category| category.activity.clone(),
        )?;

        Ok(MatrixView {
            rows: topics.iter().map(|topic| topic.0.label.clone()).collect(),
            columns: activities
                .iter()
                .map(|activity| activity.0.label.clone())
                .collect(),
            cells,
        })
    }
}
