use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    AssessmentGroup, AssessmentRecord, AssessmentType, GroupId, GroupRoot, MetricScore, RecordId,
    RecordStatus, ScoreValidationError, SupportingDoc,
};
use super::repository::{AssessmentRepository, RepositoryError};
use super::subject::AssessmentSubject;
use crate::builder::{AssessmentMetric, Catalog, CatalogError, CategoryId, MetricId, ScoreMap};
use crate::matrix::LayoutError;
use crate::permissions::{
    permission_required, Action, AssessmentPermissions, DefaultPermissions, PermissionDenied,
    PermissionsContext, User,
};
use crate::report::{MatrixView, ScoreCell};
use crate::scoring::{ScoreClasses, ScoreSummary};

/// Service composing the catalog, record storage, scoring configuration and permission checks.
pub struct AssessmentService<R, P = DefaultPermissions> {
    catalog: Arc<Catalog>,
    repository: Arc<R>,
    permissions: Arc<P>,
    classes: Arc<ScoreClasses>,
    score_map: Arc<ScoreMap>,
}

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static GROUP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_record_id() -> RecordId {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RecordId(format!("rec-{id:06}"))
}

fn next_group_id() -> GroupId {
    let id = GROUP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    GroupId(format!("grp-{id:06}"))
}

/// Request to open a single assessment record.
#[derive(Debug, Clone)]
pub struct NewAssessment<S> {
    pub category: CategoryId,
    pub assessor: String,
    pub assessment_type: AssessmentType,
    pub subject: Option<S>,
}

/// Request to open an assessment group; its records are stamped out from this template.
#[derive(Debug, Clone)]
pub struct NewGroup<S> {
    pub root: GroupRoot,
    pub assessor: String,
    pub assessment_type: AssessmentType,
    pub status: RecordStatus,
    pub subject: Option<S>,
}

/// Edit of one metric score. `score: None` keeps the stored score, which is how a metric is
/// marked not applicable without touching its last real value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub metric: MetricId,
    pub applicable: bool,
    pub score: Option<u8>,
    pub comments: Option<String>,
}

impl ScoreUpdate {
    pub fn new(metric: impl Into<MetricId>, score: u8) -> Self {
        Self {
            metric: metric.into(),
            applicable: true,
            score: Some(score),
            comments: None,
        }
    }

    pub fn not_applicable(metric: impl Into<MetricId>) -> Self {
        Self {
            metric: metric.into(),
            applicable: false,
            score: None,
            comments: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub status: Option<RecordStatus>,
    pub scores: Vec<ScoreUpdate>,
}

impl<R, P> AssessmentService<R, P>
where
    R: AssessmentRepository + 'static,
    P: AssessmentPermissions + 'static,
{
    pub fn new(catalog: Arc<Catalog>, repository: Arc<R>, permissions: Arc<P>) -> Self {
        Self::with_scoring(
            catalog,
            repository,
            permissions,
            ScoreClasses::default(),
            ScoreMap::default(),
        )
    }

    pub fn with_scoring(
        catalog: Arc<Catalog>,
        repository: Arc<R>,
        permissions: Arc<P>,
        classes: ScoreClasses,
        score_map: ScoreMap,
    ) -> Self {
        Self {
            catalog,
            repository,
            permissions,
            classes: Arc::new(classes),
            score_map: Arc::new(score_map),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn classes(&self) -> &ScoreClasses {
        &self.classes
    }

    pub fn permissions_for(&self, user: &User) -> PermissionsContext {
        PermissionsContext::for_user(self.permissions.as_ref(), user)
    }

    /// Open a record for an active category with one unscored entry per metric.
    pub fn create_record(
        &self,
        user: &User,
        request: NewAssessment<R::Subject>,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        self.check(Action::Create, user)?;
        let stored = self.insert_record(user, &request, None, RecordStatus::Draft)?;
        info!(record = %stored.id, category = %stored.category, "created assessment record");
        Ok(stored)
    }

    pub fn get_record(
        &self,
        user: &User,
        id: &RecordId,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        self.check(Action::View, user)?;
        self.fetch_record(id)
    }

    /// Records of one category, newest first.
    pub fn records_for_category(
        &self,
        user: &User,
        category: &CategoryId,
    ) -> Result<Vec<AssessmentRecord<R::Subject>>, ServiceError> {
        self.check(Action::View, user)?;
        Ok(self.repository.records_for_category(category)?)
    }

    pub fn records_for_group(
        &self,
        user: &User,
        group: &GroupId,
    ) -> Result<Vec<AssessmentRecord<R::Subject>>, ServiceError> {
        self.check(Action::View, user)?;
        Ok(self.repository.records_for_group(group)?)
    }

    /// Apply score edits after validating each against the catalog.
    ///
    /// Nothing is stored when any edit is rejected. A stored precomputed mean is discarded since
    /// it no longer matches the scores.
    pub fn update_scores(
        &self,
        user: &User,
        id: &RecordId,
        update: RecordUpdate,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        self.check(Action::Edit, user)?;
        let mut record = self.fetch_record(id)?;

        for edit in update.scores {
            let category = record.category.clone();
            let Some(current) = record.score_mut(&edit.metric) else {
                return Err(ServiceError::UnknownScore {
                    record: id.clone(),
                    metric: edit.metric,
                });
            };

            let mut candidate = current.clone();
            candidate.applicable = edit.applicable;
            if let Some(score) = edit.score {
                candidate.score = score;
            }
            if let Some(comments) = edit.comments {
                candidate.comments = comments;
            }
            if let Err(err) = candidate.clean(&category, &self.catalog) {
                warn!(
                    record = %id,
                    metric = %candidate.metric,
                    error = %err,
                    "rejected score update"
                );
                return Err(err.into());
            }
            *current = candidate;
        }

        if let Some(status) = update.status {
            record.status = status;
        }
        record.avg_score = None;
        self.touch(&mut record, user);
        self.repository.update(record.clone())?;
        debug!(record = %id, mean = record.assessment_score(), "updated assessment scores");
        Ok(record)
    }

    pub fn attach_document(
        &self,
        user: &User,
        id: &RecordId,
        metric: &MetricId,
        doc: SupportingDoc,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        self.check(Action::Edit, user)?;
        let mut record = self.fetch_record(id)?;
        let score = record
            .score_mut(metric)
            .ok_or_else(|| ServiceError::UnknownScore {
                record: id.clone(),
                metric: metric.clone(),
            })?;
        score.docs.push(doc);
        self.touch(&mut record, user);
        self.repository.update(record.clone())?;
        Ok(record)
    }

    pub fn delete_record(
        &self,
        user: &User,
        id: &RecordId,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        self.check(Action::Delete, user)?;
        let removed = self.repository.delete(id)?;
        info!(record = %id, "deleted assessment record");
        Ok(removed)
    }

    /// Open a group and one record for every active category under its root.
    pub fn create_group(
        &self,
        user: &User,
        request: NewGroup<R::Subject>,
    ) -> Result<(AssessmentGroup, Vec<AssessmentRecord<R::Subject>>), ServiceError> {
        self.check(Action::Create, user)?;
        match &request.root {
            GroupRoot::Activity(id) if self.catalog.activity(id).is_none() => {
                return Err(CatalogError::UnknownActivity(id.clone()).into());
            }
            GroupRoot::Topic(id) if self.catalog.topic(id).is_none() => {
                return Err(CatalogError::UnknownTopic(id.clone()).into());
            }
            _ => {}
        }

        let created = Local::now().date_naive();
        let group = loop {
            let group = AssessmentGroup {
                id: next_group_id(),
                root: request.root.clone(),
                assessor: request.assessor.clone(),
                assessment_type: request.assessment_type,
                status: request.status,
                created,
            };
            match self.repository.insert_group(group) {
                Err(RepositoryError::Conflict) => continue,
                stored => break stored?,
            }
        };
        info!(group = %group.id, "created assessment group");

        let records = self.fill_group(user, &group, request.subject)?;
        Ok((group, records))
    }

    /// Add records for categories of the group's root that no member record covers yet, for
    /// instance after a category was introduced.
    pub fn extend_group(
        &self,
        user: &User,
        id: &GroupId,
        subject: Option<R::Subject>,
    ) -> Result<Vec<AssessmentRecord<R::Subject>>, ServiceError> {
        self.check(Action::Create, user)?;
        let group = self.fetch_group(id)?;
        let subject = match subject {
            Some(subject) => Some(subject),
            None => {
                let members = self.repository.records_for_group(id)?;
                group.subject(&members).cloned()
            }
        };
        self.fill_group(user, &group, subject)
    }

    /// Set the group's status and propagate it to every member record.
    pub fn update_group_status(
        &self,
        user: &User,
        id: &GroupId,
        status: RecordStatus,
    ) -> Result<AssessmentGroup, ServiceError> {
        self.check(Action::Edit, user)?;
        let mut group = self.fetch_group(id)?;
        group.status = status;
        self.repository.update_group(group.clone())?;

        for mut record in self.repository.records_for_group(id)? {
            record.status = status;
            self.touch(&mut record, user);
            self.repository.update(record)?;
        }
        info!(group = %id, status = status.label(), "updated assessment group status");
        Ok(group)
    }

    pub fn delete_group(&self, user: &User, id: &GroupId) -> Result<AssessmentGroup, ServiceError> {
        self.check(Action::Delete, user)?;
        let removed = self.repository.delete_group(id)?;
        info!(group = %id, "deleted assessment group and its records");
        Ok(removed)
    }

    pub fn record_summary(&self, user: &User, id: &RecordId) -> Result<ScoreSummary, ServiceError> {
        self.check(Action::View, user)?;
        let record = self.fetch_record(id)?;
        let summary = self.classes.summarize(&record.scores, record.avg_score);
        debug!(
            record = %id,
            mean = summary.mean,
            label = %summary.label,
            "computed record summary"
        );
        Ok(summary)
    }

    pub fn group_summary(&self, user: &User, id: &GroupId) -> Result<ScoreSummary, ServiceError> {
        self.check(Action::View, user)?;
        let group = self.fetch_group(id)?;
        let records = self.repository.records_for_group(&group.id)?;
        let summary = self
            .classes
            .summarize(records.iter().flat_map(|record| record.scores.iter()), None);
        debug!(group = %id, mean = summary.mean, label = %summary.label, "computed group summary");
        Ok(summary)
    }

    /// Topics x activities grid holding the latest assessment of each active category.
    pub fn score_matrix(&self, user: &User) -> Result<MatrixView<Option<ScoreCell>>, ServiceError> {
        self.check(Action::View, user)?;
        let layout = self.catalog.category_matrix()?;

        let mut cells = Vec::with_capacity(layout.cells.len());
        for row in &layout.cells {
            let mut scored = Vec::with_capacity(row.len());
            for category in row {
                let cell = match category {
                    Some(category) => self.latest_cell(&category.id())?,
                    None => None,
                };
                scored.push(cell);
            }
            cells.push(scored);
        }

        Ok(MatrixView {
            rows: layout.rows,
            columns: layout.columns,
            cells,
        })
    }

    fn check(&self, action: Action, user: &User) -> Result<(), PermissionDenied> {
        permission_required(self.permissions.as_ref(), action, user)
    }

    fn fetch_record(&self, id: &RecordId) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn fetch_group(&self, id: &GroupId) -> Result<AssessmentGroup, ServiceError> {
        self.repository
            .fetch_group(id)?
            .ok_or_else(|| ServiceError::UnknownGroup(id.clone()))
    }

    fn touch(&self, record: &mut AssessmentRecord<R::Subject>, user: &User) {
        record.last_edited = Utc::now();
        record.last_edited_by = user.username.clone();
    }

    fn default_score(&self, metric: &AssessmentMetric) -> u8 {
        metric
            .choices
            .choices()
            .next()
            .map(|(score, _)| score)
            .unwrap_or_else(|| self.score_map.default_score())
    }

    /// Store a freshly built record, skipping identifiers the repository already holds.
    fn insert_record(
        &self,
        user: &User,
        request: &NewAssessment<R::Subject>,
        group: Option<GroupId>,
        status: RecordStatus,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        loop {
            let record = self.build_record(user, request, group.clone(), status)?;
            match self.repository.insert(record) {
                Err(RepositoryError::Conflict) => {
                    debug!("record identifier already taken, trying the next one");
                }
                stored => return Ok(stored?),
            }
        }
    }

    fn build_record(
        &self,
        user: &User,
        request: &NewAssessment<R::Subject>,
        group: Option<GroupId>,
        status: RecordStatus,
    ) -> Result<AssessmentRecord<R::Subject>, ServiceError> {
        let category = self
            .catalog
            .category(&request.category)
            .ok_or_else(|| CatalogError::UnknownCategory(request.category.clone()))?;
        if !self.catalog.is_category_active(category) {
            return Err(ServiceError::InactiveCategory(request.category.clone()));
        }

        let id = next_record_id();
        let scores = self
            .catalog
            .metrics_for_category(&request.category)
            .into_iter()
            .map(|metric| MetricScore::new(metric.id.clone(), self.default_score(metric)))
            .collect();

        Ok(AssessmentRecord {
            subject: request
                .subject
                .as_ref()
                .map(|subject| subject.with_record(id.clone())),
            id,
            category: request.category.clone(),
            group,
            assessor: request.assessor.clone(),
            assessment_type: request.assessment_type,
            status,
            created: Local::now().date_naive(),
            last_edited: Utc::now(),
            last_edited_by: user.username.clone(),
            scores,
            avg_score: None,
        })
    }

    fn fill_group(
        &self,
        user: &User,
        group: &AssessmentGroup,
        subject: Option<R::Subject>,
    ) -> Result<Vec<AssessmentRecord<R::Subject>>, ServiceError> {
        let covered: BTreeSet<CategoryId> = self
            .repository
            .records_for_group(&group.id)?
            .into_iter()
            .map(|record| record.category)
            .collect();

        let mut created = Vec::new();
        for category in group.category_set(&self.catalog) {
            let category = category.id();
            if covered.contains(&category) {
                continue;
            }
            let request = NewAssessment {
                category,
                assessor: group.assessor.clone(),
                assessment_type: group.assessment_type,
                subject: subject.clone(),
            };
            created.push(self.insert_record(
                user,
                &request,
                Some(group.id.clone()),
                group.status,
            )?);
        }
        debug!(group = %group.id, created = created.len(), "filled assessment group");
        Ok(created)
    }

    fn latest_cell(&self, category: &CategoryId) -> Result<Option<ScoreCell>, ServiceError> {
        let records = self.repository.records_for_category(category)?;
        let latest = records.iter().max_by(|a, b| {
            (a.created, a.last_edited)
                .cmp(&(b.created, b.last_edited))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(latest.map(|record| ScoreCell {
            category: category.clone(),
            record: record.id.clone(),
            mean: record.assessment_score(),
            label: record.score_class(&self.classes).to_string(),
        }))
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    InvalidScore(#[from] ScoreValidationError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("category '{0}' is not active")]
    InactiveCategory(CategoryId),
    #[error("record '{record}' has no score for metric '{metric}'")]
    UnknownScore { record: RecordId, metric: MetricId },
    #[error("unknown assessment group '{0}'")]
    UnknownGroup(GroupId),
}
