use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{AssessmentGroup, AssessmentRecord, GroupId, RecordId};
use super::subject::{AssessmentSubject, SubjectRecord};
use crate::builder::CategoryId;

/// Storage abstraction so the service can be exercised without a database.
pub trait AssessmentRepository: Send + Sync {
    type Subject: AssessmentSubject;

    fn insert(
        &self,
        record: AssessmentRecord<Self::Subject>,
    ) -> Result<AssessmentRecord<Self::Subject>, RepositoryError>;
    fn update(&self, record: AssessmentRecord<Self::Subject>) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RecordId)
        -> Result<Option<AssessmentRecord<Self::Subject>>, RepositoryError>;
    fn delete(&self, id: &RecordId) -> Result<AssessmentRecord<Self::Subject>, RepositoryError>;
    /// Records of one category, newest first.
    fn records_for_category(
        &self,
        category: &CategoryId,
    ) -> Result<Vec<AssessmentRecord<Self::Subject>>, RepositoryError>;
    fn records_for_group(
        &self,
        group: &GroupId,
    ) -> Result<Vec<AssessmentRecord<Self::Subject>>, RepositoryError>;

    fn insert_group(&self, group: AssessmentGroup) -> Result<AssessmentGroup, RepositoryError>;
    fn update_group(&self, group: AssessmentGroup) -> Result<(), RepositoryError>;
    fn fetch_group(&self, id: &GroupId) -> Result<Option<AssessmentGroup>, RepositoryError>;
    /// Remove a group together with its member records.
    fn delete_group(&self, id: &GroupId) -> Result<AssessmentGroup, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Mutex-guarded maps; good enough for tests, demos and the command line.
pub struct InMemoryAssessmentRepository<S = SubjectRecord> {
    records: Arc<Mutex<BTreeMap<RecordId, AssessmentRecord<S>>>>,
    groups: Arc<Mutex<BTreeMap<GroupId, AssessmentGroup>>>,
    _subject: PhantomData<fn() -> S>,
}

impl<S> Default for InMemoryAssessmentRepository<S> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            groups: Arc::new(Mutex::new(BTreeMap::new())),
            _subject: PhantomData,
        }
    }
}

impl<S> Clone for InMemoryAssessmentRepository<S> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            groups: Arc::clone(&self.groups),
            _subject: PhantomData,
        }
    }
}

impl<S> InMemoryAssessmentRepository<S> {
    fn records(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<RecordId, AssessmentRecord<S>>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("record store lock poisoned".to_string()))
    }

    fn groups(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<GroupId, AssessmentGroup>>, RepositoryError> {
        self.groups
            .lock()
            .map_err(|_| RepositoryError::Unavailable("group store lock poisoned".to_string()))
    }
}

impl<S> AssessmentRepository for InMemoryAssessmentRepository<S>
where
    S: AssessmentSubject + 'static,
{
    type Subject = S;

    fn insert(&self, record: AssessmentRecord<S>) -> Result<AssessmentRecord<S>, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: AssessmentRecord<S>) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<AssessmentRecord<S>>, RepositoryError> {
        Ok(self.records()?.get(id).cloned())
    }

    fn delete(&self, id: &RecordId) -> Result<AssessmentRecord<S>, RepositoryError> {
        self.records()?.remove(id).ok_or(RepositoryError::NotFound)
    }

    fn records_for_category(
        &self,
        category: &CategoryId,
    ) -> Result<Vec<AssessmentRecord<S>>, RepositoryError> {
        let mut records: Vec<AssessmentRecord<S>> = self
            .records()?
            .values()
            .filter(|record| &record.category == category)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    fn records_for_group(
        &self,
        group: &GroupId,
    ) -> Result<Vec<AssessmentRecord<S>>, RepositoryError> {
        Ok(self
            .records()?
            .values()
            .filter(|record| record.group.as_ref() == Some(group))
            .cloned()
            .collect())
    }

    fn insert_group(&self, group: AssessmentGroup) -> Result<AssessmentGroup, RepositoryError> {
        let mut guard = self.groups()?;
        if guard.contains_key(&group.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    fn update_group(&self, group: AssessmentGroup) -> Result<(), RepositoryError> {
        let mut guard = self.groups()?;
        match guard.get_mut(&group.id) {
            Some(existing) => {
                *existing = group;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_group(&self, id: &GroupId) -> Result<Option<AssessmentGroup>, RepositoryError> {
        Ok(self.groups()?.get(id).cloned())
    }

    fn delete_group(&self, id: &GroupId) -> Result<AssessmentGroup, RepositoryError> {
        let group = self.groups()?.remove(id).ok_or(RepositoryError::NotFound)?;
        self.records()?
            .retain(|_, record| record.group.as_ref() != Some(id));
        Ok(group)
    }
}
