use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::assess::{
    AssessmentRecord, AssessmentService, AssessmentType, InMemoryAssessmentRepository,
    MetricScore, NewAssessment, RecordId, RecordStatus, SubjectRecord,
};
use crate::builder::tests::common::sample_catalog;
use crate::builder::{Catalog, CategoryId};
use crate::permissions::{DefaultPermissions, User, CHANGE_RECORD};

pub(super) type TestService = AssessmentService<InMemoryAssessmentRepository, DefaultPermissions>;

pub(super) fn service() -> (TestService, Arc<InMemoryAssessmentRepository>) {
    service_with(sample_catalog())
}

pub(super) fn service_with(catalog: Catalog) -> (TestService, Arc<InMemoryAssessmentRepository>) {
    let repository: Arc<InMemoryAssessmentRepository> =
        Arc::new(InMemoryAssessmentRepository::default());
    let service = AssessmentService::new(
        Arc::new(catalog),
        Arc::clone(&repository),
        Arc::new(DefaultPermissions::default()),
    );
    (service, repository)
}

pub(super) fn staff() -> User {
    User::staff("ada")
}

pub(super) fn editor() -> User {
    User::authenticated("grace").with_permission(CHANGE_RECORD)
}

pub(super) fn viewer() -> User {
    User::authenticated("linus")
}

pub(super) fn new_assessment(category: &str) -> NewAssessment<SubjectRecord> {
    NewAssessment {
        category: CategoryId::from(category),
        assessor: "ada".to_string(),
        assessment_type: AssessmentType::QualityAssurance,
        subject: Some(SubjectRecord::new("Intro to Chemistry")),
    }
}

/// Record built by hand, bypassing the service.
pub(super) fn record(
    id: &str,
    category: &str,
    created: NaiveDate,
    scores: Vec<MetricScore>,
) -> AssessmentRecord {
    AssessmentRecord {
        id: RecordId(id.to_string()),
        category: CategoryId::from(category),
        group: None,
        assessor: "ada".to_string(),
        assessment_type: AssessmentType::QualityControl,
        status: RecordStatus::Draft,
        created,
        last_edited: Utc
            .with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
        last_edited_by: "ada".to_string(),
        subject: None,
        scores,
        avg_score: None,
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn scored(metric: &str, score: u8) -> MetricScore {
    MetricScore::new(metric.into(), score)
}

pub(super) fn not_applicable(metric: &str) -> MetricScore {
    MetricScore {
        applicable: false,
        ..scored(metric, 0)
    }
}
