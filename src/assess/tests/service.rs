use std::sync::Arc;

use chrono::Utc;

use super::common::{date, editor, new_assessment, record, service, service_with, staff, viewer};
use crate::assess::{
    AssessmentRepository, AssessmentSubject, AssessmentType, DocumentType, GroupRoot, NewGroup,
    RecordStatus, RecordUpdate, ScoreUpdate, ServiceError, SubjectRecord, SupportingDoc,
};
use crate::builder::tests::common::{
    metric, sample_catalog, RESEARCH_EXPERIENCE, RESEARCH_QUALITY, TEACHING_COST,
    TEACHING_QUALITY,
};
use crate::builder::{ActivityId, CatalogError, MetricChoices, MetricId, ScoreMap, TopicId};
use crate::permissions::{Action, PermissionDenied, User};

#[test]
fn create_record_builds_a_full_score_set() {
    let (service, _) = service();

    let record = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("record created");

    let metrics: Vec<&str> = record.scores.iter().map(|score| score.metric.0.as_str()).collect();
    assert_eq!(metrics, vec!["m-font", "m-contrast", "m-pace"]);
    assert!(record.scores.iter().all(|score| score.applicable && score.score == 0));
    assert_eq!(record.status, RecordStatus::Draft);
    assert_eq!(record.last_edited_by, "ada");
    assert!(record.id.0.starts_with("rec-"));

    let subject = record.subject.as_ref().expect("subject attached");
    assert_eq!(subject.record(), Some(&record.id));
    assert_eq!(subject.identity(), format!("subject-{}", record.id));
}

#[test]
fn create_record_rejects_inactive_categories() {
    let (service, _) = service();

    let err = service
        .create_record(&staff(), new_assessment(RESEARCH_EXPERIENCE))
        .expect_err("retired category");
    assert!(matches!(
        err,
        ServiceError::InactiveCategory(category) if category.0 == RESEARCH_EXPERIENCE
    ));

    let err = service
        .create_record(&staff(), new_assessment("no-such-category"))
        .expect_err("unknown category");
    assert!(matches!(err, ServiceError::Catalog(CatalogError::UnknownCategory(_))));
}

#[test]
fn operations_check_permissions() {
    let (service, _) = service();

    let err = service
        .create_record(&editor(), new_assessment(TEACHING_QUALITY))
        .expect_err("editors cannot create");
    assert!(matches!(
        err,
        ServiceError::PermissionDenied(PermissionDenied {
            action: Action::Create,
            ..
        })
    ));

    let record = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("created");
    assert!(service.get_record(&viewer(), &record.id).is_ok());
    assert!(matches!(
        service.get_record(&User::anonymous(), &record.id),
        Err(ServiceError::PermissionDenied(_))
    ));
    assert!(matches!(
        service.delete_record(&editor(), &record.id),
        Err(ServiceError::PermissionDenied(_))
    ));

    let context = service.permissions_for(&editor());
    assert!(context.can_view && context.can_edit);
    assert!(!context.can_create && !context.can_delete);
}

#[test]
fn update_scores_validates_and_recomputes() {
    let (service, repository) = service();
    let record = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("created");

    let mut stale = repository.fetch(&record.id).expect("fetch").expect("stored");
    stale.avg_score = Some(0.1);
    repository.update(stale).expect("seed precomputed mean");

    let updated = service
        .update_scores(
            &editor(),
            &record.id,
            RecordUpdate {
                status: Some(RecordStatus::Complete),
                scores: vec![
                    ScoreUpdate::new("m-font", 2),
                    ScoreUpdate::new("m-contrast", 1),
                    ScoreUpdate::not_applicable("m-pace"),
                ],
            },
        )
        .expect("scores updated");

    assert_eq!(updated.status, RecordStatus::Complete);
    assert_eq!(updated.avg_score, None);
    assert_eq!(updated.last_edited_by, "grace");

    let summary = service
        .record_summary(&viewer(), &record.id)
        .expect("summary");
    assert!((summary.mean - 1.5).abs() < f64::EPSILON);
    assert_eq!(summary.label, "satisfactory");
    assert_eq!((summary.applicable, summary.total), (2, 3));
}

#[test]
fn rejected_score_updates_leave_the_record_untouched() {
    let (service, repository) = service();
    let record = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("created");

    let err = service
        .update_scores(
            &staff(),
            &record.id,
            RecordUpdate {
                status: None,
                scores: vec![ScoreUpdate::new("m-font", 2), ScoreUpdate::new("m-pace", 9)],
            },
        )
        .expect_err("score 9 is not a choice");
    assert!(matches!(err, ServiceError::InvalidScore(_)));

    let err = service
        .update_scores(
            &staff(),
            &record.id,
            RecordUpdate {
                status: None,
                scores: vec![ScoreUpdate::new("m-papers", 1)],
            },
        )
        .expect_err("metric outside the record");
    assert!(matches!(err, ServiceError::UnknownScore { metric, .. } if metric.0 == "m-papers"));

    let stored = repository.fetch(&record.id).expect("fetch").expect("stored");
    assert_eq!(stored, record);
}

#[test]
fn not_applicable_keeps_the_stored_score_when_zero_is_not_a_choice() {
    let mut catalog = sample_catalog();
    let partial = ScoreMap::new([(1, "Partly".to_string()), (2, "Yes".to_string())].into())
        .expect("score map");
    let mut coverage = metric("m-coverage", "q-budget", 2);
    coverage.choices = MetricChoices::from_score_map("YN", &partial);
    catalog.add_metric(coverage).expect("m-coverage");
    let (service, _) = service_with(catalog);

    let record = service
        .create_record(&staff(), new_assessment(TEACHING_COST))
        .expect("created");
    let coverage = MetricId::from("m-coverage");
    assert_eq!(record.score(&coverage).expect("coverage").score, 1);

    let updated = service
        .update_scores(
            &editor(),
            &record.id,
            RecordUpdate {
                status: None,
                scores: vec![
                    ScoreUpdate::new("m-budget", 2),
                    ScoreUpdate::not_applicable("m-coverage"),
                ],
            },
        )
        .expect("metric marked not applicable");

    let score = updated.score(&coverage).expect("coverage");
    assert!(!score.applicable);
    assert_eq!(score.score, 1);
    assert_eq!(score.display_score(), "N/A");
    assert!((updated.assessment_score() - 2.0).abs() < f64::EPSILON);
}

#[test]
fn create_record_skips_identifiers_already_stored() {
    let (service, repository) = service();
    let seeded: Vec<_> = (1..=64)
        .map(|n| {
            repository
                .insert(record(&format!("rec-{n:06}"), TEACHING_QUALITY, date(2024, 1, 5), vec![]))
                .expect("seeded")
                .id
        })
        .collect();

    let created = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("created past the seeded identifiers");

    assert!(!seeded.contains(&created.id));
    let stored = repository.fetch(&created.id).expect("fetch").expect("stored");
    assert_eq!(stored.assessor, "ada");
    assert_eq!(stored.scores.len(), 3);
    assert_eq!(
        repository
            .records_for_category(&TEACHING_QUALITY.into())
            .expect("records")
            .len(),
        65
    );
}

#[test]
fn documents_attach_to_a_single_score() {
    let (service, _) = service();
    let record = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("created");

    let doc = SupportingDoc {
        document_type: DocumentType::Notes,
        url: Some("https://docs.example.com/audit".to_string()),
        ..SupportingDoc::default()
    };
    let updated = service
        .attach_document(&editor(), &record.id, &MetricId::from("m-contrast"), doc.clone())
        .expect("attached");

    let contrast = updated
        .score(&MetricId::from("m-contrast"))
        .expect("contrast score");
    assert_eq!(contrast.docs, vec![doc]);
    assert!(updated
        .score(&MetricId::from("m-font"))
        .expect("font score")
        .docs
        .is_empty());
}

#[test]
fn groups_fan_out_over_active_categories_and_share_status() {
    let (service, repository) = service();

    let (group, records) = service
        .create_group(
            &staff(),
            NewGroup {
                root: GroupRoot::Activity(ActivityId::from("teaching")),
                assessor: "ada".to_string(),
                assessment_type: AssessmentType::QualityControl,
                status: RecordStatus::Draft,
                subject: Some(SubjectRecord::new("Spring term")),
            },
        )
        .expect("group created");

    let mut categories: Vec<&str> = records
        .iter()
        .map(|record| record.category.0.as_str())
        .collect();
    categories.sort_unstable();
    assert_eq!(categories, vec![TEACHING_COST, TEACHING_QUALITY]);
    assert!(records.iter().all(|record| {
        record.group.as_ref() == Some(&group.id)
            && record.assessment_type == AssessmentType::QualityControl
            && record.subject.as_ref().and_then(|subject| subject.record()) == Some(&record.id)
    }));

    let extra = service
        .extend_group(&staff(), &group.id, None)
        .expect("nothing left to cover");
    assert!(extra.is_empty());

    service
        .update_group_status(&editor(), &group.id, RecordStatus::Complete)
        .expect("status propagated");
    let members = repository.records_for_group(&group.id).expect("members");
    assert_eq!(members.len(), 2);
    assert!(members
        .iter()
        .all(|record| record.status == RecordStatus::Complete));

    let summary = service.group_summary(&viewer(), &group.id).expect("summary");
    assert_eq!((summary.applicable, summary.total), (4, 4));
    assert_eq!(summary.label, "fail");

    service.delete_group(&staff(), &group.id).expect("deleted");
    assert!(repository
        .records_for_group(&group.id)
        .expect("members")
        .is_empty());
}

#[test]
fn groups_require_a_known_root() {
    let (service, _) = service();

    let err = service
        .create_group(
            &staff(),
            NewGroup {
                root: GroupRoot::Topic(TopicId::from("sustainability")),
                assessor: "ada".to_string(),
                assessment_type: AssessmentType::QualityAssurance,
                status: RecordStatus::Draft,
                subject: None,
            },
        )
        .expect_err("unknown topic");
    assert!(matches!(err, ServiceError::Catalog(CatalogError::UnknownTopic(_))));
}

#[test]
fn score_matrix_shows_the_latest_record_per_category() {
    let (service, repository) = service();

    let older = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("older");
    let mut aged = repository.fetch(&older.id).expect("fetch").expect("stored");
    aged.created = aged.created.pred_opt().expect("previous day");
    aged.avg_score = Some(2.0);
    repository.update(aged).expect("age record");

    let latest = service
        .create_record(&staff(), new_assessment(TEACHING_QUALITY))
        .expect("latest");
    service
        .create_record(&staff(), new_assessment(RESEARCH_QUALITY))
        .expect("research");

    let matrix = service.score_matrix(&viewer()).expect("matrix");
    assert_eq!(matrix.rows, vec!["Quality", "Cost", "Experience"]);
    assert_eq!(matrix.columns, vec!["Teaching & Learning", "Research"]);

    let teaching_quality = matrix.cell(0, 0).and_then(Option::as_ref).expect("scored cell");
    assert_eq!(teaching_quality.record, latest.id);
    assert_eq!(teaching_quality.label, "fail");
    assert!(matrix.cell(0, 1).and_then(Option::as_ref).is_some());
    assert!(matrix.cell(1, 0).and_then(Option::as_ref).is_none());
    assert!(matrix.cell(2, 1).and_then(Option::as_ref).is_none());
}

#[test]
fn services_share_storage_through_the_repository() {
    let (service, repository) = service();
    let record = service
        .create_record(&staff(), new_assessment(TEACHING_COST))
        .expect("created");

    assert_eq!(Arc::strong_count(&repository), 2);
    let stored = repository.fetch(&record.id).expect("fetch").expect("stored");
    assert!(stored.last_edited <= Utc::now());
}
