use std::fmt;
use std::sync::Arc;

use assessment_matrix::assess::{
    AssessmentRepository, AssessmentService, AssessmentSubject, AssessmentType,
    InMemoryAssessmentRepository, NewAssessment, RecordId, RecordStatus, RecordUpdate,
    ScoreUpdate, ServiceError,
};
use assessment_matrix::builder::{
    Activity, AssessmentCategory, AssessmentMetric, AssessmentQuestion, Catalog, CategoryId,
    Classification, MetricChoices, MetricId, QuestionId, ScoreMap, Status, Topic,
};
use assessment_matrix::matrix::{index_vector, sparse_to_full_matrix, sparse_to_full_vector};
use assessment_matrix::permissions::{AssessmentPermissions, User};
use assessment_matrix::scoring::{mean_score, ScoreClass, ScoreClasses, ScoredItem};

#[derive(Debug, Clone, PartialEq)]
struct Course {
    code: String,
    record: Option<RecordId>,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Course {}", self.code)
    }
}

impl AssessmentSubject for Course {
    fn identity(&self) -> String {
        format!("course-{}", self.code.to_lowercase())
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

/// Only users named in the roster may touch records.
struct Roster(Vec<&'static str>);

impl Roster {
    fn listed(&self, user: &User) -> bool {
        self.0.contains(&user.username.as_str())
    }
}

impl AssessmentPermissions for Roster {
    fn can_view(&self, _user: &User) -> bool {
        true
    }

    fn can_create(&self, user: &User) -> bool {
        self.listed(user)
    }

    fn can_edit(&self, user: &User) -> bool {
        self.listed(user)
    }

    fn can_delete(&self, _user: &User) -> bool {
        false
    }
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .add_activity(Activity(Classification::new("Lectures", "lectures", 1)))
        .expect("activity");
    catalog
        .add_topic(Topic(Classification::new("Accessibility", "accessibility", 1)))
        .expect("topic");
    let category = catalog
        .add_category(AssessmentCategory::new("lectures".into(), "accessibility".into()))
        .expect("category");
    catalog
        .add_question(AssessmentQuestion {
            id: QuestionId::from("captions"),
            category: category.clone(),
            label: "Captions".to_string(),
            description: "Recorded lectures carry captions".to_string(),
            order: 1,
            status: Status::Active,
        })
        .expect("question");

    let scores = ScoreMap::default();
    for (id, order) in [("captions-present", 1), ("captions-accurate", 2)] {
        catalog
            .add_metric(AssessmentMetric {
                id: MetricId::from(id),
                question: QuestionId::from("captions"),
                label: id.replace('-', " "),
                description: String::new(),
                choices: MetricChoices::from_json(
                    "Coverage",
                    r#"{"None": 0, "Some": 1, "All": 2}"#,
                    &scores,
                )
                .expect("choices"),
                order,
                status: Status::Active,
            })
            .expect("metric");
    }
    catalog
}

#[test]
fn matrix_engine_lays_out_sparse_rows() {
    let columns = index_vector(["mon", "tue", "wed"]).expect("unique columns");
    let row = sparse_to_full_vector(vec![("wed", 3), ("mon", 1)], &columns, |cell| cell.0, ("", 0))
        .expect("row");
    assert_eq!(row, vec![("mon", 1), ("", 0), ("wed", 3)]);

    let rows = index_vector(["am", "pm"]).expect("unique rows");
    let grid = sparse_to_full_matrix(
        vec![("pm", "tue", 'x')],
        &rows,
        |cell| cell.0,
        &columns,
        |cell| cell.1,
        ("", "", '.'),
    )
    .expect("grid");
    let symbols: Vec<String> = grid
        .iter()
        .map(|row| row.iter().map(|cell| cell.2).collect())
        .collect();
    assert_eq!(symbols, vec!["...", ".x."]);
}

#[test]
fn scoring_engine_classifies_with_custom_boundaries() {
    let classes = ScoreClasses::new(vec![
        ScoreClass::new(f64::INFINITY, "strong"),
        ScoreClass::new(1.0, "weak"),
    ])
    .expect("boundaries");
    let items = [ScoredItem::new(true, 1), ScoredItem::new(true, 2), ScoredItem::new(false, 0)];

    let mean = mean_score(items, None);
    assert!((mean - 1.5).abs() < f64::EPSILON);
    assert_eq!(classes.classify(Some(mean)), "strong");
    assert_eq!(classes.classify(Some(1.0)), "weak");
    assert_eq!(classes.classify(None), "weak");
}

#[test]
fn hosts_plug_in_their_own_subjects_and_permissions() {
    let repository: Arc<InMemoryAssessmentRepository<Course>> =
        Arc::new(InMemoryAssessmentRepository::default());
    let service = AssessmentService::new(
        Arc::new(catalog()),
        Arc::clone(&repository),
        Arc::new(Roster(vec!["ada"])),
    );
    let ada = User::authenticated("ada");

    let record = service
        .create_record(
            &ada,
            NewAssessment {
                category: CategoryId::from("lectures-accessibility"),
                assessor: "ada".to_string(),
                assessment_type: AssessmentType::QualityControl,
                subject: Some(Course {
                    code: "CHEM101".to_string(),
                    record: None,
                }),
            },
        )
        .expect("record created");
    assert_eq!(record.scores.len(), 2);
    assert_eq!(
        record.subject.as_ref().map(|course| course.identity()),
        Some("course-chem101".to_string())
    );

    let updated = service
        .update_scores(
            &ada,
            &record.id,
            RecordUpdate {
                status: Some(RecordStatus::Complete),
                scores: vec![
                    ScoreUpdate::new("captions-present", 2),
                    ScoreUpdate::new("captions-accurate", 1),
                ],
            },
        )
        .expect("scores updated");
    assert_eq!(
        updated.to_string(),
        format!(
            "Course CHEM101 (lectures-accessibility): {}",
            updated.created.format("%b-%Y")
        )
    );

    let summary = service.record_summary(&ada, &record.id).expect("summary");
    assert!((summary.mean - 1.5).abs() < f64::EPSILON);
    assert_eq!(summary.label, "satisfactory");

    let stranger = User::staff("mallory");
    assert!(matches!(
        service.update_scores(&stranger, &record.id, RecordUpdate::default()),
        Err(ServiceError::PermissionDenied(_))
    ));
    assert!(matches!(
        service.delete_record(&ada, &record.id),
        Err(ServiceError::PermissionDenied(_))
    ));
    assert!(repository.fetch(&record.id).expect("fetch").is_some());
}
