use crate::builder::{
    Activity, AssessmentCategory, AssessmentMetric, AssessmentQuestion, Catalog, Classification,
    MetricChoices, MetricId, QuestionId, ReferenceDocument, ScoreMap, Status, Topic,
};

pub(crate) const TEACHING_QUALITY: &str = "teaching-learning-quality";
pub(crate) const TEACHING_COST: &str = "teaching-learning-cost";
pub(crate) const RESEARCH_QUALITY: &str = "research-quality";
pub(crate) const RESEARCH_EXPERIENCE: &str = "research-experience";
pub(crate) const OUTREACH_COST: &str = "outreach-cost";

pub(crate) fn activity(label: &str, slug: &str, order: u32) -> Activity {
    Activity(Classification::new(label, slug, order))
}

pub(crate) fn topic(label: &str, slug: &str, order: u32) -> Topic {
    Topic(Classification::new(label, slug, order))
}

pub(crate) fn question(id: &str, category: &str, order: u32) -> AssessmentQuestion {
    AssessmentQuestion {
        id: QuestionId::from(id),
        category: category.into(),
        label: format!("Question {id}"),
        description: format!("How well does the {id} requirement hold?"),
        order,
        status: Status::Active,
    }
}

pub(crate) fn metric(id: &str, question: &str, order: u32) -> AssessmentMetric {
    AssessmentMetric {
        id: MetricId::from(id),
        question: question.into(),
        label: format!("Metric {id}"),
        description: String::new(),
        choices: MetricChoices::from_score_map("Compliance", &ScoreMap::default()),
        order,
        status: Status::Active,
    }
}

/// Three activities (one retired) by three topics, with five categories populated.
pub(crate) fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    catalog
        .add_activity(activity("Teaching & Learning", "teaching", 1))
        .expect("teaching");
    catalog
        .add_activity(activity("Research", "research", 2))
        .expect("research");
    let mut outreach = activity("Outreach", "outreach", 3);
    outreach.0.status = Status::Retired;
    catalog.add_activity(outreach).expect("outreach");

    catalog.add_topic(topic("Quality", "quality", 1)).expect("quality");
    catalog.add_topic(topic("Cost", "cost", 2)).expect("cost");
    catalog
        .add_topic(topic("Experience", "experience", 3))
        .expect("experience");

    for (activity, topic) in [
        ("teaching", "quality"),
        ("teaching", "cost"),
        ("research", "quality"),
        ("outreach", "cost"),
    ] {
        catalog
            .add_category(AssessmentCategory::new(activity.into(), topic.into()))
            .expect("category");
    }
    let mut retired = AssessmentCategory::new("research".into(), "experience".into());
    retired.status = Status::Retired;
    catalog.add_category(retired).expect("retired category");

    catalog
        .add_question(question("q-visual", TEACHING_QUALITY, 1))
        .expect("q-visual");
    catalog
        .add_question(question("q-pace", TEACHING_QUALITY, 2))
        .expect("q-pace");
    catalog
        .add_question(question("q-budget", TEACHING_COST, 1))
        .expect("q-budget");
    catalog
        .add_question(question("q-output", RESEARCH_QUALITY, 1))
        .expect("q-output");

    catalog.add_metric(metric("m-font", "q-visual", 1)).expect("m-font");
    catalog
        .add_metric(metric("m-contrast", "q-visual", 2))
        .expect("m-contrast");
    catalog.add_metric(metric("m-pace", "q-pace", 1)).expect("m-pace");
    catalog
        .add_metric(metric("m-budget", "q-budget", 1))
        .expect("m-budget");
    catalog
        .add_metric(metric("m-papers", "q-output", 1))
        .expect("m-papers");

    catalog
        .add_reference_doc(ReferenceDocument {
            category: TEACHING_QUALITY.into(),
            label: "SOP Classroom Safety".to_string(),
            description: String::new(),
            url: "https://docs.example.com/sop/classroom-safety.pdf".to_string(),
            order: 1,
        })
        .expect("reference doc");

    catalog
}
