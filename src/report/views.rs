use serde::Serialize;

use crate::assess::{AssessmentGroup, AssessmentRecord, AssessmentSubject, GroupId, RecordId};
use crate::builder::{Catalog, CategoryId};
use crate::scoring::{ScoreClasses, ScoreSummary};

/// A dense grid with a label for every row and column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixView<T> {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<T>>,
}

impl<T> MatrixView<T> {
    pub fn cell(&self, row: usize, column: usize) -> Option<&T> {
        self.cells.get(row).and_then(|cells| cells.get(column))
    }

    pub fn rows_with_labels(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.rows
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    pub fn map<U, F>(self, mut f: F) -> MatrixView<U>
    where
        F: FnMut(T) -> U,
    {
        MatrixView {
            rows: self.rows,
            columns: self.columns,
            cells: self
                .cells
                .into_iter()
                .map(|row| row.into_iter().map(&mut f).collect())
                .collect(),
        }
    }
}

/// Latest assessment of one category, as shown in the score matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCell {
    pub category: CategoryId,
    pub record: RecordId,
    pub mean: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreLineView {
    pub question: String,
    pub metric: String,
    pub score: String,
    pub score_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummaryView {
    pub record: RecordId,
    pub title: String,
    pub category: String,
    pub assessment_type: &'static str,
    pub status: &'static str,
    pub summary: ScoreSummary,
    pub scores: Vec<ScoreLineView>,
}

impl RecordSummaryView {
    pub fn build<S: AssessmentSubject>(
        record: &AssessmentRecord<S>,
        catalog: &Catalog,
        classes: &ScoreClasses,
    ) -> Self {
        let category = catalog
            .category(&record.category)
            .map(|category| category.label.clone())
            .unwrap_or_else(|| record.category.to_string());

        let scores = record
            .scores_by_question(catalog)
            .into_iter()
            .flat_map(|(question, scores)| {
                scores.into_iter().map(move |score| {
                    let metric = catalog.metric(&score.metric);
                    ScoreLineView {
                        question: question.label.clone(),
                        metric: metric
                            .map(|metric| metric.label.clone())
                            .unwrap_or_else(|| score.metric.to_string()),
                        score: score.display_score(),
                        score_class: score.score_class(),
                        choice: metric
                            .filter(|_| score.applicable)
                            .and_then(|metric| metric.choice_display(score.score))
                            .map(str::to_string),
                        comments: score.comments.clone(),
                    }
                })
            })
            .collect();

        Self {
            record: record.id.clone(),
            title: record.to_string(),
            category,
            assessment_type: record.assessment_type.label(),
            status: record.status.label(),
            summary: classes.summarize(&record.scores, record.avg_score),
            scores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummaryView {
    pub group: GroupId,
    pub root: String,
    pub assessment_type: &'static str,
    pub status: &'static str,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub summary: ScoreSummary,
}

impl GroupSummaryView {
    pub fn build<S: AssessmentSubject>(
        group: &AssessmentGroup,
        records: &[AssessmentRecord<S>],
        catalog: &Catalog,
        classes: &ScoreClasses,
    ) -> Self {
        let members = records
            .iter()
            .filter(|record| record.group.as_ref() == Some(&group.id));
        let scores = members.clone().flat_map(|record| record.scores.iter());

        Self {
            group: group.id.clone(),
            root: group.root_label(catalog).unwrap_or_default().to_string(),
            assessment_type: group.assessment_type.label(),
            status: group.status.label(),
            records: members.count(),
            subject: group.subject(records).map(ToString::to_string),
            summary: classes.summarize(scores, None),
        }
    }
}
