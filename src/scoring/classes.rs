use serde::{Deserialize, Serialize};

use super::{ScoreSummary, Scored, Tally};

/// One classification boundary: means up to and including `upper_bound` earn `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreClass {
    pub upper_bound: f64,
    pub label: String,
}

impl ScoreClass {
    pub fn new(upper_bound: f64, label: impl Into<String>) -> Self {
        Self {
            upper_bound,
            label: label.into(),
        }
    }
}

/// Boundaries sorted ascending by upper bound. The last one acts as the catch-all and is
/// normally given an infinite bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreClasses {
    classes: Vec<ScoreClass>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("score classes must define at least one boundary")]
    Empty,
    #[error("score class '{label}' has an upper bound that is not a number")]
    NotANumber { label: String },
}

impl ScoreClasses {
    pub fn new(mut classes: Vec<ScoreClass>) -> Result<Self, ScoringError> {
        if classes.is_empty() {
            return Err(ScoringError::Empty);
        }
        if let Some(class) = classes.iter().find(|class| class.upper_bound.is_nan()) {
            return Err(ScoringError::NotANumber {
                label: class.label.clone(),
            });
        }

        classes.sort_by(|a, b| {
            a.upper_bound
                .total_cmp(&b.upper_bound)
                .then_with(|| a.label.cmp(&b.label))
        });
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[ScoreClass] {
        &self.classes
    }

    /// Label of the first boundary whose upper bound is `>= mean`; a missing mean counts as 0.
    ///
    /// Means beyond the last bound fall into the last class.
    pub fn classify(&self, mean: Option<f64>) -> &str {
        let mean = mean.unwrap_or(0.0);
        let index = self
            .classes
            .partition_point(|class| class.upper_bound < mean);
        self.classes
            .get(index)
            .or_else(|| self.classes.last())
            .map(|class| class.label.as_str())
            .unwrap_or_default()
    }

    pub fn summarize<I>(&self, items: I, precomputed: Option<f64>) -> ScoreSummary
    where
        I: IntoIterator,
        I::Item: Scored,
    {
        let tally = Tally::of(items);
        let mean = precomputed.unwrap_or_else(|| tally.mean());
        ScoreSummary {
            mean,
            label: self.classify(Some(mean)).to_string(),
            applicable: tally.applicable,
            total: tally.total,
        }
    }
}

impl Default for ScoreClasses {
    fn default() -> Self {
        Self {
            classes: vec![
                ScoreClass::new(0.5, "fail"),
                ScoreClass::new(1.0, "poor"),
                ScoreClass::new(1.5, "satisfactory"),
                ScoreClass::new(f64::INFINITY, "good"),
            ],
        }
    }
}
