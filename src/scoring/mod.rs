//! Mean-score aggregation and qualitative score classes.
//!
//! Only applicable items take part in a mean. A set with no applicable item averages to `0.0`
//! rather than failing, so a record nobody has scored yet still receives a classification.
//! That fallback cannot be told apart from a genuine all-zero assessment; callers that need the
//! distinction should look at [`ScoreSummary::applicable`].

mod classes;

pub use classes::{ScoreClass, ScoreClasses, ScoringError};

use serde::{Deserialize, Serialize};

/// Anything carrying an applicability flag and an integer score.
pub trait Scored {
    fn applicable(&self) -> bool;
    fn score(&self) -> u8;
}

impl<S: Scored + ?Sized> Scored for &S {
    fn applicable(&self) -> bool {
        (**self).applicable()
    }

    fn score(&self) -> u8 {
        (**self).score()
    }
}

/// Bare (applicable, score) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub applicable: bool,
    pub score: u8,
}

impl ScoredItem {
    pub const fn new(applicable: bool, score: u8) -> Self {
        Self { applicable, score }
    }
}

impl Scored for ScoredItem {
    fn applicable(&self) -> bool {
        self.applicable
    }

    fn score(&self) -> u8 {
        self.score
    }
}

/// Mean of the applicable scores, preferring a caller-supplied precomputed value.
///
/// `precomputed` short-circuits the aggregation entirely; hosts that already hold an aggregate
/// (for instance from a storage-side average) pass it here instead of re-walking the scores.
pub fn mean_score<I>(items: I, precomputed: Option<f64>) -> f64
where
    I: IntoIterator,
    I::Item: Scored,
{
    if let Some(mean) = precomputed {
        return mean;
    }
    Tally::of(items).mean()
}

/// CSS-style class for a single score: `not-applicable` or `score-<n>`.
pub fn score_class<S: Scored + ?Sized>(item: &S) -> String {
    if item.applicable() {
        format!("score-{}", item.score())
    } else {
        "not-applicable".to_string()
    }
}

/// Numeric and qualitative summary of a set of scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub mean: f64,
    pub label: String,
    pub applicable: usize,
    pub total: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Tally {
    pub applicable: usize,
    pub total: usize,
    sum: u64,
}

impl Tally {
    pub(crate) fn of<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Scored,
    {
        items.into_iter().fold(Self::default(), |mut tally, item| {
            tally.total += 1;
            if item.applicable() {
                tally.applicable += 1;
                tally.sum += u64::from(item.score());
            }
            tally
        })
    }

    pub(crate) fn mean(&self) -> f64 {
        if self.applicable == 0 {
            0.0
        } else {
            self.sum as f64 / self.applicable as f64
        }
    }
}
