use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validators::{validate_json_scoring_choices, ChoiceValidationError};

/// The set of valid integer scores and their labels, shared by every metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u8, String>", into = "BTreeMap<u8, String>")]
pub struct ScoreMap(BTreeMap<u8, String>);

impl ScoreMap {
    pub fn new(scores: BTreeMap<u8, String>) -> Result<Self, ChoiceValidationError> {
        if scores.is_empty() {
            return Err(ChoiceValidationError::EmptyScoreMap);
        }
        Ok(Self(scores))
    }

    pub fn contains(&self, score: u8) -> bool {
        self.0.contains_key(&score)
    }

    pub fn label(&self, score: u8) -> Option<&str> {
        self.0.get(&score).map(String::as_str)
    }

    /// Score given to a freshly created, not yet assessed metric.
    pub fn default_score(&self) -> u8 {
        self.0.keys().next().copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.0.iter().map(|(score, label)| (*score, label.as_str()))
    }

    pub(crate) fn describe(&self) -> String {
        let scores: Vec<String> = self.0.keys().map(u8::to_string).collect();
        format!("[{}]", scores.join(", "))
    }
}

impl Default for ScoreMap {
    fn default() -> Self {
        Self(BTreeMap::from([
            (0, "Not Compliant".to_string()),
            (1, "Needs Work".to_string()),
            (2, "Fully Compliant".to_string()),
        ]))
    }
}

impl TryFrom<BTreeMap<u8, String>> for ScoreMap {
    type Error = ChoiceValidationError;

    fn try_from(value: BTreeMap<u8, String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScoreMap> for BTreeMap<u8, String> {
    fn from(value: ScoreMap) -> Self {
        value.0
    }
}

/// Labelled choices a metric is scored with, keyed by score.
///
/// Built from a JSON map of choice label to score. When two labels share a score the one that
/// sorts last wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricChoices {
    label: String,
    choices: BTreeMap<u8, String>,
}

impl MetricChoices {
    pub fn from_json(
        label: impl Into<String>,
        choice_map: &str,
        scores: &ScoreMap,
    ) -> Result<Self, ChoiceValidationError> {
        let choices = validate_json_scoring_choices(choice_map, scores)?
            .into_iter()
            .map(|(choice, score)| (score, choice))
            .collect();

        Ok(Self {
            label: label.into(),
            choices,
        })
    }

    /// Choices mirroring the score map itself.
    pub fn from_score_map(label: impl Into<String>, scores: &ScoreMap) -> Self {
        Self {
            label: label.into(),
            choices: scores
                .iter()
                .map(|(score, choice)| (score, choice.to_string()))
                .collect(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn validate(&self, score: u8) -> bool {
        self.choices.contains_key(&score)
    }

    pub fn choice_display(&self, score: u8) -> Option<&str> {
        self.choices.get(&score).map(String::as_str)
    }

    pub fn choices(&self) -> impl Iterator<Item = (u8, &str)> {
        self.choices
            .iter()
            .map(|(score, choice)| (*score, choice.as_str()))
    }
}

impl fmt::Display for MetricChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.choices.values().map(String::as_str).collect();
        write!(f, "{}: ({})", self.label, labels.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_json_map_into_score_keyed_choices() {
        let choices = MetricChoices::from_json(
            "Percentage Range",
            r#"{ "< 80%" : 0, "80 - 90%" : 1, ">90%" : 2 }"#,
            &ScoreMap::default(),
        )
        .expect("valid choices");

        assert_eq!(choices.choice_display(1), Some("80 - 90%"));
        assert!(choices.validate(2));
        assert!(!choices.validate(3));
        assert_eq!(
            choices.to_string(),
            "Percentage Range: (< 80%, 80 - 90%, >90%)"
        );
    }

    #[test]
    fn rejects_scores_outside_the_score_map() {
        let err = MetricChoices::from_json("Bad", r#"{"x": 7}"#, &ScoreMap::default())
            .expect_err("7 is not a score");
        assert!(matches!(err, ChoiceValidationError::UnknownScore { .. }));
    }

    #[test]
    fn score_map_defaults() {
        let scores = ScoreMap::default();
        assert_eq!(scores.default_score(), 0);
        assert_eq!(scores.label(2), Some("Fully Compliant"));
        assert_eq!(
            ScoreMap::new(BTreeMap::new()),
            Err(ChoiceValidationError::EmptyScoreMap)
        );
    }

    #[test]
    fn score_map_deserializes_from_string_keys() {
        let scores: ScoreMap =
            serde_json::from_str(r#"{"1": "Low", "3": "High"}"#).expect("valid score map");
        assert_eq!(scores.default_score(), 1);
        assert!(scores.contains(3));
        assert!(serde_json::from_str::<ScoreMap>("{}").is_err());
    }
}
