//! Validation for JSON-encoded metric choice maps such as `{"< 80%": 0, "80 - 90%": 1}`.

use serde_json::{Map, Value};

use super::choices::ScoreMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChoiceValidationError {
    #[error("{value} is not a valid JSON: {reason}")]
    InvalidJson { value: String, reason: String },
    #[error("{value} is not a JSON dictionary")]
    NotADictionary { value: String },
    #[error("{value} does not map every choice to an integer value")]
    NonIntegerChoice { value: String },
    #[error("{value} does not map each choice to a score in {scores}")]
    UnknownScore { value: String, scores: String },
    #[error("a score map must define at least one score")]
    EmptyScoreMap,
}

/// Decode `value` and require a JSON object.
pub fn validate_json_dict(value: &str) -> Result<Map<String, Value>, ChoiceValidationError> {
    let decoded: Value =
        serde_json::from_str(value).map_err(|err| ChoiceValidationError::InvalidJson {
            value: value.to_string(),
            reason: err.to_string(),
        })?;

    match decoded {
        Value::Object(map) => Ok(map),
        _ => Err(ChoiceValidationError::NotADictionary {
            value: value.to_string(),
        }),
    }
}

/// Require a JSON object whose values are all integers.
pub fn validate_json_int_choices(value: &str) -> Result<Vec<(String, i64)>, ChoiceValidationError> {
    let map = validate_json_dict(value)?;
    map.into_iter()
        .map(|(label, choice)| match choice.as_i64() {
            Some(score) => Ok((label, score)),
            None => Err(ChoiceValidationError::NonIntegerChoice {
                value: value.to_string(),
            }),
        })
        .collect()
}

/// Require a JSON object mapping every choice onto a score defined in `scores`.
pub fn validate_json_scoring_choices(
    value: &str,
    scores: &ScoreMap,
) -> Result<Vec<(String, u8)>, ChoiceValidationError> {
    let choices = validate_json_int_choices(value)?;
    choices
        .into_iter()
        .map(|(label, score)| {
            u8::try_from(score)
                .ok()
                .filter(|score| scores.contains(*score))
                .map(|score| (label, score))
                .ok_or_else(|| ChoiceValidationError::UnknownScore {
                    value: value.to_string(),
                    scores: scores.describe(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_JSON: &str = "{a:1, b:2, c:3}";
    const JSON_DICT: &str = r#"{"a":"1", "b":"2", "c":"3"}"#;
    const JSON_INTS: &str = r#"{"a":1, "b":2, "c":3}"#;
    const JSON_SCORES: &str = r#"{"a":1, "b":2, "c":0}"#;

    #[test]
    fn dict_validation() {
        assert!(validate_json_dict(JSON_DICT).is_ok());
        assert!(matches!(
            validate_json_dict(NOT_JSON),
            Err(ChoiceValidationError::InvalidJson { .. })
        ));
        assert!(matches!(
            validate_json_dict("[1, 2]"),
            Err(ChoiceValidationError::NotADictionary { .. })
        ));
    }

    #[test]
    fn int_choice_validation() {
        assert!(validate_json_int_choices(JSON_INTS).is_ok());
        assert!(matches!(
            validate_json_int_choices(JSON_DICT),
            Err(ChoiceValidationError::NonIntegerChoice { .. })
        ));
        assert!(matches!(
            validate_json_int_choices(r#"{"a": 1.5}"#),
            Err(ChoiceValidationError::NonIntegerChoice { .. })
        ));
    }

    #[test]
    fn scoring_choice_validation() {
        let scores = ScoreMap::default();
        let choices = validate_json_scoring_choices(JSON_SCORES, &scores).expect("valid scores");
        assert_eq!(choices.len(), 3);

        let err = validate_json_scoring_choices(JSON_INTS, &scores).expect_err("3 is not a score");
        assert!(matches!(err, ChoiceValidationError::UnknownScore { .. }));
        assert!(err.to_string().contains("[0, 1, 2]"));

        assert!(validate_json_scoring_choices(r#"{"neg": -1}"#, &scores).is_err());
    }
}
