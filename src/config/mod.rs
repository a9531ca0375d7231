use std::collections::BTreeMap;
use std::env;
use std::fmt;

use serde_json::Value;

use crate::builder::ScoreMap;
use crate::permissions::DefaultPermissions;
use crate::scoring::{ScoreClass, ScoreClasses};

/// Distinguishes runtime behavior for different stages of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub assessment: AssessmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("ASSESSMENT_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("ASSESSMENT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let score_classes = match env::var("ASSESSMENT_SCORE_CLASSES") {
            Ok(raw) => parse_score_classes(&raw)?,
            Err(_) => ScoreClasses::default(),
        };
        let score_map = match env::var("ASSESSMENT_SCORE_MAP") {
            Ok(raw) => parse_score_map(&raw)?,
            Err(_) => ScoreMap::default(),
        };
        let login_required = match env::var("ASSESSMENT_LOGIN_REQUIRED") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidLoginRequired { value: raw })?,
            Err(_) => true,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            assessment: AssessmentConfig {
                score_classes,
                score_map,
                login_required,
            },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scoring vocabulary and access policy.
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    pub score_classes: ScoreClasses,
    pub score_map: ScoreMap,
    pub login_required: bool,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            score_classes: ScoreClasses::default(),
            score_map: ScoreMap::default(),
            login_required: true,
        }
    }
}

impl AssessmentConfig {
    pub fn permissions(&self) -> DefaultPermissions {
        DefaultPermissions {
            login_required: self.login_required,
        }
    }
}

/// Parse `[[0.5, "fail"], [1.0, "poor"], ["inf", "good"]]`; `"inf"` or `null` is unbounded.
fn parse_score_classes(raw: &str) -> Result<ScoreClasses, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidScoreClasses { reason };

    let value: Value = serde_json::from_str(raw).map_err(|err| invalid(err.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(invalid("expected a list of [upper_bound, label] pairs".to_string()));
    };

    let mut classes = Vec::with_capacity(entries.len());
    for entry in entries {
        let pair = match entry {
            Value::Array(pair) if pair.len() == 2 => pair,
            other => return Err(invalid(format!("expected [upper_bound, label], found {other}"))),
        };
        let upper_bound = match &pair[0] {
            Value::Null => f64::INFINITY,
            Value::String(text) if text.eq_ignore_ascii_case("inf") => f64::INFINITY,
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| invalid(format!("bound {number} is not representable")))?,
            other => return Err(invalid(format!("invalid upper bound {other}"))),
        };
        let label = pair[1]
            .as_str()
            .ok_or_else(|| invalid(format!("label {} must be a string", pair[1])))?;
        classes.push(ScoreClass::new(upper_bound, label));
    }

    ScoreClasses::new(classes).map_err(|err| invalid(err.to_string()))
}

fn parse_score_map(raw: &str) -> Result<ScoreMap, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidScoreMap { reason };

    let entries: BTreeMap<String, String> =
        serde_json::from_str(raw).map_err(|err| invalid(err.to_string()))?;
    let mut scores = BTreeMap::new();
    for (key, label) in entries {
        let score = key
            .trim()
            .parse::<u8>()
            .map_err(|_| invalid(format!("score '{key}' is not an integer between 0 and 255")))?;
        scores.insert(score, label);
    }
    ScoreMap::new(scores).map_err(|err| invalid(err.to_string()))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidScoreClasses { reason: String },
    InvalidScoreMap { reason: String },
    InvalidLoginRequired { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidScoreClasses { reason } => {
                write!(f, "ASSESSMENT_SCORE_CLASSES is invalid: {reason}")
            }
            ConfigError::InvalidScoreMap { reason } => {
                write!(f, "ASSESSMENT_SCORE_MAP is invalid: {reason}")
            }
            ConfigError::InvalidLoginRequired { value } => {
                write!(f, "ASSESSMENT_LOGIN_REQUIRED must be a boolean, found '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
