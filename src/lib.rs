//! Structured assessment scoring.
//!
//! An organization defines a matrix of Activities x Topics; each cell (an assessment category)
//! carries questions, each question carries scoring metrics. Assessors fill in assessment
//! records, alone or as a group spanning every category of one activity or topic, and this
//! crate aggregates, classifies, and lays those results out for display.

pub mod assess;
pub mod builder;
pub mod config;
pub mod error;
pub mod matrix;
pub mod permissions;
pub mod report;
pub mod scoring;
pub mod telemetry;
pub mod workbook;
