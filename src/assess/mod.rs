//! Assessment records, assessment groups, and the service that manages them.

pub mod domain;
pub mod repository;
pub mod service;
pub mod subject;

#[cfg(test)]
mod tests;

pub use domain::{
    supporting_doc_directory_path, AssessmentGroup, AssessmentRecord, AssessmentType,
    DocumentLocation, DocumentType, GroupId, GroupRoot, GroupRootError, MetricScore, RecordId,
    RecordStatus, ScoreValidationError, SupportingDoc,
};
pub use repository::{AssessmentRepository, InMemoryAssessmentRepository, RepositoryError};
pub use service::{
    AssessmentService, NewAssessment, NewGroup, RecordUpdate, ScoreUpdate, ServiceError,
};
pub use subject::{AssessmentSubject, SubjectRecord};
