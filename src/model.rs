use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::validate::{self, FieldError};

pub const UNKNOWN_STUDENT: &str = "Unknown Student";
pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: String,
    pub student_name: String,
    pub birth_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub subject_id: String,
    pub subject_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_id: String,
    pub subject_id: String,
    pub average_score: f64,
}

/// Body of grade create/update requests; the server assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDraft {
    pub student_id: String,
    pub subject_id: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_id: String,
    pub subject_id: String,
    pub average_score: f64,
    pub student_name: String,
    pub subject_name: String,
}

/// A record type held by an `EntityHolder` and served by one REST collection.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    type Key: Clone + PartialEq + Display + Serialize;
    type Draft: Clone + Serialize + DeserializeOwned;

    /// Path segment of the REST collection, also used as the IPC family name.
    const COLLECTION: &'static str;

    /// Primary key; `None` only for grades that were never persisted.
    fn key(&self) -> Option<&Self::Key>;

    /// Natural key carried inside a draft, if the entity has one.
    fn draft_key(draft: &Self::Draft) -> Option<&Self::Key>;

    /// False when `draft` would change a field that is fixed after creation.
    fn keeps_identity(&self, draft: &Self::Draft) -> bool;

    fn validate_draft(draft: &Self::Draft) -> Vec<FieldError>;
}

impl Entity for Student {
    type Key = String;
    type Draft = Student;

    const COLLECTION: &'static str = "students";

    fn key(&self) -> Option<&String> {
        Some(&self.student_id)
    }

    fn draft_key(draft: &Student) -> Option<&String> {
        Some(&draft.student_id)
    }

    fn keeps_identity(&self, draft: &Student) -> bool {
        self.student_id == draft.student_id
    }

    fn validate_draft(draft: &Student) -> Vec<FieldError> {
        validate::student_errors(draft, validate::current_year())
    }
}

impl Entity for Subject {
    type Key = String;
    type Draft = Subject;

    const COLLECTION: &'static str = "subjects";

    fn key(&self) -> Option<&String> {
        Some(&self.subject_id)
    }

    fn draft_key(draft: &Subject) -> Option<&String> {
        Some(&draft.subject_id)
    }

    fn keeps_identity(&self, draft: &Subject) -> bool {
        self.subject_id == draft.subject_id
    }

    fn validate_draft(draft: &Subject) -> Vec<FieldError> {
        validate::subject_errors(draft)
    }
}

impl Entity for Grade {
    type Key = i64;
    type Draft = GradeDraft;

    const COLLECTION: &'static str = "grades";

    fn key(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn draft_key(_draft: &GradeDraft) -> Option<&i64> {
        None
    }

    fn keeps_identity(&self, draft: &GradeDraft) -> bool {
        self.student_id == draft.student_id && self.subject_id == draft.subject_id
    }

    fn validate_draft(draft: &GradeDraft) -> Vec<FieldError> {
        validate::grade_errors(draft)
    }
}
