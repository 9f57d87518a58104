use chrono::Datelike;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::model::{GradeDraft, Student, Subject};

pub const MIN_BIRTH_YEAR: i32 = 1900;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

static STUDENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,3}[0-9]{3,4}$").expect("student id pattern"));
static SUBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{3}$").expect("subject id pattern"));

pub fn validate_student_id(id: &str) -> bool {
    STUDENT_ID.is_match(id)
}

pub fn validate_subject_id(id: &str) -> bool {
    SUBJECT_ID.is_match(id)
}

pub fn validate_score(score: f64) -> bool {
    score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score)
}

pub fn validate_birth_year(year: i32, current_year: i32) -> bool {
    (MIN_BIRTH_YEAR..=current_year).contains(&year)
}

pub fn student_errors(s: &Student, current_year: i32) -> Vec<FieldError> {
    let mut out = Vec::new();
    if s.student_id.trim().is_empty() {
        out.push(FieldError::new("studentId", "student id is required"));
    } else if !validate_student_id(&s.student_id) {
        out.push(FieldError::new(
            "studentId",
            "student id must be 1-3 uppercase letters followed by 3-4 digits",
        ));
    }
    if s.student_name.trim().is_empty() {
        out.push(FieldError::new("studentName", "student name is required"));
    }
    if !validate_birth_year(s.birth_year, current_year) {
        out.push(FieldError::new(
            "birthYear",
            format!("birth year must be between {MIN_BIRTH_YEAR} and {current_year}"),
        ));
    }
    out
}

pub fn subject_errors(s: &Subject) -> Vec<FieldError> {
    let mut out = Vec::new();
    if s.subject_id.trim().is_empty() {
        out.push(FieldError::new("subjectId", "subject id is required"));
    } else if !validate_subject_id(&s.subject_id) {
        out.push(FieldError::new(
            "subjectId",
            "subject id must be 2 uppercase letters followed by 3 digits",
        ));
    }
    if s.subject_name.trim().is_empty() {
        out.push(FieldError::new("subjectName", "subject name is required"));
    }
    out
}

/// Grade references are only checked for presence; whether they resolve is
/// the remote store's concern.
pub fn grade_errors(g: &GradeDraft) -> Vec<FieldError> {
    let mut out = Vec::new();
    if g.student_id.trim().is_empty() {
        out.push(FieldError::new("studentId", "student is required"));
    }
    if g.subject_id.trim().is_empty() {
        out.push(FieldError::new("subjectId", "subject is required"));
    }
    if !validate_score(g.average_score) {
        out.push(FieldError::new(
            "averageScore",
            format!("score must be between {MIN_SCORE} and {MAX_SCORE}"),
        ));
    }
    out
}
