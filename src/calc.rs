use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Grade, GradeDetail, Student, Subject, UNKNOWN_STUDENT, UNKNOWN_SUBJECT};

/// Joins grades to the loaded students and subjects. Output order follows
/// `grades`; a reference missing from the collections gets a placeholder.
pub fn enrich(grades: &[Grade], students: &[Student], subjects: &[Subject]) -> Vec<GradeDetail> {
    let student_names: HashMap<&str, &str> = students
        .iter()
        .map(|s| (s.student_id.as_str(), s.student_name.as_str()))
        .collect();
    let subject_names: HashMap<&str, &str> = subjects
        .iter()
        .map(|s| (s.subject_id.as_str(), s.subject_name.as_str()))
        .collect();

    grades
        .iter()
        .map(|g| GradeDetail {
            id: g.id,
            student_id: g.student_id.clone(),
            subject_id: g.subject_id.clone(),
            average_score: g.average_score,
            student_name: student_names
                .get(g.student_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_STUDENT)
                .to_string(),
            subject_name: subject_names
                .get(g.subject_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_SUBJECT)
                .to_string(),
        })
        .collect()
}

fn mean<I>(scores: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = scores
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), s| (sum + s, n + 1));
    if n > 0 {
        sum / (n as f64)
    } else {
        0.0
    }
}

/// Mean of `averageScore`; 0 for no grades.
pub fn average_of(grades: &[Grade]) -> f64 {
    mean(grades.iter().map(|g| g.average_score))
}

/// Same policy as `average_of`, over already-joined rows.
pub fn mean_of_details(details: &[GradeDetail]) -> f64 {
    mean(details.iter().map(|d| d.average_score))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    #[serde(flatten)]
    pub student: Student,
    pub average_score: f64,
    pub grade_count: usize,
}

/// Every student with its mean (0 without grades), best first. Ties keep the
/// order of `students`.
pub fn rank_by_average(students: &[Student], grades: &[Grade]) -> Vec<RankedStudent> {
    let mut by_student: HashMap<&str, (f64, usize)> = HashMap::new();
    for g in grades {
        let e = by_student.entry(g.student_id.as_str()).or_insert((0.0, 0));
        e.0 += g.average_score;
        e.1 += 1;
    }

    let mut ranked: Vec<RankedStudent> = students
        .iter()
        .map(|s| {
            let (sum, n) = by_student
                .get(s.student_id.as_str())
                .copied()
                .unwrap_or((0.0, 0));
            RankedStudent {
                student: s.clone(),
                average_score: if n > 0 { sum / (n as f64) } else { 0.0 },
                grade_count: n,
            }
        })
        .collect();

    // sort_by is stable.
    ranked.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

pub fn top_by_average(students: &[Student], grades: &[Grade], n: usize) -> Vec<Student> {
    rank_by_average(students, grades)
        .into_iter()
        .take(n)
        .map(|r| r.student)
        .collect()
}

fn averages_by<F>(grades: &[Grade], key: F) -> HashMap<String, f64>
where
    F: Fn(&Grade) -> &str,
{
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for g in grades {
        groups
            .entry(key(g).to_string())
            .or_default()
            .push(g.average_score);
    }
    groups.into_iter().map(|(k, v)| (k, mean(v))).collect()
}

pub fn student_averages(grades: &[Grade]) -> HashMap<String, f64> {
    averages_by(grades, |g| g.student_id.as_str())
}

pub fn subject_averages(grades: &[Grade]) -> HashMap<String, f64> {
    averages_by(grades, |g| g.subject_id.as_str())
}

/// Named text fields a record exposes to `filter_by_text`.
pub trait TextFields {
    fn text_field(&self, field: &str) -> Option<&str>;
}

impl TextFields for Student {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "studentId" => Some(self.student_id.as_str()),
            "studentName" => Some(self.student_name.as_str()),
            _ => None,
        }
    }
}

impl TextFields for Subject {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "subjectId" => Some(self.subject_id.as_str()),
            "subjectName" => Some(self.subject_name.as_str()),
            _ => None,
        }
    }
}

impl TextFields for Grade {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "studentId" => Some(self.student_id.as_str()),
            "subjectId" => Some(self.subject_id.as_str()),
            _ => None,
        }
    }
}

impl TextFields for GradeDetail {
    fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "studentId" => Some(self.student_id.as_str()),
            "studentName" => Some(self.student_name.as_str()),
            "subjectId" => Some(self.subject_id.as_str()),
            "subjectName" => Some(self.subject_name.as_str()),
            _ => None,
        }
    }
}

pub const STUDENT_SEARCH_FIELDS: &[&str] = &["studentId", "studentName"];
pub const SUBJECT_SEARCH_FIELDS: &[&str] = &["subjectId", "subjectName"];
pub const GRADE_SEARCH_FIELDS: &[&str] = &["studentId", "studentName", "subjectId", "subjectName"];

/// Case-insensitive substring match on any of `fields`. An empty term keeps
/// everything; unknown field names never match.
pub fn filter_by_text<T>(items: &[T], term: &str, fields: &[&str]) -> Vec<T>
where
    T: TextFields + Clone,
{
    if term.is_empty() {
        return items.to_vec();
    }
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| {
            fields.iter().any(|f| {
                item.text_field(f)
                    .map(|v| v.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Average,
    Weak,
}

pub fn score_band(score: f64) -> ScoreBand {
    if score >= 9.0 {
        ScoreBand::Excellent
    } else if score >= 8.0 {
        ScoreBand::Good
    } else if score >= 6.5 {
        ScoreBand::Fair
    } else if score >= 5.0 {
        ScoreBand::Average
    } else {
        ScoreBand::Weak
    }
}

pub fn student_age(birth_year: i32, current_year: i32) -> i32 {
    current_year - birth_year
}

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_students: usize,
    pub total_subjects: usize,
    pub total_grades: usize,
    pub average_score: f64,
    pub average_band: ScoreBand,
    pub top_students: Vec<RankedStudent>,
}

pub fn dashboard(
    students: &[Student],
    subjects: &[Subject],
    grades: &[Grade],
    top_n: usize,
) -> Dashboard {
    let average_score = average_of(grades);
    let mut top_students = rank_by_average(students, grades);
    top_students.truncate(top_n);
    Dashboard {
        total_students: students.len(),
        total_subjects: subjects.len(),
        total_grades: grades.len(),
        average_score,
        average_band: score_band(average_score),
        top_students,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub student: Student,
    pub age: i32,
    pub grades: Vec<GradeDetail>,
    pub average_score: f64,
    pub average_band: ScoreBand,
}

/// `None` when the student is not in `students`.
pub fn student_report(
    student_id: &str,
    students: &[Student],
    subjects: &[Subject],
    grades: &[Grade],
    current_year: i32,
) -> Option<StudentReport> {
    let student = students.iter().find(|s| s.student_id == student_id)?;
    let own: Vec<Grade> = grades
        .iter()
        .filter(|g| g.student_id == student_id)
        .cloned()
        .collect();
    let average_score = average_of(&own);
    Some(StudentReport {
        student: student.clone(),
        age: student_age(student.birth_year, current_year),
        grades: enrich(&own, students, subjects),
        average_score,
        average_band: score_band(average_score),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectReport {
    pub subject: Subject,
    pub grades: Vec<GradeDetail>,
    pub average_score: f64,
    pub average_band: ScoreBand,
}

pub fn subject_report(
    subject_id: &str,
    students: &[Student],
    subjects: &[Subject],
    grades: &[Grade],
) -> Option<SubjectReport> {
    let subject = subjects.iter().find(|s| s.subject_id == subject_id)?;
    let own: Vec<Grade> = grades
        .iter()
        .filter(|g| g.subject_id == subject_id)
        .cloned()
        .collect();
    let average_score = average_of(&own);
    Some(SubjectReport {
        subject: subject.clone(),
        grades: enrich(&own, students, subjects),
        average_score,
        average_band: score_band(average_score),
    })
}
