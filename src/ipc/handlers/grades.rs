use super::collection::{
    handle_create, handle_delete, handle_fetch, handle_get, handle_list, handle_update,
};
use crate::calc;
use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::{optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.grades_by_student(&student_id) {
        Ok(grades) => ok(&req.id, json!({ "grades": grades })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_by_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.grades_by_subject(&subject_id) {
        Ok(grades) => ok(&req.id, json!({ "grades": grades })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_student_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.student_average(&student_id) {
        Ok(avg) => ok(
            &req.id,
            json!({ "studentId": student_id, "averageScore": avg }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_subject_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.subject_average(&subject_id) {
        Ok(avg) => ok(
            &req.id,
            json!({ "subjectId": subject_id, "averageScore": avg }),
        ),
        Err(e) => store_err(&req.id, &e),
    }
}

/// Grades joined with the held students and subjects. Grades must load;
/// a failed student or subject load only degrades names to placeholders.
fn handle_details(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = state.grades.ensure_loaded(&mut state.remote) {
        return store_err(&req.id, &e);
    }
    if let Err(e) = state.students.ensure_loaded(&mut state.remote) {
        log::warn!("grades.details: students unavailable, names degrade: {e}");
    }
    if let Err(e) = state.subjects.ensure_loaded(&mut state.remote) {
        log::warn!("grades.details: subjects unavailable, names degrade: {e}");
    }

    let details = calc::enrich(
        state.grades.items(),
        state.students.items(),
        state.subjects.items(),
    );
    let term = optional_str(req, "term").unwrap_or_default();
    let filtered = calc::filter_by_text(&details, &term, calc::GRADE_SEARCH_FIELDS);
    let average = calc::mean_of_details(&filtered);

    ok(
        &req.id,
        json!({
            "grades": filtered,
            "total": details.len(),
            "averageScore": average,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let resp = match req.method.as_str() {
        "grades.fetch" => handle_fetch(&mut state.grades, &mut state.remote, req),
        "grades.list" => handle_list(&mut state.grades, &mut state.remote, req),
        "grades.get" => handle_get(&mut state.grades, &mut state.remote, req),
        "grades.create" => handle_create(&mut state.grades, &mut state.remote, req),
        "grades.update" => handle_update(&mut state.grades, &mut state.remote, req),
        "grades.delete" => handle_delete(&mut state.grades, &mut state.remote, req),
        "grades.byStudent" => handle_by_student(state, req),
        "grades.bySubject" => handle_by_subject(state, req),
        "grades.studentAverage" => handle_student_average(state, req),
        "grades.subjectAverage" => handle_subject_average(state, req),
        "grades.details" => handle_details(state, req),
        _ => return None,
    };
    Some(resp)
}
