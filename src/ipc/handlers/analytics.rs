use crate::calc;
use crate::error::StoreError;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{optional_count, required_str};
use crate::ipc::types::{AppState, Request};
use crate::validate;
use serde_json::json;

#[derive(Debug, Clone, Copy)]
struct Needs {
    students: bool,
    subjects: bool,
}

/// Loads grades plus whichever of students/subjects the view needs. A
/// collection the view can do without is loaded best-effort.
fn ensure_loaded(state: &mut AppState, needs: Needs) -> Result<(), StoreError> {
    state.grades.ensure_loaded(&mut state.remote)?;

    let students = state.students.ensure_loaded(&mut state.remote);
    if needs.students {
        students?;
    } else if let Err(e) = students {
        log::warn!("analytics: students unavailable: {e}");
    }

    let subjects = state.subjects.ensure_loaded(&mut state.remote);
    if needs.subjects {
        subjects?;
    } else if let Err(e) = subjects {
        log::warn!("analytics: subjects unavailable: {e}");
    }
    Ok(())
}

fn handle_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let top_n = match optional_count(req, "topN", calc::DEFAULT_TOP_N) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let needs = Needs {
        students: true,
        subjects: true,
    };
    if let Err(e) = ensure_loaded(state, needs) {
        return store_err(&req.id, &e);
    }
    let dashboard = calc::dashboard(
        state.students.items(),
        state.subjects.items(),
        state.grades.items(),
        top_n,
    );
    ok(&req.id, json!(dashboard))
}

fn handle_top_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let n = match optional_count(req, "n", calc::DEFAULT_TOP_N) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let needs = Needs {
        students: true,
        subjects: false,
    };
    if let Err(e) = ensure_loaded(state, needs) {
        return store_err(&req.id, &e);
    }
    let students = calc::top_by_average(state.students.items(), state.grades.items(), n);
    ok(&req.id, json!({ "students": students }))
}

fn handle_student_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs {
        students: true,
        subjects: false,
    };
    if let Err(e) = ensure_loaded(state, needs) {
        return store_err(&req.id, &e);
    }
    match calc::student_report(
        &student_id,
        state.students.items(),
        state.subjects.items(),
        state.grades.items(),
        validate::current_year(),
    ) {
        Some(report) => ok(&req.id, json!(report)),
        None => err(
            &req.id,
            "not_found",
            format!("student {student_id} is not loaded"),
            None,
        ),
    }
}

fn handle_subject_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs {
        students: false,
        subjects: true,
    };
    if let Err(e) = ensure_loaded(state, needs) {
        return store_err(&req.id, &e);
    }
    match calc::subject_report(
        &subject_id,
        state.students.items(),
        state.subjects.items(),
        state.grades.items(),
    ) {
        Some(report) => ok(&req.id, json!(report)),
        None => err(
            &req.id,
            "not_found",
            format!("subject {subject_id} is not loaded"),
            None,
        ),
    }
}

/// Per-key means over the held grades, without the joins.
fn handle_averages(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = state.grades.ensure_loaded(&mut state.remote) {
        return store_err(&req.id, &e);
    }
    let grades = state.grades.items();
    ok(
        &req.id,
        json!({
            "overall": calc::average_of(grades),
            "byStudent": calc::student_averages(grades),
            "bySubject": calc::subject_averages(grades),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.dashboard" => Some(handle_dashboard(state, req)),
        "analytics.topStudents" => Some(handle_top_students(state, req)),
        "analytics.studentReport" => Some(handle_student_report(state, req)),
        "analytics.subjectReport" => Some(handle_subject_report(state, req)),
        "analytics.averages" => Some(handle_averages(state, req)),
        _ => None,
    }
}
