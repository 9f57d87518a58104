use super::collection::{
    handle_create, handle_delete, handle_fetch, handle_get, handle_list, handle_update,
};
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{required_i64, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Remote name search; results are not merged into the held collection.
fn handle_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.search_students(&name) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(&req.id, &e),
    }
}

fn handle_by_birth_year(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match required_i64(req, "year").and_then(|y| {
        i32::try_from(y).map_err(|_| err(&req.id, "bad_params", "year out of range", None))
    }) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.students_by_birth_year(year) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let resp = match req.method.as_str() {
        "students.fetch" => handle_fetch(&mut state.students, &mut state.remote, req),
        "students.list" => handle_list(&mut state.students, &mut state.remote, req),
        "students.get" => handle_get(&mut state.students, &mut state.remote, req),
        "students.create" => handle_create(&mut state.students, &mut state.remote, req),
        "students.update" => handle_update(&mut state.students, &mut state.remote, req),
        // Grades of the student are removed by the remote; the held grade
        // collection is left as is until the next grades.fetch.
        "students.delete" => handle_delete(&mut state.students, &mut state.remote, req),
        "students.search" => handle_search(state, req),
        "students.byBirthYear" => handle_by_birth_year(state, req),
        _ => return None,
    };
    Some(resp)
}
