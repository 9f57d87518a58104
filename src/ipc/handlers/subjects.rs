use super::collection::{
    handle_create, handle_delete, handle_fetch, handle_get, handle_list, handle_update,
};
use crate::ipc::error::{ok, store_err};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.remote.search_subjects(&name) {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let resp = match req.method.as_str() {
        "subjects.fetch" => handle_fetch(&mut state.subjects, &mut state.remote, req),
        "subjects.list" => handle_list(&mut state.subjects, &mut state.remote, req),
        "subjects.get" => handle_get(&mut state.subjects, &mut state.remote, req),
        "subjects.create" => handle_create(&mut state.subjects, &mut state.remote, req),
        "subjects.update" => handle_update(&mut state.subjects, &mut state.remote, req),
        "subjects.delete" => handle_delete(&mut state.subjects, &mut state.remote, req),
        "subjects.search" => handle_search(state, req),
        _ => return None,
    };
    Some(resp)
}
