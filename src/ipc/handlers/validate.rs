//! Form-boundary checks. Nothing here touches the remote or the holders.

use crate::ipc::error::ok;
use crate::ipc::helpers::body;
use crate::ipc::types::{AppState, Request};
use crate::model::{Entity, Grade, Student, Subject};
use crate::validate::FieldError;
use serde_json::json;

fn respond(req: &Request, fields: Vec<FieldError>) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "valid": fields.is_empty(), "fields": fields }),
    )
}

fn check<E: Entity>(req: &Request, key: &str) -> serde_json::Value {
    match body::<E::Draft>(req, key) {
        Ok(draft) => respond(req, E::validate_draft(&draft)),
        Err(resp) => resp,
    }
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "validate.student" => Some(check::<Student>(req, "student")),
        "validate.subject" => Some(check::<Subject>(req, "subject")),
        "validate.grade" => Some(check::<Grade>(req, "grade")),
        _ => None,
    }
}
