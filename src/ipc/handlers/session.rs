use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn status_json(state: &AppState) -> serde_json::Value {
    let session = state.remote.session();
    json!({
        "signedIn": session.is_signed_in(),
        "persistent": session.is_persistent(),
    })
}

fn handle_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let token = match required_str(req, "token") {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    if let Err(e) = state.remote.session_mut().sign_in(&token) {
        return err(&req.id, "session_store_failed", format!("{e:#}"), None);
    }
    log::info!("session: signed in");
    ok(&req.id, status_json(state))
}

fn handle_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = state.remote.session_mut().clear() {
        return err(&req.id, "session_store_failed", format!("{e:#}"), None);
    }
    log::info!("session: signed out");
    ok(&req.id, status_json(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.status" => Some(ok(&req.id, status_json(state))),
        "session.signIn" => Some(handle_sign_in(state, req)),
        "session.signOut" => Some(handle_sign_out(state, req)),
        _ => None,
    }
}
