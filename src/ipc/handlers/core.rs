use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "apiBaseUrl": state.remote.base_url(),
            "signedIn": state.remote.session().is_signed_in(),
        }),
    )
}

/// Points the session store at a workspace directory and loads any credential
/// saved there. Held collections are kept: they mirror the remote, not the
/// workspace.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(p) => PathBuf::from(p),
        Err(resp) => return resp,
    };

    match Session::open(&path) {
        Ok(session) => {
            let signed_in = session.is_signed_in();
            state.remote.replace_session(session);
            state.workspace = Some(path.clone());
            ok(
                &req.id,
                json!({ "workspacePath": path.to_string_lossy(), "signedIn": signed_in }),
            )
        }
        Err(e) => {
            log::error!("failed to open workspace {}: {e:#}", path.display());
            err(&req.id, "db_open_failed", format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
