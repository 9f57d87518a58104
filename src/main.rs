mod calc;
mod config;
mod db;
mod error;
mod holder;
mod ipc;
mod model;
mod remote;
mod session;
mod validate;

use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::remote::RemoteClient;
use crate::session::Session;

fn main() {
    let cfg = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("gradebookd: {e:#}");
            std::process::exit(2);
        }
    };

    // stdout carries the protocol; env_logger writes to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cfg.logging.level))
        .format_timestamp(None)
        .init();

    let mut state = match build_state(&cfg) {
        Ok(s) => s,
        Err(e) => {
            log::error!("startup failed: {e:#}");
            std::process::exit(1);
        }
    };
    log::info!(
        "gradebookd {} ready (remote {})",
        env!("CARGO_PKG_VERSION"),
        state.remote.base_url()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                log::warn!("dropping malformed request: {e}");
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    log::info!("stdin closed, exiting");
}

/// A workspace that fails to open falls back to an in-memory session so the
/// daemon still serves requests.
fn build_state(cfg: &Config) -> anyhow::Result<ipc::AppState> {
    let (session, workspace) = match cfg.storage.workspace.as_ref() {
        Some(ws) => match Session::open(ws) {
            Ok(s) => (s, Some(ws.clone())),
            Err(e) => {
                log::warn!("workspace {} unavailable: {e:#}", ws.display());
                (Session::ephemeral(), None)
            }
        },
        None => (Session::ephemeral(), None),
    };
    let remote = RemoteClient::new(&cfg.remote, session)?;
    Ok(ipc::AppState::new(remote, workspace))
}
