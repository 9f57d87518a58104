use rusqlite::Connection;
use std::path::Path;

use crate::db;

/// Credential context handed to the remote client.
///
/// With a backing store the token survives restarts; `clear` (sign-out or a
/// `401` from the remote) drops it from memory and from the store.
pub struct Session {
    token: Option<String>,
    store: Option<Connection>,
}

impl Session {
    pub fn ephemeral() -> Self {
        Self {
            token: None,
            store: None,
        }
    }

    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        let token = db::credential_get(&conn)?;
        log::info!(
            "session store opened at {} (signed in: {})",
            workspace.display(),
            token.is_some()
        );
        Ok(Self {
            token,
            store: Some(conn),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    pub fn sign_in(&mut self, token: &str) -> anyhow::Result<()> {
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("token must not be empty");
        }
        if let Some(conn) = self.store.as_ref() {
            db::credential_set(conn, token)?;
        }
        self.token = Some(token.to_string());
        Ok(())
    }

    /// Memory is cleared even when the store write fails.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.token = None;
        if let Some(conn) = self.store.as_ref() {
            db::credential_clear(conn)?;
        }
        Ok(())
    }
}
