use serde::Serialize;

use crate::error::{ErrorKind, StoreError, StoreResult};
use crate::model::Entity;
use crate::remote::RemoteCollection;

/// Last remote failure, as shown inline by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&StoreError> for HolderError {
    fn from(e: &StoreError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// In-memory copy of one remote collection.
///
/// Successful mutations patch `items` (append / replace / remove by key)
/// instead of re-fetching. Remote failures leave `items` untouched and are
/// recorded in `error`; validation failures are returned to the caller only.
#[derive(Debug, Clone)]
pub struct EntityHolder<E: Entity> {
    items: Vec<E>,
    loading: bool,
    /// Set by the first successful fetch.
    loaded: bool,
    error: Option<HolderError>,
}

#[derive(Debug, Serialize)]
pub struct HolderSnapshot<'a, E: Entity> {
    pub items: &'a [E],
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<&'a HolderError>,
}

impl<E: Entity> Default for EntityHolder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityHolder<E> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            loaded: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn error(&self) -> Option<&HolderError> {
        self.error.as_ref()
    }

    pub fn snapshot(&self) -> HolderSnapshot<'_, E> {
        HolderSnapshot {
            items: &self.items,
            loading: self.loading,
            loaded: self.loaded,
            error: self.error.as_ref(),
        }
    }

    pub fn get(&self, key: &E::Key) -> Option<&E> {
        self.items.iter().find(|e| e.key() == Some(key))
    }

    /// Runs one remote call with the loading flag raised and records its
    /// outcome in the error state.
    fn track<T, R, F>(&mut self, remote: &mut R, op: &str, call: F) -> StoreResult<T>
    where
        R: RemoteCollection<E>,
        F: FnOnce(&mut R) -> StoreResult<T>,
    {
        self.loading = true;
        let result = call(remote);
        self.loading = false;
        match &result {
            Ok(_) => self.error = None,
            Err(e) => {
                log::warn!("{}.{op} failed: {e}", E::COLLECTION);
                self.error = Some(HolderError::from(e));
            }
        }
        result
    }

    fn check_draft(draft: &E::Draft) -> StoreResult<()> {
        let errors = E::validate_draft(draft);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(errors))
        }
    }

    pub fn fetch_all<R: RemoteCollection<E>>(&mut self, remote: &mut R) -> StoreResult<&[E]> {
        let fetched = self.track(remote, "fetch", |r| r.list())?;
        log::debug!("{}: fetched {} records", E::COLLECTION, fetched.len());
        self.items = fetched;
        self.loaded = true;
        Ok(&self.items)
    }

    /// Fetches on first use only.
    pub fn ensure_loaded<R: RemoteCollection<E>>(&mut self, remote: &mut R) -> StoreResult<()> {
        if !self.loaded {
            self.fetch_all(remote)?;
        }
        Ok(())
    }

    pub fn create<R: RemoteCollection<E>>(
        &mut self,
        remote: &mut R,
        draft: &E::Draft,
    ) -> StoreResult<E> {
        Self::check_draft(draft)?;
        let created = self.track(remote, "create", |r| r.create(draft))?;
        self.items.push(created.clone());
        Ok(created)
    }

    pub fn update<R: RemoteCollection<E>>(
        &mut self,
        remote: &mut R,
        key: &E::Key,
        draft: &E::Draft,
    ) -> StoreResult<E> {
        Self::check_draft(draft)?;
        if let Some(k) = E::draft_key(draft) {
            if k != key {
                return Err(StoreError::invalid(
                    "id",
                    format!("identifier {key} cannot be changed to {k}"),
                ));
            }
        }
        if let Some(held) = self.get(key) {
            if !held.keeps_identity(draft) {
                return Err(StoreError::invalid(
                    "id",
                    "identifying fields cannot be changed after creation",
                ));
            }
        }

        let updated = self.track(remote, "update", |r| r.update(key, draft))?;
        // Matched by the key the caller used; the server's copy replaces it.
        for item in self.items.iter_mut().filter(|e| e.key() == Some(key)) {
            *item = updated.clone();
        }
        Ok(updated)
    }

    pub fn delete<R: RemoteCollection<E>>(
        &mut self,
        remote: &mut R,
        key: &E::Key,
    ) -> StoreResult<()> {
        self.track(remote, "delete", |r| r.delete(key))?;
        self.items.retain(|e| e.key() != Some(key));
        Ok(())
    }

    /// Held copy when present, otherwise a single remote read. The remote
    /// read does not enter the collection.
    pub fn find<R: RemoteCollection<E>>(
        &mut self,
        remote: &mut R,
        key: &E::Key,
    ) -> StoreResult<E> {
        if let Some(e) = self.get(key) {
            return Ok(e.clone());
        }
        remote.fetch(key)
    }
}
