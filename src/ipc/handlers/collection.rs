//! Request handling shared by the three entity families. Each family maps its
//! method names onto these functions with its own holder.

use serde_json::json;

use crate::calc::{self, TextFields};
use crate::holder::EntityHolder;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{body, optional_str};
use crate::ipc::types::Request;
use crate::model::{Entity, Grade, Student, Subject};
use crate::remote::RemoteClient;

/// How an entity family appears in IPC params and results.
pub trait IpcEntity: Entity + TextFields {
    /// Param naming the primary key, e.g. `studentId`.
    const KEY_PARAM: &'static str;
    /// Param/result key for a single record, e.g. `student`.
    const ITEM: &'static str;
    const SEARCH_FIELDS: &'static [&'static str];

    fn key_from(v: &serde_json::Value) -> Option<Self::Key>;
}

impl IpcEntity for Student {
    const KEY_PARAM: &'static str = "studentId";
    const ITEM: &'static str = "student";
    const SEARCH_FIELDS: &'static [&'static str] = calc::STUDENT_SEARCH_FIELDS;

    fn key_from(v: &serde_json::Value) -> Option<String> {
        non_blank(v)
    }
}

impl IpcEntity for Subject {
    const KEY_PARAM: &'static str = "subjectId";
    const ITEM: &'static str = "subject";
    const SEARCH_FIELDS: &'static [&'static str] = calc::SUBJECT_SEARCH_FIELDS;

    fn key_from(v: &serde_json::Value) -> Option<String> {
        non_blank(v)
    }
}

impl IpcEntity for Grade {
    const KEY_PARAM: &'static str = "id";
    const ITEM: &'static str = "grade";
    const SEARCH_FIELDS: &'static [&'static str] = &["studentId", "subjectId"];

    fn key_from(v: &serde_json::Value) -> Option<i64> {
        v.as_i64()
    }
}

fn non_blank(v: &serde_json::Value) -> Option<String> {
    v.as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_key<E: IpcEntity>(req: &Request) -> Result<E::Key, serde_json::Value> {
    req.params
        .get(E::KEY_PARAM)
        .and_then(E::key_from)
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("missing {}", E::KEY_PARAM),
                None,
            )
        })
}

/// `{ "<collection>": [...], "loading", "loaded", "error" }`
pub fn state_json<E: IpcEntity>(holder: &EntityHolder<E>) -> serde_json::Value {
    let snap = holder.snapshot();
    let mut out = serde_json::Map::new();
    out.insert(E::COLLECTION.to_string(), json!(snap.items));
    out.insert("loading".into(), json!(snap.loading));
    out.insert("loaded".into(), json!(snap.loaded));
    out.insert("error".into(), json!(snap.error));
    serde_json::Value::Object(out)
}

fn item_json<E: IpcEntity>(item: &E) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    out.insert(E::ITEM.to_string(), json!(item));
    serde_json::Value::Object(out)
}

pub fn handle_fetch<E: IpcEntity>(
    holder: &mut EntityHolder<E>,
    remote: &mut RemoteClient,
    req: &Request,
) -> serde_json::Value {
    if let Err(e) = holder.fetch_all(remote) {
        return store_err(&req.id, &e);
    }
    ok(&req.id, state_json(holder))
}

/// Held collection, fetched on first use, narrowed by `params.term`.
pub fn handle_list<E: IpcEntity>(
    holder: &mut EntityHolder<E>,
    remote: &mut RemoteClient,
    req: &Request,
) -> serde_json::Value {
    if let Err(e) = holder.ensure_loaded(remote) {
        return store_err(&req.id, &e);
    }
    let term = optional_str(req, "term").unwrap_or_default();
    let items = calc::filter_by_text(holder.items(), &term, E::SEARCH_FIELDS);

    let mut out = serde_json::Map::new();
    out.insert(E::COLLECTION.to_string(), json!(items));
    out.insert("total".into(), json!(holder.items().len()));
    out.insert("error".into(), json!(holder.error()));
    ok(&req.id, serde_json::Value::Object(out))
}

pub fn handle_get<E: IpcEntity>(
    holder: &mut EntityHolder<E>,
    remote: &mut RemoteClient,
    req: &Request,
) -> serde_json::Value {
    let key = match parse_key::<E>(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    match holder.find(remote, &key) {
        Ok(item) => ok(&req.id, item_json(&item)),
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn handle_create<E: IpcEntity>(
    holder: &mut EntityHolder<E>,
    remote: &mut RemoteClient,
    req: &Request,
) -> serde_json::Value {
    let draft: E::Draft = match body(req, E::ITEM) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match holder.create(remote, &draft) {
        Ok(created) => {
            log::info!("{}: created {}", E::COLLECTION, describe_key(&created));
            ok(&req.id, item_json(&created))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn handle_update<E: IpcEntity>(
    holder: &mut EntityHolder<E>,
    remote: &mut RemoteClient,
    req: &Request,
) -> serde_json::Value {
    let key = match parse_key::<E>(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let draft: E::Draft = match body(req, E::ITEM) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match holder.update(remote, &key, &draft) {
        Ok(updated) => {
            log::info!("{}: updated {}", E::COLLECTION, key);
            ok(&req.id, item_json(&updated))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

pub fn handle_delete<E: IpcEntity>(
    holder: &mut EntityHolder<E>,
    remote: &mut RemoteClient,
    req: &Request,
) -> serde_json::Value {
    let key = match parse_key::<E>(req) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    match holder.delete(remote, &key) {
        Ok(()) => {
            log::info!("{}: deleted {}", E::COLLECTION, key);
            ok(&req.id, json!({ "deleted": key }))
        }
        Err(e) => store_err(&req.id, &e),
    }
}

fn describe_key<E: Entity>(item: &E) -> String {
    item.key()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "(no id)".to_string())
}
