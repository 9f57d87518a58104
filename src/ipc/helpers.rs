use serde::de::DeserializeOwned;

use crate::ipc::error::err;
use crate::ipc::types::Request;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Non-negative count, `default` when absent.
pub fn optional_count(
    req: &Request,
    key: &str,
    default: usize,
) -> Result<usize, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("{} must be a non-negative integer", key),
                    None,
                )
            }),
    }
}

/// Decodes `params[key]` into a typed body.
pub fn body<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid {}: {}", key, e),
            None,
        )
    })
}
