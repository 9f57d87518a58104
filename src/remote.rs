use reqwest::blocking::{Client, Response};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::error::{StoreError, StoreResult};
use crate::model::{Entity, Grade, Student, Subject};
use crate::session::Session;

/// The slice of the REST collaborator an `EntityHolder` needs.
pub trait RemoteCollection<E: Entity> {
    fn list(&mut self) -> StoreResult<Vec<E>>;
    fn fetch(&mut self, key: &E::Key) -> StoreResult<E>;
    fn create(&mut self, draft: &E::Draft) -> StoreResult<E>;
    fn update(&mut self, key: &E::Key, draft: &E::Draft) -> StoreResult<E>;
    fn delete(&mut self, key: &E::Key) -> StoreResult<()>;
}

pub struct RemoteClient {
    http: Client,
    base_url: Url,
    session: Session,
}

impl RemoteClient {
    pub fn new(cfg: &RemoteConfig, session: Session) -> anyhow::Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| anyhow::anyhow!("invalid remote base_url {:?}: {e}", cfg.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("remote base_url {:?} cannot carry a path", cfg.base_url);
        }
        let timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn replace_session(&mut self, session: Session) {
        self.session = session;
    }

    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    fn execute(&mut self, method: Method, url: Url, body: Option<Value>) -> StoreResult<Response> {
        log::debug!("{method} {url}");
        let mut rb = self.http.request(method.clone(), url.clone());
        if let Some(token) = self.session.token() {
            rb = rb.bearer_auth(token);
        }
        if let Some(b) = body {
            rb = rb.json(&b);
        }
        let resp = rb.send().map_err(|e| {
            log::warn!("{method} {url} failed: {e}");
            StoreError::from(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status.as_u16() == 401 {
            log::warn!("{method} {url}: session rejected, clearing credential");
            if let Err(e) = self.session.clear() {
                log::error!("failed to clear stored credential: {e:#}");
            }
            return Err(StoreError::Unauthorized);
        }
        let message = error_message(status, resp.text().unwrap_or_default());
        log::warn!("{method} {url} -> {}: {message}", status.as_u16());
        Err(StoreError::from_status(status.as_u16(), message))
    }

    fn get_json<T: DeserializeOwned>(&mut self, url: Url) -> StoreResult<T> {
        let resp = self.execute(Method::GET, url, None)?;
        decode(resp)
    }

    fn send_json<T: DeserializeOwned>(
        &mut self,
        method: Method,
        url: Url,
        body: &impl serde::Serialize,
    ) -> StoreResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| StoreError::Transport(format!("encode request body: {e}")))?;
        let resp = self.execute(method, url, Some(body))?;
        decode(resp)
    }

    pub fn search_students(&mut self, name: &str) -> StoreResult<Vec<Student>> {
        let url = self.url(&["students", "search"], &[("name", name.to_string())]);
        self.get_json(url)
    }

    pub fn students_by_birth_year(&mut self, year: i32) -> StoreResult<Vec<Student>> {
        let year = year.to_string();
        let url = self.url(&["students", "birth-year", &year], &[]);
        self.get_json(url)
    }

    pub fn search_subjects(&mut self, name: &str) -> StoreResult<Vec<Subject>> {
        let url = self.url(&["subjects", "search"], &[("name", name.to_string())]);
        self.get_json(url)
    }

    pub fn grades_by_student(&mut self, student_id: &str) -> StoreResult<Vec<Grade>> {
        let url = self.url(&["grades", "student", student_id], &[]);
        self.get_json(url)
    }

    pub fn grades_by_subject(&mut self, subject_id: &str) -> StoreResult<Vec<Grade>> {
        let url = self.url(&["grades", "subject", subject_id], &[]);
        self.get_json(url)
    }

    pub fn student_average(&mut self, student_id: &str) -> StoreResult<f64> {
        let url = self.url(&["grades", "student", student_id, "average"], &[]);
        let v: Value = self.get_json(url)?;
        parse_average(&v)
    }

    pub fn subject_average(&mut self, subject_id: &str) -> StoreResult<f64> {
        let url = self.url(&["grades", "subject", subject_id, "average"], &[]);
        let v: Value = self.get_json(url)?;
        parse_average(&v)
    }
}

impl<E: Entity> RemoteCollection<E> for RemoteClient {
    fn list(&mut self) -> StoreResult<Vec<E>> {
        let url = self.url(&[E::COLLECTION], &[]);
        self.get_json(url)
    }

    fn fetch(&mut self, key: &E::Key) -> StoreResult<E> {
        let key = key.to_string();
        let url = self.url(&[E::COLLECTION, &key], &[]);
        self.get_json(url)
    }

    fn create(&mut self, draft: &E::Draft) -> StoreResult<E> {
        let url = self.url(&[E::COLLECTION], &[]);
        self.send_json(Method::POST, url, draft)
    }

    fn update(&mut self, key: &E::Key, draft: &E::Draft) -> StoreResult<E> {
        let key = key.to_string();
        let url = self.url(&[E::COLLECTION, &key], &[]);
        self.send_json(Method::PUT, url, draft)
    }

    fn delete(&mut self, key: &E::Key) -> StoreResult<()> {
        let key = key.to_string();
        let url = self.url(&[E::COLLECTION, &key], &[]);
        self.execute(Method::DELETE, url, None)?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> StoreResult<T> {
    let text = resp.text()?;
    serde_json::from_str(&text)
        .map_err(|e| StoreError::Transport(format!("unexpected response body: {e}")))
}

/// Prefers the `message` (or `error`) field of a JSON error body.
fn error_message(status: reqwest::StatusCode, body: String) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(&body) {
        for key in ["message", "error"] {
            if let Some(m) = v.get(key).and_then(|m| m.as_str()) {
                if !m.trim().is_empty() {
                    return m.trim().to_string();
                }
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

/// The average endpoints answer with a bare number (possibly as a decimal
/// string) or `{"averageScore": n}`. No grades reads as 0.
pub fn parse_average(v: &Value) -> StoreResult<f64> {
    let inner = v.get("averageScore").unwrap_or(v);
    match inner {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| StoreError::Transport("average is not a finite number".into())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| StoreError::Transport(format!("average {s:?} is not a number"))),
        other => Err(StoreError::Transport(format!(
            "unexpected average payload: {other}"
        ))),
    }
}
