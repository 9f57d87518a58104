#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use tiny_http::{Header, Method, Response, Server};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// In-memory REST collaborator state.
#[derive(Default)]
pub struct MockDb {
    pub students: Vec<Value>,
    pub subjects: Vec<Value>,
    pub grades: Vec<Value>,
    pub next_grade_id: i64,
    /// Answer every request with a 500.
    pub fail_all: bool,
    /// `METHOD /path?query` plus the Authorization header of each request.
    pub seen: Vec<(String, Option<String>)>,
}

impl MockDb {
    pub fn scenario() -> Self {
        Self {
            students: vec![
                json!({ "studentId": "SV001", "studentName": "An", "birthYear": 2000 }),
                json!({ "studentId": "SV002", "studentName": "Binh", "birthYear": 2001 }),
            ],
            subjects: vec![json!({ "subjectId": "MH001", "subjectName": "Math" })],
            grades: vec![
                json!({ "id": 1, "studentId": "SV001", "subjectId": "MH001", "averageScore": 8.0 }),
                json!({ "id": 2, "studentId": "SV002", "subjectId": "MH001", "averageScore": 6.0 }),
            ],
            next_grade_id: 2,
            ..Self::default()
        }
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub db: Arc<Mutex<MockDb>>,
}

impl MockBackend {
    pub fn start(seed: MockDb) -> Self {
        let server = Server::http("127.0.0.1:0").expect("start mock backend");
        let port = server.server_addr().to_ip().expect("ip listener").port();
        let db = Arc::new(Mutex::new(seed));
        let shared = Arc::clone(&db);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let auth = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());
                let method = request.method().clone();
                let url = request.url().to_string();

                let (status, payload) = {
                    let mut db = shared.lock().expect("mock db lock");
                    db.seen.push((format!("{} {}", method.as_str(), url), auth.clone()));
                    route(&mut db, &method, &url, auth.as_deref(), &body)
                };
                let ct = Header::from_bytes("Content-Type", "application/json").expect("header");
                let text = payload.map(|v| v.to_string()).unwrap_or_default();
                let _ = request.respond(
                    Response::from_string(text)
                        .with_status_code(status)
                        .with_header(ct),
                );
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{port}/api"),
            db,
        }
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.db.lock().expect("mock db lock").fail_all = fail;
    }

    pub fn seen(&self) -> Vec<(String, Option<String>)> {
        self.db.lock().expect("mock db lock").seen.clone()
    }

    pub fn count(&self, collection: &str) -> usize {
        let db = self.db.lock().expect("mock db lock");
        match collection {
            "students" => db.students.len(),
            "subjects" => db.subjects.len(),
            _ => db.grades.len(),
        }
    }
}

fn message(text: &str) -> Option<Value> {
    Some(json!({ "message": text }))
}

fn decode_query_value(raw: &str) -> String {
    raw.replace('+', " ").replace("%20", " ")
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| decode_query_value(v))
    })
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(|x| x.as_str()).unwrap_or("")
}

fn average(grades: &[&Value]) -> f64 {
    if grades.is_empty() {
        return 0.0;
    }
    let sum: f64 = grades
        .iter()
        .map(|g| g.get("averageScore").and_then(|x| x.as_f64()).unwrap_or(0.0))
        .sum();
    sum / grades.len() as f64
}

fn route(
    db: &mut MockDb,
    method: &Method,
    url: &str,
    auth: Option<&str>,
    body: &str,
) -> (u16, Option<Value>) {
    if db.fail_all {
        return (500, message("backend unavailable"));
    }
    if auth == Some("Bearer expired") {
        return (401, None);
    }

    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let Some(path) = path.strip_prefix("/api/") else {
        return (404, message("no such route"));
    };
    let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    match (method, segs.as_slice()) {
        (Method::Get, ["students"]) => (200, Some(json!(db.students))),
        (Method::Get, ["students", "search"]) => {
            let name = query_param(query, "name").unwrap_or_default().to_lowercase();
            let hits: Vec<&Value> = db
                .students
                .iter()
                .filter(|s| str_field(s, "studentName").to_lowercase().contains(&name))
                .collect();
            (200, Some(json!(hits)))
        }
        (Method::Get, ["students", "birth-year", year]) => {
            let year: i64 = year.parse().unwrap_or(-1);
            let hits: Vec<&Value> = db
                .students
                .iter()
                .filter(|s| s.get("birthYear").and_then(|y| y.as_i64()) == Some(year))
                .collect();
            (200, Some(json!(hits)))
        }
        (Method::Post, ["students"]) => {
            let id = str_field(&parsed, "studentId").to_string();
            if db.students.iter().any(|s| str_field(s, "studentId") == id) {
                return (409, message(&format!("student {id} already exists")));
            }
            db.students.push(parsed.clone());
            (201, Some(parsed))
        }
        (_, ["students", id]) => keyed(db, method, "students", "studentId", id, parsed),
        (Method::Get, ["subjects"]) => (200, Some(json!(db.subjects))),
        (Method::Get, ["subjects", "search"]) => {
            let name = query_param(query, "name").unwrap_or_default().to_lowercase();
            let hits: Vec<&Value> = db
                .subjects
                .iter()
                .filter(|s| str_field(s, "subjectName").to_lowercase().contains(&name))
                .collect();
            (200, Some(json!(hits)))
        }
        (Method::Post, ["subjects"]) => {
            let id = str_field(&parsed, "subjectId").to_string();
            if db.subjects.iter().any(|s| str_field(s, "subjectId") == id) {
                return (409, message(&format!("subject {id} already exists")));
            }
            db.subjects.push(parsed.clone());
            (201, Some(parsed))
        }
        (_, ["subjects", id]) => keyed(db, method, "subjects", "subjectId", id, parsed),
        (Method::Get, ["grades"]) => (200, Some(json!(db.grades))),
        (Method::Post, ["grades"]) => {
            let sid = str_field(&parsed, "studentId").to_string();
            let mid = str_field(&parsed, "subjectId").to_string();
            if db
                .grades
                .iter()
                .any(|g| str_field(g, "studentId") == sid && str_field(g, "subjectId") == mid)
            {
                return (409, message("grade already exists for this student and subject"));
            }
            db.next_grade_id += 1;
            let mut g = parsed;
            g["id"] = json!(db.next_grade_id);
            db.grades.push(g.clone());
            (201, Some(g))
        }
        (Method::Get, ["grades", kind @ ("student" | "subject"), id]) => {
            let field = if *kind == "student" { "studentId" } else { "subjectId" };
            let hits: Vec<&Value> = db
                .grades
                .iter()
                .filter(|g| str_field(g, field) == *id)
                .collect();
            (200, Some(json!(hits)))
        }
        (Method::Get, ["grades", kind @ ("student" | "subject"), id, "average"]) => {
            let field = if *kind == "student" { "studentId" } else { "subjectId" };
            let hits: Vec<&Value> = db
                .grades
                .iter()
                .filter(|g| str_field(g, field) == *id)
                .collect();
            // Bare decimal, as the real backend answers.
            (200, Some(json!(average(&hits))))
        }
        (_, ["grades", id]) => {
            let Ok(gid) = id.parse::<i64>() else {
                return (400, message("grade id must be numeric"));
            };
            let pos = db
                .grades
                .iter()
                .position(|g| g.get("id").and_then(|x| x.as_i64()) == Some(gid));
            let Some(pos) = pos else {
                return (404, message(&format!("grade {gid} not found")));
            };
            match method {
                Method::Get => (200, Some(db.grades[pos].clone())),
                Method::Put => {
                    let mut g = parsed;
                    g["id"] = json!(gid);
                    db.grades[pos] = g.clone();
                    (200, Some(g))
                }
                Method::Delete => {
                    db.grades.remove(pos);
                    (204, None)
                }
                _ => (405, None),
            }
        }
        _ => (404, message("no such route")),
    }
}

fn keyed(
    db: &mut MockDb,
    method: &Method,
    collection: &str,
    key_field: &str,
    id: &str,
    parsed: Value,
) -> (u16, Option<Value>) {
    let rows = if collection == "students" {
        &mut db.students
    } else {
        &mut db.subjects
    };
    let Some(pos) = rows.iter().position(|r| str_field(r, key_field) == id) else {
        return (404, message(&format!("{collection} {id} not found")));
    };
    match method {
        Method::Get => (200, Some(rows[pos].clone())),
        Method::Put => {
            rows[pos] = parsed.clone();
            (200, Some(parsed))
        }
        Method::Delete => {
            rows.remove(pos);
            // Cascade, as the real backend does.
            db.grades.retain(|g| str_field(g, key_field) != id);
            (204, None)
        }
        _ => (405, None),
    }
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
}

pub fn spawn_sidecar(base_url: &str, workspace: Option<&PathBuf>) -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let config = temp_dir("gradebookd-cfg").join("config.toml");
    let mut cmd = Command::new(exe);
    cmd.env("GRADEBOOKD_CONFIG", &config)
        .env("GRADEBOOKD_API_URL", base_url)
        .env("GRADEBOOKD_TIMEOUT_SECS", "5")
        .env_remove("GRADEBOOKD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    if let Some(ws) = workspace {
        cmd.env("GRADEBOOKD_WORKSPACE", ws);
    }
    let mut child = cmd.spawn().expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
    }
}

impl Sidecar {
    pub fn request(&mut self, id: &str, method: &str, params: Value) -> Value {
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: Value = serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        value
    }

    pub fn request_ok(&mut self, id: &str, method: &str, params: Value) -> Value {
        let value = self.request(id, method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or(Value::Null)
    }

    /// Returns the error code of a failed response.
    pub fn request_err(&mut self, id: &str, method: &str, params: Value) -> String {
        let value = self.request(id, method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    }

    pub fn shutdown(mut self) {
        drop(self.stdin);
        let _ = self.child.wait();
    }
}
