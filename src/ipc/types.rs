use std::path::PathBuf;

use serde::Deserialize;

use crate::holder::EntityHolder;
use crate::model::{Grade, Student, Subject};
use crate::remote::RemoteClient;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub remote: RemoteClient,
    pub students: EntityHolder<Student>,
    pub subjects: EntityHolder<Subject>,
    pub grades: EntityHolder<Grade>,
}

impl AppState {
    pub fn new(remote: RemoteClient, workspace: Option<PathBuf>) -> Self {
        Self {
            workspace,
            remote,
            students: EntityHolder::new(),
            subjects: EntityHolder::new(),
            grades: EntityHolder::new(),
        }
    }
}
