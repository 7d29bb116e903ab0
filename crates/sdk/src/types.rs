// SDK Types - response payloads for the calls the drivers rely on

use serde::{Deserialize, Serialize};
use squonk2_core::domain::InstancePhase;
use squonk2_core::port::{InstanceStatus, TaskStatus};

type Extra = serde_json::Map<String, serde_json::Value>;

/// `GET /version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
}

/// Entry of `GET /project`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectsList {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

impl ProjectsList {
    pub fn find_by_id(&self, project_id: &str) -> Option<&ProjectSummary> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ProjectSummary> {
        self.projects.iter().find(|p| p.name == name)
    }
}

/// `POST /project`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreated {
    pub project_id: String,
}

/// Entry of `GET /file`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub file_name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `GET /file`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFiles {
    #[serde(default)]
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl ProjectFiles {
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.file_name.as_str())
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.file_names().any(|name| name == file_name)
    }
}

/// `POST /instance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStarted {
    pub instance_id: String,
    pub task_id: String,
}

/// `GET /instance/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub phase: InstancePhase,
    /// Timestamp, absent until the instance starts
    #[serde(default)]
    pub started: Option<String>,
    /// Timestamp, absent until the instance stops
    #[serde(default)]
    pub stopped: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl From<InstanceInfo> for InstanceStatus {
    fn from(info: InstanceInfo) -> Self {
        InstanceStatus {
            phase: info.phase,
            started: info.started.is_some(),
            stopped: info.stopped.is_some(),
        }
    }
}

/// A Task event log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    #[serde(default)]
    pub ordinal: Option<u64>,
    pub time: String,
    pub level: String,
    pub message: String,
}

/// `GET /task/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub done: bool,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub events: Vec<TaskEvent>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl From<TaskInfo> for TaskStatus {
    fn from(info: TaskInfo) -> Self {
        TaskStatus {
            done: info.done,
            exit_code: info.exit_code,
        }
    }
}

/// `GET /application/{id}`, versions newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    #[serde(default)]
    pub versions: Vec<String>,
}

/// `GET /job/{id}` and `GET /job/get-by-version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: u64,
    pub collection: String,
    pub job: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Account Server create responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

/// A new Account Server product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    /// i.e. `DATA_MANAGER_STORAGE_SUBSCRIPTION`
    pub product_type: String,
    /// Zero means "not set"
    pub allowance: u32,
    /// Zero means "not set"
    pub limit: u32,
    pub flavour: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, product_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            product_type: product_type.into(),
            allowance: 0,
            limit: 0,
            flavour: None,
        }
    }

    pub fn with_allowance(mut self, allowance: u32) -> Self {
        self.allowance = allowance;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_flavour(mut self, flavour: impl Into<String>) -> Self {
        self.flavour = Some(flavour.into());
        self
    }

    /// The JSON body sent to the Account Server
    pub(crate) fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert("type".into(), self.product_type.clone().into());
        body.insert("name".into(), self.name.clone().into());
        if let Some(flavour) = &self.flavour {
            body.insert("flavour".into(), flavour.clone().into());
        }
        if self.allowance > 0 {
            body.insert("allowance".into(), self.allowance.into());
        }
        if self.limit > 0 {
            body.insert("limit".into(), self.limit.into());
        }
        serde_json::Value::Object(body)
    }
}
