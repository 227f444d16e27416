use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One logo-generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoTask {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub params: LogoParams,
    #[serde(default)]
    pub status: TaskStatus,
    /// Interpret only after branching on `status`.
    pub result: Option<TaskResult>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Generation parameters as submitted by the client. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoParams {
    pub company_name: String,
    pub industry: String,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Fail,
}

impl TaskStatus {
    pub const NON_TERMINAL: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Processing];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Success => "success",
            TaskStatus::Fail => "fail",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Fail)
    }

    /// pending -> processing (optional) -> success | fail. Terminal states are final.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Pending, TaskStatus::Processing) => true,
            (TaskStatus::Pending | TaskStatus::Processing, TaskStatus::Success | TaskStatus::Fail) => {
                true
            }
            _ => false,
        }
    }

    /// Coarse progress percentage for status polling.
    pub fn progress_hint(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 50,
            TaskStatus::Success | TaskStatus::Fail => 100,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a finished task: generated assets on success, a message on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskResult {
    Assets {
        images: Vec<String>,
        #[serde(default)]
        hd_keys: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl TaskResult {
    pub fn error(message: impl Into<String>) -> Self {
        TaskResult::Error {
            message: message.into(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TaskResult::Error { message } => Some(message),
            TaskResult::Assets { .. } => None,
        }
    }
}

impl LogoTask {
    pub const COLLECTION: &'static str = "logo_tasks";

    pub fn new(id: String, owner_id: String, params: LogoParams, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            params,
            status: TaskStatus::Pending,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn hd_keys(&self) -> &[String] {
        match &self.result {
            Some(TaskResult::Assets { hd_keys, .. }) => hd_keys,
            _ => &[],
        }
    }
}
