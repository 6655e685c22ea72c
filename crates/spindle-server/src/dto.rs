//! JSON shapes of the HTTP API.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use spindle_core::{Task, TaskStatus};

/// Task as returned by the API.
///
/// Timestamps are RFC 3339; `duration` is whole milliseconds and only
/// present once the task has started.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl TaskResponse {
    /// `now` is used for the running duration of a task still in progress.
    pub fn from_task(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id().to_string(),
            title: task.title().to_owned(),
            description: task.description().to_owned(),
            status: task.status(),
            result: task.result().map(str::to_owned),
            error: task.error().map(str::to_owned),
            created_at: rfc3339(task.created_at()),
            started_at: task.started_at().map(rfc3339),
            completed_at: task.completed_at().map(rfc3339),
            duration: task.duration_ms(now),
        }
    }
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        TaskResponse::from_task(task, Utc::now())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
