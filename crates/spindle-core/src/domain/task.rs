//! Task entity and its state machine.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::errors::SpindleError;
use super::ids::TaskId;

/// Task status.
///
/// State transitions:
/// - Pending -> Processing -> Completed
/// - Pending -> Processing -> Failed
///
/// `Completed` and `Failed` are terminal. `Processing -> Processing` is
/// accepted as a re-entry and leaves `started_at` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Stored and queued, not yet picked up by a worker.
    Pending,

    /// A worker is running it.
    Processing,

    Completed,

    /// Defined for completeness; the scheduler never produces it.
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (
                    TaskStatus::Processing,
                    TaskStatus::Processing | TaskStatus::Completed | TaskStatus::Failed
                )
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of asynchronous work.
///
/// Design:
/// - The store holds the single authoritative copy.
/// - Workers fetch an owned clone, transition it, and write it back through
///   `TaskStore::update`.
/// - Fields are read through getters; lifecycle changes only happen through
///   [`Task::transition`] and the id is set once by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,

    /// Human-readable elapsed time, refreshed on every transition once the
    /// task has started (e.g. `"1.5s"`).
    duration_text: Option<String>,

    result: Option<String>,
    error: Option<String>,
}

impl Task {
    /// Build a new `Pending` task. The id is assigned later by the store.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::UNASSIGNED,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            duration_text: None,
            result: None,
            error: None,
        }
    }

    /// Give a freshly built task its store id.
    ///
    /// Fails if the task already has one.
    pub fn assign_id(&mut self, id: TaskId) -> Result<(), SpindleError> {
        if self.id.is_assigned() {
            return Err(SpindleError::Internal(format!(
                "task {} already has an id",
                self.id
            )));
        }
        self.id = id;
        Ok(())
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Set on the first move to `Processing`, never changed afterwards.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Set when the task reaches a terminal status.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn duration_text(&self) -> Option<&str> {
        self.duration_text.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply a state transition and its timestamp side effects.
    ///
    /// An illegal edge returns `InvalidTransition` and leaves the task as it
    /// was.
    pub fn transition(&mut self, next: TaskStatus, now: DateTime<Utc>) -> Result<(), SpindleError> {
        if !self.status.can_transition_to(next) {
            return Err(SpindleError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        match next {
            TaskStatus::Processing => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
            }
            TaskStatus::Completed | TaskStatus::Failed => {
                self.completed_at = Some(now);
            }
            TaskStatus::Pending => {}
        }

        if self.started_at.is_some() {
            self.duration_text = Some(format_elapsed(self.duration(now)));
        }
        Ok(())
    }

    /// Mark as processing.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SpindleError> {
        self.transition(TaskStatus::Processing, now)
    }

    /// Mark as completed with a result message.
    pub fn complete(
        &mut self,
        result: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), SpindleError> {
        self.transition(TaskStatus::Completed, now)?;
        self.result = Some(result.into());
        Ok(())
    }

    /// Mark as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<(), SpindleError> {
        self.transition(TaskStatus::Failed, now)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Processing time: `(completed_at or now) - started_at`.
    ///
    /// Zero before the task starts, never negative, and fixed once
    /// `completed_at` is set.
    pub fn duration(&self, now: DateTime<Utc>) -> TimeDelta {
        let Some(started_at) = self.started_at else {
            return TimeDelta::zero();
        };
        let end = self.completed_at.unwrap_or(now);
        (end - started_at).max(TimeDelta::zero())
    }

    /// Processing time in whole milliseconds, `None` until started.
    pub fn duration_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        self.started_at
            .map(|_| self.duration(now).num_milliseconds())
    }
}

fn format_elapsed(delta: TimeDelta) -> String {
    format!("{:?}", delta.to_std().unwrap_or_default())
}
