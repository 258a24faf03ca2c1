use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::timestamp::TimestampInput;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Workspace {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<u64>,
}

/// A time entry as reported by the service.
///
/// Timestamps keep the offset the service sent. Comparing two entries compares
/// their timestamps as instants, so `2015-08-21T07:28:20Z` and
/// `2015-08-21T07:28:20+00:00` are equal.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeEntry {
    pub id: u64,
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<u64>,
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(rename = "tid", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<FixedOffset>>,
    /// Negative while running (minus the start epoch).
    pub duration: i64,
    #[serde(default)]
    pub billable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_deleted_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Running,
    Stopped,
    Deleted,
}

impl TimeEntry {
    pub fn state(&self) -> EntryState {
        if self.server_deleted_at.is_some() {
            EntryState::Deleted
        } else if self.stop.is_some() {
            EntryState::Stopped
        } else {
            EntryState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == EntryState::Running
    }

    pub fn is_deleted(&self) -> bool {
        self.server_deleted_at.is_some()
    }
}

/// Parameters for creating, starting or updating an entry.
///
/// Every field is optional; absent fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeEntryFields {
    pub workspace_id: Option<u64>,
    pub project_id: Option<u64>,
    pub task_id: Option<u64>,
    pub description: Option<String>,
    pub start: Option<TimestampInput>,
    pub stop: Option<TimestampInput>,
    pub duration: Option<i64>,
    pub billable: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl TimeEntryFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, id: u64) -> Self {
        self.workspace_id = Some(id);
        self
    }

    pub fn project(mut self, id: u64) -> Self {
        self.project_id = Some(id);
        self
    }

    pub fn task(mut self, id: u64) -> Self {
        self.task_id = Some(id);
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn start(mut self, value: impl Into<TimestampInput>) -> Self {
        self.start = Some(value.into());
        self
    }

    pub fn stop(mut self, value: impl Into<TimestampInput>) -> Self {
        self.stop = Some(value.into());
        self
    }

    pub fn duration(mut self, seconds: i64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn billable(mut self, value: bool) -> Self {
        self.billable = Some(value);
        self
    }

    pub fn tags<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a workspace, project or task is set.
    pub fn has_context(&self) -> bool {
        self.workspace_id.is_some() || self.project_id.is_some() || self.task_id.is_some()
    }
}
