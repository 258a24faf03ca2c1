use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_CREATED_WITH};
use crate::error::{Result, TogglError};
use crate::models::{Project, TimeEntry, TimeEntryFields, Workspace};
use crate::service::{TimeEntryRequest, TimeEntryService};
use crate::timestamp::{self, TimestampInput};
use crate::toggl::TogglApi;

/// Time entry operations on top of a [`TimeEntryService`].
///
/// Arguments are validated and timestamps encoded here; anything the service
/// reports comes back unchanged as [`TogglError::Service`].
pub struct TimeEntryClient<S> {
    service: S,
    created_with: String,
}

impl TimeEntryClient<TogglApi> {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let service = TogglApi::new(config)?;
        Ok(Self::new(service).with_created_with(config.created_with.clone()))
    }
}

impl<S: TimeEntryService> TimeEntryClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            created_with: DEFAULT_CREATED_WITH.to_string(),
        }
    }

    pub fn with_created_with(mut self, created_with: impl Into<String>) -> Self {
        self.created_with = created_with.into();
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn create(&self, fields: &TimeEntryFields) -> Result<TimeEntry> {
        if fields.start.is_none() {
            return Err(reject("create", "start is required"));
        }
        require_context("create", fields)?;

        let request = self.encode(fields, true)?;
        debug!(
            wid = ?request.wid,
            pid = ?request.pid,
            tid = ?request.tid,
            "creating time entry"
        );
        let entry = self.service.create_time_entry(&request)?;
        info!(id = entry.id, "time entry created");
        Ok(entry)
    }

    /// Soft-deleted entries are returned with their deletion marker.
    pub fn get(&self, id: u64) -> Result<Option<TimeEntry>> {
        debug!(id, "fetching time entry");
        Ok(self.service.get_time_entry(id)?)
    }

    /// The running entry, or `None` when nothing is running.
    pub fn current(&self) -> Result<Option<TimeEntry>> {
        debug!("fetching current time entry");
        Ok(self.service.current_time_entry()?)
    }

    pub fn update(&self, id: u64, fields: &TimeEntryFields) -> Result<TimeEntry> {
        let request = self.encode(fields, false)?;
        debug!(id, "updating time entry");
        Ok(self.service.update_time_entry(id, &request)?)
    }

    /// Returns the ids the service confirmed as deleted.
    pub fn delete(&self, id: u64) -> Result<Vec<u64>> {
        debug!(id, "deleting time entry");
        let deleted = self.service.delete_time_entry(id)?;
        info!(id, "time entry deleted");
        Ok(deleted)
    }

    /// Entries whose start lies within the inclusive bounds, in the order the
    /// service reports them (oldest start first on Toggl).
    ///
    /// Missing bounds are left to the service, which defaults to the trailing
    /// nine days up to now.
    pub fn list(
        &self,
        start: Option<TimestampInput>,
        end: Option<TimestampInput>,
    ) -> Result<Vec<TimeEntry>> {
        let start = start.map(timestamp::format).transpose()?;
        let end = end.map(timestamp::format).transpose()?;
        debug!(start = ?start, end = ?end, "listing time entries");

        Ok(self
            .service
            .list_time_entries(start.as_deref(), end.as_deref())?)
    }

    /// Starts a running entry; `start` defaults to the service's now.
    pub fn start(&self, fields: &TimeEntryFields) -> Result<TimeEntry> {
        require_context("start", fields)?;

        let request = self.encode(fields, true)?;
        debug!(
            wid = ?request.wid,
            pid = ?request.pid,
            tid = ?request.tid,
            "starting time entry"
        );
        let entry = self.service.start_time_entry(&request)?;
        info!(id = entry.id, "time entry started");
        Ok(entry)
    }

    pub fn stop(&self, id: u64) -> Result<TimeEntry> {
        debug!(id, "stopping time entry");
        let entry = self.service.stop_time_entry(id)?;
        info!(id, duration = entry.duration, "time entry stopped");
        Ok(entry)
    }

    pub fn workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(self.service.workspaces()?)
    }

    pub fn projects(&self, workspace_id: u64) -> Result<Vec<Project>> {
        Ok(self.service.projects(workspace_id)?)
    }

    fn encode(&self, fields: &TimeEntryFields, stamp: bool) -> Result<TimeEntryRequest> {
        let start = fields.start.clone().map(timestamp::format).transpose()?;
        let stop = fields.stop.clone().map(timestamp::format).transpose()?;

        Ok(TimeEntryRequest {
            wid: fields.workspace_id,
            pid: fields.project_id,
            tid: fields.task_id,
            description: fields.description.clone(),
            start,
            stop,
            duration: fields.duration,
            billable: fields.billable,
            tags: fields.tags.clone(),
            created_with: stamp.then(|| self.created_with.clone()),
        })
    }
}

fn require_context(operation: &str, fields: &TimeEntryFields) -> Result<()> {
    if fields.has_context() {
        Ok(())
    } else {
        Err(reject(operation, "a workspace, project or task is required"))
    }
}

fn reject(operation: &str, message: &str) -> TogglError {
    warn!(operation, reason = message, "rejected time entry request");
    TogglError::invalid(format!("{operation}: {message}"))
}
