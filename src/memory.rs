//! In-process [`TimeEntryService`] following the Toggl server conventions.
//!
//! Used by tests and for working without network access. The clock can be
//! pinned so listing windows are deterministic.
//!
//! At most one entry runs at a time: creating or starting a running entry
//! stops the one that was running. Requests are validated in full before
//! anything is written, so a rejected request leaves the store untouched.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tracing::debug;

use crate::error::ServiceError;
use crate::models::{Project, TimeEntry, Workspace};
use crate::service::{TimeEntryRequest, TimeEntryService};
use crate::timestamp;

/// Window the server applies when no lower bound is given.
pub const DEFAULT_LIST_DAYS: i64 = 9;

#[derive(Default)]
struct State {
    next_id: u64,
    entries: BTreeMap<u64, TimeEntry>,
    workspaces: Vec<Workspace>,
    projects: HashMap<u64, Vec<Project>>,
}

impl State {
    fn insert(&mut self, mut entry: TimeEntry) -> TimeEntry {
        self.next_id += 1;
        entry.id = self.next_id;
        self.entries.insert(entry.id, entry.clone());
        entry
    }

    fn stop_running(&mut self, now: DateTime<FixedOffset>) {
        for entry in self.entries.values_mut().filter(|entry| entry.is_running()) {
            stop_entry(entry, now);
        }
    }
}

#[derive(Default)]
pub struct InMemoryService {
    state: Mutex<State>,
    pinned_now: Option<DateTime<FixedOffset>>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every "now" the service needs is `now`.
    pub fn with_clock(now: DateTime<FixedOffset>) -> Self {
        Self {
            pinned_now: Some(now),
            ..Self::default()
        }
    }

    pub fn with_workspace(self, workspace: Workspace) -> Self {
        self.lock().workspaces.push(workspace);
        self
    }

    pub fn with_project(self, workspace_id: u64, project: Project) -> Self {
        self.lock()
            .projects
            .entry(workspace_id)
            .or_default()
            .push(project);
        self
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.pinned_now.unwrap_or_else(|| Utc::now().fixed_offset())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TimeEntryService for InMemoryService {
    fn create_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError> {
        let start = match request.start.as_deref() {
            Some(start) => parse_wire(start)?,
            None => return Err(bad_request("start is required")),
        };
        let now = self.now();
        let mut entry = blank_entry(start, now);
        apply(&mut entry, request)?;
        settle_timing(&mut entry, request);

        let mut state = self.lock();
        if entry.is_running() {
            state.stop_running(now);
        }
        let entry = state.insert(entry);
        debug!(id = entry.id, "in-memory entry created");
        Ok(entry)
    }

    fn get_time_entry(&self, id: u64) -> Result<Option<TimeEntry>, ServiceError> {
        Ok(self.lock().entries.get(&id).cloned())
    }

    fn current_time_entry(&self) -> Result<Option<TimeEntry>, ServiceError> {
        Ok(self
            .lock()
            .entries
            .values()
            .find(|entry| entry.is_running())
            .cloned())
    }

    fn update_time_entry(
        &self,
        id: u64,
        request: &TimeEntryRequest,
    ) -> Result<TimeEntry, ServiceError> {
        let now = self.now();
        let mut state = self.lock();
        let mut entry = state
            .entries
            .get(&id)
            .cloned()
            .ok_or(ServiceError::NotFound)?;
        apply(&mut entry, request)?;
        settle_timing(&mut entry, request);
        entry.at = Some(now);
        state.entries.insert(id, entry.clone());
        Ok(entry)
    }

    fn delete_time_entry(&self, id: u64) -> Result<Vec<u64>, ServiceError> {
        let now = self.now();
        let mut state = self.lock();
        let entry = state.entries.get_mut(&id).ok_or(ServiceError::NotFound)?;
        if entry.server_deleted_at.is_none() {
            entry.server_deleted_at = Some(now);
            entry.at = Some(now);
        }
        Ok(vec![id])
    }

    /// Oldest start first, like the server.
    fn list_time_entries(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<TimeEntry>, ServiceError> {
        let upper = match end {
            Some(end) => parse_wire(end)?,
            None => self.now(),
        };
        let lower = match start {
            Some(start) => parse_wire(start)?,
            None => upper - Duration::days(DEFAULT_LIST_DAYS),
        };

        let mut entries: Vec<TimeEntry> = self
            .lock()
            .entries
            .values()
            .filter(|entry| !entry.is_deleted())
            .filter(|entry| entry.start >= lower && entry.start <= upper)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    fn start_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError> {
        let now = self.now();
        let start = match request.start.as_deref() {
            Some(start) => parse_wire(start)?,
            None => now,
        };
        let mut entry = blank_entry(start, now);
        apply(&mut entry, request)?;
        entry.stop = None;
        entry.duration = -start.timestamp();

        let mut state = self.lock();
        state.stop_running(now);
        let entry = state.insert(entry);
        debug!(id = entry.id, "in-memory entry started");
        Ok(entry)
    }

    /// Stopping an entry that already stopped returns it unchanged.
    fn stop_time_entry(&self, id: u64) -> Result<TimeEntry, ServiceError> {
        let now = self.now();
        let mut state = self.lock();
        let entry = state.entries.get_mut(&id).ok_or(ServiceError::NotFound)?;
        if entry.stop.is_none() {
            stop_entry(entry, now);
        }
        Ok(entry.clone())
    }

    fn workspaces(&self) -> Result<Vec<Workspace>, ServiceError> {
        Ok(self.lock().workspaces.clone())
    }

    fn projects(&self, workspace_id: u64) -> Result<Vec<Project>, ServiceError> {
        Ok(self
            .lock()
            .projects
            .get(&workspace_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn stop_entry(entry: &mut TimeEntry, now: DateTime<FixedOffset>) {
    entry.stop = Some(now);
    entry.duration = (now - entry.start).num_seconds();
    entry.at = Some(now);
}

fn blank_entry(start: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> TimeEntry {
    TimeEntry {
        id: 0,
        workspace_id: None,
        project_id: None,
        task_id: None,
        description: None,
        start,
        stop: None,
        duration: -start.timestamp(),
        billable: false,
        tags: Vec::new(),
        created_with: None,
        at: Some(now),
        server_deleted_at: None,
    }
}

/// Copies every field present in `request` onto `entry`.
///
/// Fails before touching `entry` when a timestamp does not parse.
fn apply(entry: &mut TimeEntry, request: &TimeEntryRequest) -> Result<(), ServiceError> {
    let start = request.start.as_deref().map(parse_wire).transpose()?;
    let stop = request.stop.as_deref().map(parse_wire).transpose()?;

    if let Some(wid) = request.wid {
        entry.workspace_id = Some(wid);
    }
    if let Some(pid) = request.pid {
        entry.project_id = Some(pid);
    }
    if let Some(tid) = request.tid {
        entry.task_id = Some(tid);
    }
    if let Some(description) = &request.description {
        entry.description = Some(description.clone());
    }
    if let Some(start) = start {
        entry.start = start;
    }
    if stop.is_some() {
        entry.stop = stop;
    }
    if let Some(duration) = request.duration {
        entry.duration = duration;
    }
    if let Some(billable) = request.billable {
        entry.billable = billable;
    }
    if let Some(tags) = &request.tags {
        entry.tags = tags.clone();
    }
    if let Some(created_with) = &request.created_with {
        entry.created_with = Some(created_with.clone());
    }
    Ok(())
}

/// Keeps start, stop and duration consistent after a write.
fn settle_timing(entry: &mut TimeEntry, request: &TimeEntryRequest) {
    match (request.stop.is_some(), request.duration) {
        (false, Some(duration)) if duration >= 0 => {
            entry.stop = Some(entry.start + Duration::seconds(duration));
        }
        (false, Some(_)) => entry.stop = None,
        _ => {}
    }

    entry.duration = match entry.stop {
        Some(stop) => (stop - entry.start).num_seconds(),
        None => -entry.start.timestamp(),
    };
}

fn parse_wire(value: &str) -> Result<DateTime<FixedOffset>, ServiceError> {
    timestamp::parse(&value.into()).map_err(|err| bad_request(&err.to_string()))
}

fn bad_request(message: &str) -> ServiceError {
    ServiceError::Status {
        status: 400,
        message: message.to_string(),
    }
}
