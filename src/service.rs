use serde::Serialize;

use crate::error::ServiceError;
use crate::models::{Project, TimeEntry, Workspace};

/// Request body for create, start and update.
///
/// Timestamps are already in canonical form; absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeEntryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_with: Option<String>,
}

/// The remote time tracking service.
///
/// Implementations report failures as [`ServiceError`] and never interpret
/// them. An empty result for `get_time_entry` or `current_time_entry` is
/// `Ok(None)`.
pub trait TimeEntryService {
    fn create_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError>;

    fn get_time_entry(&self, id: u64) -> Result<Option<TimeEntry>, ServiceError>;

    fn current_time_entry(&self) -> Result<Option<TimeEntry>, ServiceError>;

    fn update_time_entry(
        &self,
        id: u64,
        request: &TimeEntryRequest,
    ) -> Result<TimeEntry, ServiceError>;

    /// Returns the ids the service confirms as deleted.
    fn delete_time_entry(&self, id: u64) -> Result<Vec<u64>, ServiceError>;

    /// Bounds are canonical timestamps; `None` leaves the service default.
    fn list_time_entries(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<TimeEntry>, ServiceError>;

    fn start_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError>;

    fn stop_time_entry(&self, id: u64) -> Result<TimeEntry, ServiceError>;

    fn workspaces(&self) -> Result<Vec<Workspace>, ServiceError>;

    fn projects(&self, workspace_id: u64) -> Result<Vec<Project>, ServiceError>;
}

impl<S: TimeEntryService + ?Sized> TimeEntryService for &S {
    fn create_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError> {
        (**self).create_time_entry(request)
    }

    fn get_time_entry(&self, id: u64) -> Result<Option<TimeEntry>, ServiceError> {
        (**self).get_time_entry(id)
    }

    fn current_time_entry(&self) -> Result<Option<TimeEntry>, ServiceError> {
        (**self).current_time_entry()
    }

    fn update_time_entry(
        &self,
        id: u64,
        request: &TimeEntryRequest,
    ) -> Result<TimeEntry, ServiceError> {
        (**self).update_time_entry(id, request)
    }

    fn delete_time_entry(&self, id: u64) -> Result<Vec<u64>, ServiceError> {
        (**self).delete_time_entry(id)
    }

    fn list_time_entries(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<TimeEntry>, ServiceError> {
        (**self).list_time_entries(start, end)
    }

    fn start_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError> {
        (**self).start_time_entry(request)
    }

    fn stop_time_entry(&self, id: u64) -> Result<TimeEntry, ServiceError> {
        (**self).stop_time_entry(id)
    }

    fn workspaces(&self) -> Result<Vec<Workspace>, ServiceError> {
        (**self).workspaces()
    }

    fn projects(&self, workspace_id: u64) -> Result<Vec<Project>, ServiceError> {
        (**self).projects(workspace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_fields() {
        let request = TimeEntryRequest {
            wid: Some(777),
            start: Some("2015-08-21T09:21:02Z".to_string()),
            duration: Some(77),
            ..TimeEntryRequest::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "wid": 777,
                "start": "2015-08-21T09:21:02Z",
                "duration": 77
            })
        );
    }
}
