use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::models::{Project, TimeEntry, Workspace};
use crate::service::{TimeEntryRequest, TimeEntryService};

/// `{"data": ...}` wrapper around single time entries.
#[derive(Debug, Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct TimeEntryBody<'a> {
    time_entry: &'a TimeEntryRequest,
}

/// HTTP implementation of [`TimeEntryService`] against the Toggl REST API.
#[derive(Clone)]
pub struct TogglApi {
    client: Client,
    base_url: String,
    credentials: String,
}

impl TogglApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| ServiceError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: basic_credentials(&config.api_token),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|err| ServiceError::Network(err.to_string()))
    }

    fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&TimeEntryRequest>,
    ) -> Result<String, ServiceError> {
        debug!(%method, %url, "sending Toggl request");
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Basic {}", self.credentials));
        if let Some(body) = body {
            request = request.json(&TimeEntryBody { time_entry: body });
        }

        let response = request
            .send()
            .map_err(|err| ServiceError::Network(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| ServiceError::Network(err.to_string()))?;

        if let Err(err) = check_status(status, &text) {
            warn!(%method, %url, status = status.as_u16(), "Toggl request failed");
            return Err(err);
        }
        Ok(text)
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&TimeEntryRequest>,
    ) -> Result<T, ServiceError> {
        let url = self.url(path)?;
        let text = self.send(method, url, body)?;
        decode(&text)
    }

    fn fetch_entry(
        &self,
        method: Method,
        path: &str,
        body: Option<&TimeEntryRequest>,
    ) -> Result<TimeEntry, ServiceError> {
        self.fetch::<Data<TimeEntry>>(method, path, body)
            .map(|envelope| envelope.data)
    }

    fn fetch_optional_entry(&self, path: &str) -> Result<Option<TimeEntry>, ServiceError> {
        let url = self.url(path)?;
        let text = self.send(Method::GET, url, None)?;
        decode_optional_entry(&text)
    }
}

impl TimeEntryService for TogglApi {
    fn create_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError> {
        self.fetch_entry(Method::POST, "time_entries", Some(request))
    }

    fn get_time_entry(&self, id: u64) -> Result<Option<TimeEntry>, ServiceError> {
        self.fetch_optional_entry(&format!("time_entries/{id}"))
    }

    fn current_time_entry(&self) -> Result<Option<TimeEntry>, ServiceError> {
        self.fetch_optional_entry("time_entries/current")
    }

    fn update_time_entry(
        &self,
        id: u64,
        request: &TimeEntryRequest,
    ) -> Result<TimeEntry, ServiceError> {
        self.fetch_entry(Method::PUT, &format!("time_entries/{id}"), Some(request))
    }

    fn delete_time_entry(&self, id: u64) -> Result<Vec<u64>, ServiceError> {
        self.fetch(Method::DELETE, &format!("time_entries/{id}"), None)
    }

    fn list_time_entries(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<TimeEntry>, ServiceError> {
        let url = list_url(&self.base_url, start, end)?;
        let text = self.send(Method::GET, url, None)?;
        decode(&text)
    }

    fn start_time_entry(&self, request: &TimeEntryRequest) -> Result<TimeEntry, ServiceError> {
        self.fetch_entry(Method::POST, "time_entries/start", Some(request))
    }

    fn stop_time_entry(&self, id: u64) -> Result<TimeEntry, ServiceError> {
        self.fetch_entry(Method::PUT, &format!("time_entries/{id}/stop"), None)
    }

    fn workspaces(&self) -> Result<Vec<Workspace>, ServiceError> {
        self.fetch(Method::GET, "workspaces", None)
    }

    fn projects(&self, workspace_id: u64) -> Result<Vec<Project>, ServiceError> {
        // Workspaces without projects answer with `null`.
        self.fetch::<Option<Vec<Project>>>(
            Method::GET,
            &format!("workspaces/{workspace_id}/projects"),
            None,
        )
        .map(Option::unwrap_or_default)
    }
}

fn basic_credentials(token: &str) -> String {
    STANDARD.encode(format!("{token}:api_token"))
}

/// Only the bounds that were given are sent, so the server applies its own
/// default window for the rest.
fn list_url(base_url: &str, start: Option<&str>, end: Option<&str>) -> Result<Url, ServiceError> {
    let mut params = Vec::new();
    if let Some(start) = start {
        params.push(("start_date", start));
    }
    if let Some(end) = end {
        params.push(("end_date", end));
    }

    let base = format!("{}/time_entries", base_url.trim_end_matches('/'));
    let url = if params.is_empty() {
        Url::parse(&base)
    } else {
        Url::parse_with_params(&base, &params)
    };
    url.map_err(|err| ServiceError::Network(err.to_string()))
}

fn check_status(status: StatusCode, body: &str) -> Result<(), ServiceError> {
    match status.as_u16() {
        401 | 403 => Err(ServiceError::Unauthorized),
        402 => Err(ServiceError::PaymentRequired),
        404 => Err(ServiceError::NotFound),
        429 => Err(ServiceError::RateLimited),
        _ if status.is_server_error() => Err(ServiceError::ServerError(format!(
            "Toggl API error: {status}"
        ))),
        _ if !status.is_success() => Err(ServiceError::Status {
            status: status.as_u16(),
            message: body.trim().to_string(),
        }),
        _ => Ok(()),
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|err| ServiceError::Decode(err.to_string()))
}

fn decode_optional_entry(body: &str) -> Result<Option<TimeEntry>, ServiceError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    decode::<Data<Option<TimeEntry>>>(trimmed).map(|envelope| envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_use_api_token_password() {
        assert_eq!(basic_credentials("abc"), STANDARD.encode("abc:api_token"));
    }

    #[test]
    fn list_url_without_bounds_has_no_query() {
        let url = list_url("https://api.track.toggl.com/api/v8/", None, None).unwrap();
        assert_eq!(url.as_str(), "https://api.track.toggl.com/api/v8/time_entries");
    }

    #[test]
    fn list_url_encodes_given_bounds_only() {
        let url = list_url(
            "https://api.track.toggl.com/api/v8",
            Some("2015-08-21T09:21:02+02:00"),
            None,
        )
        .unwrap();
        assert_eq!(url.query(), Some("start_date=2015-08-21T09%3A21%3A02%2B02%3A00"));

        let url = list_url(
            "https://api.track.toggl.com/api/v8",
            Some("2015-08-21T00:00:00Z"),
            Some("2015-08-22T00:00:00Z"),
        )
        .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("start_date".to_string(), "2015-08-21T00:00:00Z".to_string()),
                ("end_date".to_string(), "2015-08-22T00:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(check_status(StatusCode::OK, ""), Ok(()));
        assert_eq!(
            check_status(StatusCode::FORBIDDEN, ""),
            Err(ServiceError::Unauthorized)
        );
        assert_eq!(
            check_status(StatusCode::PAYMENT_REQUIRED, ""),
            Err(ServiceError::PaymentRequired)
        );
        assert_eq!(check_status(StatusCode::NOT_FOUND, ""), Err(ServiceError::NotFound));
        assert_eq!(
            check_status(StatusCode::TOO_MANY_REQUESTS, ""),
            Err(ServiceError::RateLimited)
        );
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, ""),
            Err(ServiceError::ServerError(_))
        ));
        assert_eq!(
            check_status(StatusCode::BAD_REQUEST, " Start is required\n"),
            Err(ServiceError::Status {
                status: 400,
                message: "Start is required".to_string(),
            })
        );
    }

    #[test]
    fn empty_current_entry_is_absent() {
        assert_eq!(decode_optional_entry(r#"{"data":null}"#), Ok(None));
        assert_eq!(decode_optional_entry("null"), Ok(None));
        assert_eq!(decode_optional_entry(""), Ok(None));
    }

    #[test]
    fn current_entry_is_unwrapped() {
        let body = serde_json::json!({
            "data": {
                "id": 42,
                "wid": 777,
                "start": "2015-08-21T07:28:20+00:00",
                "duration": -1440141700,
            }
        });
        let entry = decode_optional_entry(&body.to_string()).unwrap().unwrap();
        assert_eq!(entry.id, 42);
        assert!(entry.is_running());
    }

    #[test]
    fn delete_confirmation_is_an_id_list() {
        let ids: Vec<u64> = decode("[436694100]").unwrap();
        assert_eq!(ids, vec![436694100]);
    }

    #[test]
    fn undecodable_body_is_reported() {
        assert!(matches!(
            decode::<Vec<u64>>("<html>"),
            Err(ServiceError::Decode(_))
        ));
    }

    #[test]
    fn request_body_is_wrapped() {
        let request = TimeEntryRequest {
            wid: Some(777),
            ..TimeEntryRequest::default()
        };
        let body = serde_json::to_string(&TimeEntryBody { time_entry: &request }).unwrap();
        assert_eq!(body, r#"{"time_entry":{"wid":777}}"#);
    }
}
