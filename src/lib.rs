//! Blocking client for Toggl Track time entries.
//!
//! [`TimeEntryClient`] validates and encodes requests, then hands them to a
//! [`TimeEntryService`]: [`TogglApi`] over HTTP, or [`InMemoryService`] in
//! process.

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod service;
pub mod timestamp;
pub mod toggl;

pub use client::TimeEntryClient;
pub use config::ClientConfig;
pub use error::{Result, ServiceError, TogglError};
pub use memory::InMemoryService;
pub use models::{EntryState, Project, TimeEntry, TimeEntryFields, Workspace};
pub use service::{TimeEntryRequest, TimeEntryService};
pub use timestamp::TimestampInput;
pub use toggl::TogglApi;
