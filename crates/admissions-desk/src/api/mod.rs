//! Contract consumed from the admissions REST API.
//!
//! [`ApplicationsApi`] is the seam between the client core and the transport so
//! the list store and forms can be exercised against an in-memory double.

pub mod http;

use std::future::Future;

use crate::admissions::domain::{Application, ApplicationId, Gender};
use crate::admissions::status::Status;
use crate::admissions::summary::StatusSummary;

pub use http::HttpApplicationsApi;

pub trait ApplicationsApi: Send + Sync {
    /// `GET /api/applications/`
    fn list(&self) -> impl Future<Output = Result<Vec<Application>, ApiError>> + Send;

    /// `GET /api/applications/summary/`
    fn summary(&self) -> impl Future<Output = Result<StatusSummary, ApiError>> + Send;

    /// `GET /api/applications/{id}/`
    fn fetch(
        &self,
        id: ApplicationId,
    ) -> impl Future<Output = Result<Application, ApiError>> + Send;

    /// `POST /api/applications/` as multipart.
    fn create(
        &self,
        payload: ApplicationPayload,
    ) -> impl Future<Output = Result<Application, ApiError>> + Send;

    /// `PUT /api/applications/{id}/` as multipart. Attachments left out of the
    /// payload stay as they are on the server. Any response body is ignored;
    /// callers re-fetch.
    fn replace(
        &self,
        id: ApplicationId,
        payload: ApplicationPayload,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `PATCH /api/applications/{id}/status/`. The response body is ignored.
    fn set_status(
        &self,
        id: ApplicationId,
        status: Status,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/applications/{id}/`
    fn delete(&self, id: ApplicationId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Full field set submitted on create and on full replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationPayload {
    pub grade_level: String,
    pub applicant_name: String,
    pub gender: Gender,
    pub status: Status,
    pub activities: Vec<String>,
    pub image: Option<AttachmentUpload>,
    pub document: Option<AttachmentUpload>,
}

impl ApplicationPayload {
    /// Activities travel as a JSON-encoded string inside the multipart body.
    pub fn activities_field(&self) -> String {
        serde_json::to_string(&self.activities).unwrap_or_else(|_| "[]".to_string())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for AttachmentUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Failures talking to the admissions API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("admin access required")]
    Forbidden,
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("api responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Forbidden)
    }
}
