use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::{ApiError, ApplicationPayload, ApplicationsApi, AttachmentUpload};
use crate::admissions::domain::{Application, ApplicationId};
use crate::admissions::status::Status;
use crate::admissions::summary::{StatusSummary, SummaryResponse};
use crate::config::{as_base, ApiConfig};

const ADMIN_KEY_HEADER: &str = "X-ADMIN-KEY";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// reqwest-backed client for the admissions API.
///
/// Every request carries the admin key when one is configured, and cookies set
/// by the API are replayed on later calls.
#[derive(Debug, Clone)]
pub struct HttpApplicationsApi {
    client: Client,
    base_url: Url,
    admin_key: Option<String>,
}

impl HttpApplicationsApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("admissions-desk/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: as_base(config.base_url.clone()),
            admin_key: config.admin_key.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        // Relative join so a path prefix on the base survives.
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        Ok(match &self.admin_key {
            Some(key) => builder.header(ADMIN_KEY_HEADER, key),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::FORBIDDEN => {
                warn!(path, "api rejected request without admin access");
                Err(ApiError::Forbidden)
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound {
                path: path.to_string(),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(path, status = status.as_u16(), "api request failed");
                Err(ApiError::Status {
                    status: status.as_u16(),
                    body: truncate_body(&body),
                })
            }
        }
    }
}

fn collection_path() -> &'static str {
    "/api/applications/"
}

fn record_path(id: ApplicationId) -> String {
    format!("/api/applications/{id}/")
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

fn upload_part(upload: AttachmentUpload) -> Result<Part, ApiError> {
    let AttachmentUpload {
        file_name,
        content_type,
        bytes,
    } = upload;
    Ok(Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(&content_type)?)
}

fn multipart_form(payload: ApplicationPayload) -> Result<Form, ApiError> {
    let activities = payload.activities_field();
    let ApplicationPayload {
        grade_level,
        applicant_name,
        gender,
        status,
        image,
        document,
        ..
    } = payload;

    let mut form = Form::new()
        .text("grade_level", grade_level)
        .text("applicant_name", applicant_name)
        .text("gender", gender.token())
        .text("status", status.token())
        .text("activities", activities);

    if let Some(image) = image {
        form = form.part("image", upload_part(image)?);
    }
    if let Some(document) = document {
        form = form.part("document", upload_part(document)?);
    }
    Ok(form)
}

impl ApplicationsApi for HttpApplicationsApi {
    async fn list(&self) -> Result<Vec<Application>, ApiError> {
        let path = collection_path();
        let response = self.send(self.request(Method::GET, path)?, path).await?;
        match response.json::<Value>().await? {
            Value::Array(items) => Ok(serde_json::from_value(Value::Array(items))?),
            other => {
                warn!(kind = value_kind(&other), "list endpoint did not return an array");
                Ok(Vec::new())
            }
        }
    }

    async fn summary(&self) -> Result<StatusSummary, ApiError> {
        let path = "/api/applications/summary/";
        let response = self.send(self.request(Method::GET, path)?, path).await?;
        let body: SummaryResponse = response.json().await?;
        Ok(body.into())
    }

    async fn fetch(&self, id: ApplicationId) -> Result<Application, ApiError> {
        let path = record_path(id);
        let response = self.send(self.request(Method::GET, &path)?, &path).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, payload: ApplicationPayload) -> Result<Application, ApiError> {
        let path = collection_path();
        let form = multipart_form(payload)?;
        let builder = self.request(Method::POST, path)?.multipart(form);
        Ok(self.send(builder, path).await?.json().await?)
    }

    async fn replace(&self, id: ApplicationId, payload: ApplicationPayload) -> Result<(), ApiError> {
        let path = record_path(id);
        let form = multipart_form(payload)?;
        let builder = self.request(Method::PUT, &path)?.multipart(form);
        self.send(builder, &path).await?;
        Ok(())
    }

    async fn set_status(&self, id: ApplicationId, status: Status) -> Result<(), ApiError> {
        let path = format!("/api/applications/{id}/status/");
        let builder = self
            .request(Method::PATCH, &path)?
            .json(&json!({ "status": status.token() }));
        self.send(builder, &path).await?;
        Ok(())
    }

    async fn delete(&self, id: ApplicationId) -> Result<(), ApiError> {
        let path = record_path(id);
        self.send(self.request(Method::DELETE, &path)?, &path)
            .await?;
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 50);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate_body("  short  "), "short");
    }

    #[test]
    fn record_paths_keep_trailing_slash() {
        assert_eq!(record_path(ApplicationId(12)), "/api/applications/12/");
    }

    #[test]
    fn client_joins_paths_onto_origin() {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:8002").expect("valid url"));
        let api = HttpApplicationsApi::new(&config).expect("client builds");
        let request = api
            .request(Method::GET, &record_path(ApplicationId(3)))
            .and_then(|builder| Ok(builder.build()?))
            .expect("request builds");
        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:8002/api/applications/3/"
        );
    }

    #[test]
    fn client_keeps_base_path_prefix() {
        let mut config = ApiConfig::new(Url::parse("http://127.0.0.1:8002").expect("valid url"));
        config.base_url = Url::parse("http://127.0.0.1:8002/backend").expect("valid url");
        let api = HttpApplicationsApi::new(&config).expect("client builds");
        let request = api
            .request(Method::GET, collection_path())
            .and_then(|builder| Ok(builder.build()?))
            .expect("request builds");
        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:8002/backend/api/applications/"
        );
    }
}
