use std::sync::Mutex;

use chrono::Utc;

use crate::admissions::domain::{Application, ApplicationId, Gender};
use crate::admissions::status::Status;
use crate::admissions::summary::StatusSummary;
use crate::api::{ApiError, ApplicationPayload, ApplicationsApi};

/// Every request the double has seen, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    List,
    Summary,
    Fetch(ApplicationId),
    Create(ApplicationPayload),
    Replace(ApplicationId, ApplicationPayload),
    SetStatus(ApplicationId, Status),
    Delete(ApplicationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SummaryMode {
    Live,
    Fail,
    Zero,
    Fixed(StatusSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Forbidden,
    Server,
}

impl Failure {
    fn error(self) -> ApiError {
        match self {
            Failure::Forbidden => ApiError::Forbidden,
            Failure::Server => ApiError::Status {
                status: 500,
                body: "internal error".to_string(),
            },
        }
    }
}

/// In-memory stand-in for the admissions API with the same replace semantics:
/// attachments missing from a payload keep their stored value.
pub(crate) struct MemoryApi {
    records: Mutex<Vec<Application>>,
    calls: Mutex<Vec<Call>>,
    summary: Mutex<SummaryMode>,
    read_failure: Mutex<Option<Failure>>,
    write_failure: Mutex<Option<Failure>>,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl MemoryApi {
    pub(crate) fn with_records(records: Vec<Application>) -> Self {
        Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            summary: Mutex::new(SummaryMode::Live),
            read_failure: Mutex::new(None),
            write_failure: Mutex::new(None),
        }
    }

    pub(crate) fn set_summary(&self, mode: SummaryMode) {
        *self.summary.lock().expect("summary mutex poisoned") = mode;
    }

    pub(crate) fn fail_reads(&self, failure: Option<Failure>) {
        *self.read_failure.lock().expect("failure mutex poisoned") = failure;
    }

    pub(crate) fn fail_writes(&self, failure: Option<Failure>) {
        *self.write_failure.lock().expect("failure mutex poisoned") = failure;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().expect("calls mutex poisoned").clear();
    }

    pub(crate) fn stored(&self, id: ApplicationId) -> Option<Application> {
        self.records
            .lock()
            .expect("records mutex poisoned")
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Change a stored record behind the client's back.
    pub(crate) fn tamper(&self, id: ApplicationId, update: impl FnOnce(&mut Application)) {
        let mut records = self.records.lock().expect("records mutex poisoned");
        if let Some(record) = records.iter_mut().find(|record| record.id == id) {
            update(record);
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }

    fn check_read(&self) -> Result<(), ApiError> {
        match *self.read_failure.lock().expect("failure mutex poisoned") {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> Result<(), ApiError> {
        match *self.write_failure.lock().expect("failure mutex poisoned") {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }

    fn not_found(id: ApplicationId) -> ApiError {
        ApiError::NotFound {
            path: format!("/api/applications/{id}/"),
        }
    }
}

fn media_path(folder: &str, payload_file: Option<&crate::api::AttachmentUpload>) -> Option<String> {
    payload_file.map(|upload| format!("/media/{folder}/{}", upload.file_name))
}

impl ApplicationsApi for MemoryApi {
    async fn list(&self) -> Result<Vec<Application>, ApiError> {
        self.record(Call::List);
        self.check_read()?;
        Ok(self.records.lock().expect("records mutex poisoned").clone())
    }

    async fn summary(&self) -> Result<StatusSummary, ApiError> {
        self.record(Call::Summary);
        let mode = *self.summary.lock().expect("summary mutex poisoned");
        match mode {
            SummaryMode::Live => {
                let records = self.records.lock().expect("records mutex poisoned");
                Ok(StatusSummary::tally(records.iter()))
            }
            SummaryMode::Fail => Err(ApiError::Forbidden),
            SummaryMode::Zero => Ok(StatusSummary::default()),
            SummaryMode::Fixed(summary) => Ok(summary),
        }
    }

    async fn fetch(&self, id: ApplicationId) -> Result<Application, ApiError> {
        self.record(Call::Fetch(id));
        self.check_read()?;
        self.stored(id).ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, payload: ApplicationPayload) -> Result<Application, ApiError> {
        self.record(Call::Create(payload.clone()));
        self.check_write()?;
        let mut records = self.records.lock().expect("records mutex poisoned");
        let next = records.iter().map(|record| record.id.0).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let created = Application {
            id: ApplicationId(next),
            grade_level: payload.grade_level.clone(),
            applicant_name: payload.applicant_name.clone(),
            gender: payload.gender,
            activities: payload.activities.clone(),
            status: payload.status,
            image: media_path("images", payload.image.as_ref()),
            document: media_path("docs", payload.document.as_ref()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        records.push(created.clone());
        Ok(created)
    }

    async fn replace(&self, id: ApplicationId, payload: ApplicationPayload) -> Result<(), ApiError> {
        self.record(Call::Replace(id, payload.clone()));
        self.check_write()?;
        let mut records = self.records.lock().expect("records mutex poisoned");
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.grade_level = payload.grade_level.clone();
        record.applicant_name = payload.applicant_name.clone();
        record.gender = payload.gender;
        record.status = payload.status;
        record.activities = payload.activities.clone();
        if let Some(image) = media_path("images", payload.image.as_ref()) {
            record.image = Some(image);
        }
        if let Some(document) = media_path("docs", payload.document.as_ref()) {
            record.document = Some(document);
        }
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn set_status(&self, id: ApplicationId, status: Status) -> Result<(), ApiError> {
        self.record(Call::SetStatus(id, status));
        self.check_write()?;
        let mut records = self.records.lock().expect("records mutex poisoned");
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.status = status;
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete(&self, id: ApplicationId) -> Result<(), ApiError> {
        self.record(Call::Delete(id));
        self.check_write()?;
        let mut records = self.records.lock().expect("records mutex poisoned");
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

pub(crate) fn application(id: u64, name: &str, status: Status) -> Application {
    Application {
        id: ApplicationId(id),
        grade_level: "Grade 10".to_string(),
        applicant_name: name.to_string(),
        gender: Gender::Female,
        activities: vec!["Music".to_string()],
        status,
        image: None,
        document: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn with_attachments(mut application: Application) -> Application {
    application.image = Some("/media/images/portrait.png".to_string());
    application.document = Some("/media/docs/transcript.pdf".to_string());
    application
}
