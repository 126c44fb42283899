use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::action::{ActionError, ActionKind, ActionResultExt};
use super::attachments::{AttachmentKind, PreviewRegistry, SelectedFile};
use super::busy::BusyFlag;
use super::domain::{
    ActivitySet, Application, ApplicationId, Gender, GradeLevel, InvalidApplicationId,
};
use super::status::Status;
use crate::api::{ApplicationPayload, ApplicationsApi};

/// Problems caught locally, before any request is made.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Applicant name is required.")]
    MissingApplicantName,
    #[error(
        "{kind} '{file_name}' is not supported (expected .{})",
        .kind.allowed_extensions().join(", .")
    )]
    UnsupportedAttachment {
        kind: AttachmentKind,
        file_name: String,
    },
    #[error("could not read attachment {}", .path.display())]
    UnreadableAttachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a create or save submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(err) => err.to_string(),
            SubmitError::Action(err) => err.user_message().to_string(),
        }
    }
}

/// Editable field state, kept apart from the last fetched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub grade_level: String,
    pub applicant_name: String,
    pub gender: Gender,
    pub status: Status,
    pub activities: ActivitySet,
}

impl Default for ApplicationDraft {
    fn default() -> Self {
        Self {
            grade_level: GradeLevel::default().label(),
            applicant_name: String::new(),
            gender: Gender::Male,
            status: Status::Processing,
            activities: ActivitySet::new(),
        }
    }
}

impl ApplicationDraft {
    pub fn from_application(application: &Application) -> Self {
        Self {
            grade_level: application.grade_level.clone(),
            applicant_name: application.applicant_name.clone(),
            gender: application.gender,
            status: application.status,
            activities: ActivitySet::from_selected(application.activities.iter().cloned()),
        }
    }

    pub fn set_grade_level(&mut self, grade: GradeLevel) {
        self.grade_level = grade.label();
    }

    pub fn toggle_activity(&mut self, activity: impl Into<String>) -> bool {
        self.activities.toggle(activity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.applicant_name.trim().is_empty() {
            return Err(ValidationError::MissingApplicantName);
        }
        Ok(())
    }

    /// Build the multipart field set. Attachments that were not selected are
    /// omitted, which leaves the stored ones untouched.
    pub fn to_payload(
        &self,
        image: Option<&SelectedFile>,
        document: Option<&SelectedFile>,
    ) -> Result<ApplicationPayload, ValidationError> {
        self.validate()?;
        Ok(ApplicationPayload {
            grade_level: self.grade_level.trim().to_string(),
            applicant_name: self.applicant_name.trim().to_string(),
            gender: self.gender,
            status: self.status,
            activities: self.activities.to_vec(),
            image: image.map(SelectedFile::to_upload),
            document: document.map(SelectedFile::to_upload),
        })
    }
}

/// Attachment slots shared by both forms.
#[derive(Debug, Default)]
struct AttachmentSlots {
    image: Option<SelectedFile>,
    document: Option<SelectedFile>,
}

impl AttachmentSlots {
    fn select(
        &mut self,
        kind: AttachmentKind,
        path: &Path,
        previews: &PreviewRegistry,
    ) -> Result<&SelectedFile, ValidationError> {
        let selected = SelectedFile::open(kind, path, previews)?;
        let slot = match kind {
            AttachmentKind::Image => &mut self.image,
            AttachmentKind::Document => &mut self.document,
        };
        // Replacing the slot drops the previous selection and its preview.
        Ok(slot.insert(selected))
    }

    fn clear(&mut self, kind: AttachmentKind) {
        match kind {
            AttachmentKind::Image => self.image = None,
            AttachmentKind::Document => self.document = None,
        }
    }

    fn get(&self, kind: AttachmentKind) -> Option<&SelectedFile> {
        match kind {
            AttachmentKind::Image => self.image.as_ref(),
            AttachmentKind::Document => self.document.as_ref(),
        }
    }
}

/// Form for submitting a new application.
pub struct ApplicationCreateForm<A> {
    api: Arc<A>,
    previews: PreviewRegistry,
    draft: ApplicationDraft,
    attachments: AttachmentSlots,
    busy: BusyFlag,
}

impl<A> ApplicationCreateForm<A>
where
    A: ApplicationsApi + 'static,
{
    pub fn new(api: Arc<A>, previews: PreviewRegistry) -> Self {
        Self {
            api,
            previews,
            draft: ApplicationDraft::default(),
            attachments: AttachmentSlots::default(),
            busy: BusyFlag::new(),
        }
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ApplicationDraft {
        &mut self.draft
    }

    pub fn select_attachment(
        &mut self,
        kind: AttachmentKind,
        path: impl AsRef<Path>,
    ) -> Result<&SelectedFile, ValidationError> {
        self.attachments.select(kind, path.as_ref(), &self.previews)
    }

    pub fn clear_attachment(&mut self, kind: AttachmentKind) {
        self.attachments.clear(kind);
    }

    pub fn attachment(&self, kind: AttachmentKind) -> Option<&SelectedFile> {
        self.attachments.get(kind)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Post the draft. Returns only the new id: callers re-fetch the record
    /// rather than trusting the response body.
    pub async fn submit(&mut self) -> Result<ApplicationId, SubmitError> {
        let payload = self.draft.to_payload(
            self.attachments.get(AttachmentKind::Image),
            self.attachments.get(AttachmentKind::Document),
        )?;

        let _busy = self.busy.enter();
        let created = self
            .api
            .create(payload)
            .await
            .during(ActionKind::Create)?;
        info!(id = %created.id, "application created");
        Ok(created.id)
    }
}

/// Detail view and edit form for one application.
pub struct ApplicationEditForm<A> {
    api: Arc<A>,
    id: ApplicationId,
    previews: PreviewRegistry,
    snapshot: Option<Application>,
    draft: ApplicationDraft,
    attachments: AttachmentSlots,
    busy: BusyFlag,
    error: Option<String>,
}

impl<A> ApplicationEditForm<A>
where
    A: ApplicationsApi + 'static,
{
    /// Validate the route identifier. No request is made here.
    pub fn open(
        api: Arc<A>,
        raw_id: &str,
        previews: PreviewRegistry,
    ) -> Result<Self, InvalidApplicationId> {
        let id = ApplicationId::parse(raw_id)?;
        Ok(Self::for_id(api, id, previews))
    }

    pub fn for_id(api: Arc<A>, id: ApplicationId, previews: PreviewRegistry) -> Self {
        Self {
            api,
            id,
            previews,
            snapshot: None,
            draft: ApplicationDraft::default(),
            attachments: AttachmentSlots::default(),
            busy: BusyFlag::new(),
            error: None,
        }
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    /// Last record fetched from the API, if the latest fetch succeeded.
    pub fn snapshot(&self) -> Option<&Application> {
        self.snapshot.as_ref()
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ApplicationDraft {
        &mut self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn select_attachment(
        &mut self,
        kind: AttachmentKind,
        path: impl AsRef<Path>,
    ) -> Result<&SelectedFile, ValidationError> {
        self.attachments.select(kind, path.as_ref(), &self.previews)
    }

    pub fn clear_attachment(&mut self, kind: AttachmentKind) {
        self.attachments.clear(kind);
    }

    pub fn attachment(&self, kind: AttachmentKind) -> Option<&SelectedFile> {
        self.attachments.get(kind)
    }

    /// Fetch the record and reseed the draft from it.
    pub async fn load(&mut self) -> Result<(), ActionError> {
        let _busy = self.busy.enter();
        self.reload().await
    }

    async fn reload(&mut self) -> Result<(), ActionError> {
        self.error = None;
        match self
            .api
            .fetch(self.id)
            .await
            .during(ActionKind::LoadApplication)
        {
            Ok(application) => {
                self.draft = ApplicationDraft::from_application(&application);
                self.snapshot = Some(application);
                Ok(())
            }
            Err(err) => {
                warn!(id = %self.id, error = %err.source, "failed to load application");
                self.snapshot = None;
                self.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    /// Full replacement of every editable field, followed by a re-fetch.
    ///
    /// On failure the draft and selected attachments stay as typed so the
    /// operator can retry.
    pub async fn save(&mut self) -> Result<(), SubmitError> {
        self.error = None;
        let payload = match self.draft.to_payload(
            self.attachments.get(AttachmentKind::Image),
            self.attachments.get(AttachmentKind::Document),
        ) {
            Ok(payload) => payload,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err.into());
            }
        };

        let _busy = self.busy.enter();
        if let Err(err) = self
            .api
            .replace(self.id, payload)
            .await
            .during(ActionKind::Save)
        {
            warn!(id = %self.id, error = %err.source, "save failed");
            self.error = Some(err.user_message().to_string());
            return Err(err.into());
        }
        info!(id = %self.id, "application saved");

        self.attachments = AttachmentSlots::default();
        self.reload().await?;
        Ok(())
    }

    /// Status-only transition; no other field is sent.
    pub async fn change_status(&mut self, status: Status) -> Result<(), ActionError> {
        self.error = None;
        let _busy = self.busy.enter();
        if let Err(err) = self
            .api
            .set_status(self.id, status)
            .await
            .during(ActionKind::ChangeStatus)
        {
            self.error = Some(err.user_message().to_string());
            return Err(err);
        }
        info!(id = %self.id, %status, "application status changed");
        self.reload().await
    }

    pub async fn delete(&mut self) -> Result<(), ActionError> {
        self.error = None;
        let _busy = self.busy.enter();
        if let Err(err) = self.api.delete(self.id).await.during(ActionKind::Delete) {
            self.error = Some(err.user_message().to_string());
            return Err(err);
        }
        info!(id = %self.id, "application deleted");
        self.snapshot = None;
        self.attachments = AttachmentSlots::default();
        Ok(())
    }
}
