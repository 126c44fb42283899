//! Client core for the admissions desk.
//!
//! Records are normalized when read and never merged locally after a write:
//! every successful mutation is followed by a fresh fetch from the API.

pub mod action;
pub mod attachments;
pub mod busy;
pub mod domain;
pub mod export;
pub mod form;
pub mod status;
pub mod store;
pub mod summary;

#[cfg(test)]
mod tests;

pub use action::{ActionError, ActionKind};
pub use attachments::{
    resolve_attachment_url, AttachmentKind, PreviewHandle, PreviewRegistry, SelectedFile,
};
pub use busy::{BusyFlag, BusyGuard};
pub use domain::{
    Activity, ActivitySet, Application, ApplicationId, Gender, GradeLevel, InvalidApplicationId,
    UnknownOption,
};
pub use form::{
    ApplicationCreateForm, ApplicationDraft, ApplicationEditForm, SubmitError, ValidationError,
};
pub use status::{Status, UnknownStatus};
pub use store::{ApplicationListStore, ListFilter};
pub use summary::{percent, StatusSummary, SummarySource};
