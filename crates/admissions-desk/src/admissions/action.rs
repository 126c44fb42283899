use std::fmt;

use crate::api::ApiError;

/// Operator actions that reach the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    LoadList,
    LoadApplication,
    Create,
    Save,
    ChangeStatus,
    Delete,
}

impl ActionKind {
    pub const fn failure_message(self) -> &'static str {
        match self {
            ActionKind::LoadList => "Failed to load applications.",
            ActionKind::LoadApplication => "Failed to load application. Please try again.",
            ActionKind::Create => "Submit failed.",
            ActionKind::Save => "Save failed. Please check inputs and try again.",
            ActionKind::ChangeStatus => "Status update failed.",
            ActionKind::Delete => "Delete failed.",
        }
    }
}

/// A failed action. Terminal: nothing is retried and no local state is applied.
#[derive(Debug)]
pub struct ActionError {
    pub action: ActionKind,
    pub source: ApiError,
}

impl ActionError {
    pub fn new(action: ActionKind, source: ApiError) -> Self {
        Self { action, source }
    }

    /// Message suitable for an alert or inline banner. A 403 always reads as a
    /// missing admin credential, whatever the action.
    pub fn user_message(&self) -> &'static str {
        if self.source.is_forbidden() {
            "Admin access required."
        } else {
            self.action.failure_message()
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user_message(), self.source)
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub(crate) trait ActionResultExt<T> {
    fn during(self, action: ActionKind) -> Result<T, ActionError>;
}

impl<T> ActionResultExt<T> for Result<T, ApiError> {
    fn during(self, action: ActionKind) -> Result<T, ActionError> {
        self.map_err(|source| ActionError::new(action, source))
    }
}
