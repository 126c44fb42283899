use std::sync::Arc;

use tracing::{debug, info, warn};

use super::action::{ActionError, ActionKind, ActionResultExt};
use super::busy::BusyFlag;
use super::domain::{Application, ApplicationId};
use super::status::Status;
use super::summary::{Reconciled, StatusSummary, SummarySource};
use crate::api::ApplicationsApi;

/// Client-side list criteria. Both predicates must hold for a record to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    query: String,
    status: Option<Status>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.set_query(query);
        self
    }

    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_status(&mut self, status: Option<Status>) {
        self.status = status;
    }

    /// Picking the active status again clears it; picking another replaces it.
    pub fn toggle_status(&mut self, status: Status) {
        self.status = if self.status == Some(status) {
            None
        } else {
            Some(status)
        };
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.status.is_some()
    }

    pub fn matches(&self, application: &Application) -> bool {
        let needle = self.query.trim().to_lowercase();
        let matches_query =
            needle.is_empty() || application.applicant_name.to_lowercase().contains(&needle);
        let matches_status = self
            .status
            .map_or(true, |status| application.status == status);
        matches_query && matches_status
    }
}

/// Holds the last fetched collection and answers filter and summary queries
/// without another round trip. Mutations always re-fetch afterwards.
pub struct ApplicationListStore<A> {
    api: Arc<A>,
    items: Vec<Application>,
    summary: Reconciled,
    last_error: Option<String>,
    busy: BusyFlag,
}

impl<A> ApplicationListStore<A>
where
    A: ApplicationsApi + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            items: Vec::new(),
            summary: Reconciled {
                summary: StatusSummary::default(),
                source: SummarySource::Endpoint,
            },
            last_error: None,
            busy: BusyFlag::new(),
        }
    }

    /// Fetch the list, then the best-effort summary.
    pub async fn refresh(&mut self) -> Result<(), ActionError> {
        let _busy = self.busy.enter();
        self.reload().await
    }

    async fn reload(&mut self) -> Result<(), ActionError> {
        self.last_error = None;

        let items = match self.api.list().await.during(ActionKind::LoadList) {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err.source, "failed to load applications");
                self.items.clear();
                self.summary = Reconciled {
                    summary: StatusSummary::default(),
                    source: SummarySource::Endpoint,
                };
                self.last_error = Some(err.user_message().to_string());
                return Err(err);
            }
        };
        self.items = items;

        let endpoint = self.api.summary().await;
        if let Err(err) = &endpoint {
            warn!(error = %err, "summary endpoint unavailable, tallying list");
        }
        self.summary = StatusSummary::reconcile(endpoint, &self.items);
        debug!(
            count = self.items.len(),
            source = ?self.summary.source,
            "application list refreshed"
        );
        Ok(())
    }

    /// Quick transition from the list: only the status is sent.
    pub async fn change_status(
        &mut self,
        id: ApplicationId,
        status: Status,
    ) -> Result<(), ActionError> {
        let _busy = self.busy.enter();
        self.api
            .set_status(id, status)
            .await
            .during(ActionKind::ChangeStatus)?;
        info!(%id, %status, "application status changed");
        self.reload().await
    }

    pub async fn delete(&mut self, id: ApplicationId) -> Result<(), ActionError> {
        let _busy = self.busy.enter();
        self.api.delete(id).await.during(ActionKind::Delete)?;
        info!(%id, "application deleted");
        self.reload().await
    }

    /// Records in list-endpoint order.
    pub fn items(&self) -> &[Application] {
        &self.items
    }

    pub fn get(&self, id: ApplicationId) -> Option<&Application> {
        self.items.iter().find(|application| application.id == id)
    }

    /// Subset matching the filter, in list-endpoint order.
    pub fn filtered(&self, filter: &ListFilter) -> Vec<&Application> {
        self.items
            .iter()
            .filter(|application| filter.matches(application))
            .collect()
    }

    pub fn summary(&self) -> StatusSummary {
        self.summary.summary
    }

    pub fn summary_source(&self) -> SummarySource {
        self.summary.source
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admissions::domain::Gender;

    fn named(id: u64, name: &str, status: Status) -> Application {
        Application {
            id: ApplicationId(id),
            grade_level: "Grade 9".to_string(),
            applicant_name: name.to_string(),
            gender: Gender::Female,
            activities: Vec::new(),
            status,
            image: None,
            document: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn query_is_trimmed_and_case_insensitive() {
        let filter = ListFilter::new().with_query("  ANA ");
        assert!(filter.matches(&named(1, "Juan Ana", Status::Rejected)));
        assert!(!filter.matches(&named(2, "Bob", Status::Rejected)));
        assert!(ListFilter::new().matches(&named(3, "", Status::Processing)));
    }

    #[test]
    fn toggling_the_active_status_clears_it() {
        let mut filter = ListFilter::new();
        filter.toggle_status(Status::Accepted);
        assert_eq!(filter.status(), Some(Status::Accepted));
        filter.toggle_status(Status::Rejected);
        assert_eq!(filter.status(), Some(Status::Rejected));
        filter.toggle_status(Status::Rejected);
        assert_eq!(filter.status(), None);
        assert!(!filter.is_active());

        filter.set_query("x");
        assert!(filter.is_active());
        filter.clear_query();
        assert!(!filter.is_active());
    }
}
