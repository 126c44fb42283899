use serde::{Deserialize, Serialize};

use super::domain::Application;
use super::status::Status;

/// Per-status counts over the full, unfiltered collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub processing: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusSummary {
    pub fn new(processing: usize, accepted: usize, rejected: usize) -> Self {
        Self {
            processing,
            accepted,
            rejected,
        }
    }

    /// Derive counts by tallying the normalized status of every record.
    pub fn tally<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a Application>,
    {
        items
            .into_iter()
            .fold(Self::default(), |mut summary, application| {
                *summary.count_mut(application.status) += 1;
                summary
            })
    }

    /// Choose between the dedicated summary endpoint and a tally of the list.
    ///
    /// The list wins when the endpoint failed, or when it reports all zeroes while
    /// the collection is non-empty.
    pub fn reconcile<E>(endpoint: Result<StatusSummary, E>, items: &[Application]) -> Reconciled {
        match endpoint {
            Ok(summary) if summary.is_zero() && !items.is_empty() => Reconciled {
                summary: Self::tally(items),
                source: SummarySource::DerivedFromList,
            },
            Ok(summary) => Reconciled {
                summary,
                source: SummarySource::Endpoint,
            },
            Err(_) => Reconciled {
                summary: Self::tally(items),
                source: SummarySource::DerivedFromList,
            },
        }
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Processing => self.processing,
            Status::Accepted => self.accepted,
            Status::Rejected => self.rejected,
        }
    }

    fn count_mut(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Processing => &mut self.processing,
            Status::Accepted => &mut self.accepted,
            Status::Rejected => &mut self.rejected,
        }
    }

    /// Saturates: endpoint counts are not trusted to be sane.
    pub fn total(&self) -> usize {
        self.processing
            .saturating_add(self.accepted)
            .saturating_add(self.rejected)
    }

    pub fn is_zero(&self) -> bool {
        self.processing == 0 && self.accepted == 0 && self.rejected == 0
    }
}

/// Where the summary shown to the operator came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Endpoint,
    DerivedFromList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub summary: StatusSummary,
    pub source: SummarySource,
}

/// Share of `count` in `total`, rounded to the nearest whole percent.
pub fn percent(count: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (count as f64 * 100.0 / total as f64).round();
    rounded.clamp(0.0, 100.0) as u8
}

/// Body of `GET /api/applications/summary/`. Missing or null keys read as zero.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SummaryResponse {
    #[serde(rename = "PROCESSING", default)]
    processing: Option<u64>,
    #[serde(rename = "ACCEPTED", default)]
    accepted: Option<u64>,
    #[serde(rename = "REJECTED", default)]
    rejected: Option<u64>,
}

impl From<SummaryResponse> for StatusSummary {
    fn from(value: SummaryResponse) -> Self {
        let count = |raw: Option<u64>| usize::try_from(raw.unwrap_or(0)).unwrap_or(usize::MAX);
        StatusSummary::new(
            count(value.processing),
            count(value.accepted),
            count(value.rejected),
        )
    }
}
