use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::{Labelled, Lead, LeadId, LeadStatus};
use super::repository::{LeadQuery, LeadRepository, RepositoryError};

/// Pipeline moves forward only; `Archived` is terminal and nothing returns to `New`.
pub fn can_transition(from: LeadStatus, to: LeadStatus) -> bool {
    use LeadStatus::*;
    matches!(
        (from, to),
        (New, Contacted | Converted | Archived) | (Contacted, Converted | Archived) | (Converted, Archived)
    )
}

/// Lead counts per status for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub out_of_area: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_lead_type: BTreeMap<&'static str, usize>,
}

impl PipelineSummary {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut summary = Self::empty();
        summary.tally(leads);
        summary
    }

    fn empty() -> Self {
        let mut summary = Self::default();
        for status in LeadStatus::VARIANTS {
            summary.by_status.insert(status.label(), 0);
        }
        summary
    }

    fn tally(&mut self, leads: &[Lead]) {
        self.total += leads.len();
        for lead in leads {
            *self.by_status.entry(lead.fields.status.label()).or_default() += 1;
            *self
                .by_lead_type
                .entry(lead.fields.lead_type.label())
                .or_default() += 1;
            if lead.fields.is_out_of_area {
                self.out_of_area += 1;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("cannot move lead from {from} to {to}")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read and status-management surface for the internal dashboard.
pub struct LeadAdminService<R> {
    repository: Arc<R>,
}

impl<R> LeadAdminService<R>
where
    R: LeadRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, AdminError> {
        Ok(self.repository.list(query).await?)
    }

    /// Tallies every matching lead, reading the store one page at a time.
    pub async fn summary(&self, query: &LeadQuery) -> Result<PipelineSummary, AdminError> {
        let mut page = LeadQuery {
            status: None,
            limit: Some(LeadQuery::MAX_LIMIT),
            offset: Some(0),
            ..query.clone()
        };
        let mut summary = PipelineSummary::empty();
        loop {
            let leads = self.repository.list(&page).await?;
            summary.tally(&leads);
            if leads.len() < LeadQuery::MAX_LIMIT {
                return Ok(summary);
            }
            page.offset = Some(page.effective_offset() + leads.len());
        }
    }

    pub async fn update_status(&self, id: &LeadId, status: LeadStatus) -> Result<Lead, AdminError> {
        let lead = self
            .repository
            .fetch(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let from = lead.fields.status;
        if !can_transition(from, status) {
            return Err(AdminError::InvalidTransition { from, to: status });
        }

        let updated = self.repository.update_status(id, status).await?;
        info!(lead_id = %id.0, from = from.label(), to = status.label(), "lead status updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        assert!(can_transition(LeadStatus::New, LeadStatus::Contacted));
        assert!(can_transition(LeadStatus::New, LeadStatus::Archived));
        assert!(can_transition(LeadStatus::Contacted, LeadStatus::Converted));
        assert!(can_transition(LeadStatus::Converted, LeadStatus::Archived));

        assert!(!can_transition(LeadStatus::Contacted, LeadStatus::New));
        assert!(!can_transition(LeadStatus::Archived, LeadStatus::Contacted));
        assert!(!can_transition(LeadStatus::Converted, LeadStatus::Contacted));
        assert!(!can_transition(LeadStatus::New, LeadStatus::New));
    }
}
