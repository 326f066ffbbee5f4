//! Hide pipeline - list, normalize, filter, hide, summarize
//!
//! Orchestrates one sequential sweep against the vendor: fetch every
//! page of the listing, normalize rates, apply the hide criteria, then
//! issue one hide call per selected project. Hides are processed
//! independently; one failure never aborts the rest (the vendor
//! operation is not transactional across projects). Authentication and
//! list-fetch failures abort the whole run since there is nothing left
//! to filter.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::filter::{self, HideCriteria};
use crate::rate::{NormalizedProject, Rate, RangePolicy};
use crate::vendor::VendorApi;

/// Upper bound on the page sweep, in case the vendor keeps reporting
/// full pages
const MAX_PAGES: u32 = 100;

/// What happened to one selected project
#[derive(Debug)]
pub enum HideOutcome {
    Hidden,
    /// The vendor already had it hidden; no call was made
    AlreadyHidden,
    Failed(Error),
}

/// Per-project result line in the aggregate report
#[derive(Debug)]
pub struct ProjectOutcome {
    pub project_id: String,
    pub name: String,
    pub rate: Rate,
    pub incentive: f64,
    pub outcome: HideOutcome,
}

/// A project excluded from automatic filtering because its data could
/// not be parsed
#[derive(Debug)]
pub struct MalformedEntry {
    pub project_id: String,
    pub name: String,
    pub reason: String,
}

/// Aggregate result of one pipeline run
#[derive(Debug, Default)]
pub struct HideReport {
    /// One entry per selected project, in listing order
    pub outcomes: Vec<ProjectOutcome>,
    /// Projects surfaced for manual review
    pub malformed: Vec<MalformedEntry>,
    /// How many projects were fetched and examined
    pub scanned: usize,
    /// Vendor-reported total match count, when available
    pub total_available: Option<u64>,
}

impl HideReport {
    pub fn hidden_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, HideOutcome::Hidden))
            .count()
    }

    pub fn already_hidden_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, HideOutcome::AlreadyHidden))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, HideOutcome::Failed(_)))
            .count()
    }

    /// Drives the process exit code: partial failure is still failure
    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

/// The list -> normalize -> filter -> hide -> summarize pipeline,
/// generic over the vendor capability so tests can substitute a double
pub struct HidePipeline<A: VendorApi> {
    api: A,
    range_policy: RangePolicy,
}

impl<A: VendorApi> HidePipeline<A> {
    pub fn new(api: A, range_policy: RangePolicy) -> Self {
        Self { api, range_policy }
    }

    /// Fetch and normalize the complete listing.
    ///
    /// Any failure here is fatal: with no listing there is nothing to
    /// filter. Normalization failures do not abort; they ride along as
    /// `Rate::Malformed` on the affected project.
    pub async fn fetch_all(&self) -> Result<(Vec<NormalizedProject>, Option<u64>)> {
        let mut projects = Vec::new();
        let mut total_available = None;
        let mut page = 1;

        loop {
            let fetched = self.api.list_projects(page).await?;
            if total_available.is_none() {
                total_available = fetched.count;
            }

            let has_more = fetched.has_more();
            debug!(page = page, results = fetched.results.len(), "Normalizing page");

            projects.extend(
                fetched
                    .results
                    .into_iter()
                    .map(|p| NormalizedProject::from_project(p, self.range_policy)),
            );

            if !has_more || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok((projects, total_available))
    }

    /// Run the full pipeline for the given criteria
    pub async fn run(&self, criteria: &HideCriteria) -> Result<HideReport> {
        criteria.validate()?;

        info!(criteria = %criteria.describe(), "Starting hide sweep");

        let (projects, total_available) = self.fetch_all().await?;
        let scanned = projects.len();

        let selection = filter::select(&projects, criteria)?;
        info!(
            scanned = scanned,
            selected = selection.selected.len(),
            malformed = selection.malformed.len(),
            "Listing filtered"
        );

        let mut report = HideReport {
            scanned,
            total_available,
            ..HideReport::default()
        };

        for np in &selection.malformed {
            let reason = match &np.rate {
                Rate::Malformed(reason) => reason.clone(),
                _ => "unparseable".to_string(),
            };
            report.malformed.push(MalformedEntry {
                project_id: np.project.id.clone(),
                name: np.project.name.clone(),
                reason,
            });
        }

        for np in &selection.selected {
            let outcome = if np.project.hidden {
                debug!(project_id = %np.project.id, "Already hidden, skipping");
                HideOutcome::AlreadyHidden
            } else {
                match self.api.hide_project(&np.project.id).await {
                    Ok(()) => HideOutcome::Hidden,
                    // A rejected credential dooms every remaining call
                    Err(e @ Error::Auth(_)) => return Err(e),
                    Err(e) => {
                        warn!(project_id = %np.project.id, error = %e, "Hide failed");
                        HideOutcome::Failed(e)
                    }
                }
            };

            report.outcomes.push(ProjectOutcome {
                project_id: np.project.id.clone(),
                name: np.project.name.clone(),
                rate: np.rate.clone(),
                incentive: np.project.incentive,
                outcome,
            });
        }

        info!(
            hidden = report.hidden_count(),
            already_hidden = report.already_hidden_count(),
            failed = report.failed_count(),
            "Hide sweep finished"
        );

        Ok(report)
    }
}
