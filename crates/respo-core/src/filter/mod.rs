//! Hide criteria and project selection
//!
//! Decides which projects from a normalized listing should be hidden.
//! Thresholds are independent signals combined with logical OR: a
//! project falling below any supplied threshold is junk by that signal
//! and gets selected. Hide-by-ID targets exactly one project and never
//! falls back to threshold matching.

use crate::error::{Error, Result};
use crate::rate::{NormalizedProject, Rate};
use crate::vendor::ResearchKind;

/// What to hide. At least one criterion must be supplied; the ID form
/// is mutually exclusive with the threshold forms.
#[derive(Debug, Clone, Default)]
pub struct HideCriteria {
    /// Hide exactly this project, regardless of its rate
    pub project_id: Option<String>,
    /// Hide projects whose hourly rate is strictly below this
    pub min_hourly_rate: Option<f64>,
    /// Hide projects whose total incentive is strictly below this
    pub min_incentive: Option<f64>,
    /// Hide projects that are not of this research kind
    pub not_kind: Option<ResearchKind>,
}

impl HideCriteria {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            project_id: Some(id.into()),
            ..Self::default()
        }
    }

    fn has_thresholds(&self) -> bool {
        self.min_hourly_rate.is_some() || self.min_incentive.is_some() || self.not_kind.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_none() && !self.has_thresholds() {
            return Err(Error::InvalidInput(
                "supply --id, --hourly-rate, --incentive or --not-kind".to_string(),
            ));
        }
        if self.project_id.is_some() && self.has_thresholds() {
            return Err(Error::InvalidInput(
                "--id cannot be combined with threshold filters".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable description of the active criteria
    pub fn describe(&self) -> String {
        if let Some(id) = &self.project_id {
            return format!("project ID {}", id);
        }
        let mut parts = Vec::new();
        if let Some(rate) = self.min_hourly_rate {
            parts.push(format!("hourly rate < ${}/hr", rate));
        }
        if let Some(incentive) = self.min_incentive {
            parts.push(format!("incentive < ${}", incentive));
        }
        if let Some(kind) = self.not_kind {
            parts.push(format!("not {}", kind));
        }
        parts.join(" or ")
    }
}

/// Result of applying criteria to a listing
#[derive(Debug, Default)]
pub struct Selection<'a> {
    /// Projects to hide, in input order
    pub selected: Vec<&'a NormalizedProject>,
    /// Projects with unparseable data, excluded from automatic
    /// selection and surfaced for manual review
    pub malformed: Vec<&'a NormalizedProject>,
}

/// Apply hide criteria to a normalized listing.
///
/// Input order is preserved. Projects with a malformed duration are
/// never auto-selected by thresholds; an undefined (zero/missing)
/// duration only exempts a project from the rate threshold.
pub fn select<'a>(
    projects: &'a [NormalizedProject],
    criteria: &HideCriteria,
) -> Result<Selection<'a>> {
    criteria.validate()?;

    if let Some(id) = &criteria.project_id {
        let found = projects
            .iter()
            .find(|np| np.project.id == *id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        return Ok(Selection {
            selected: vec![found],
            malformed: Vec::new(),
        });
    }

    let mut selection = Selection::default();

    for np in projects {
        if np.rate.is_malformed() {
            selection.malformed.push(np);
            continue;
        }
        if matches_thresholds(np, criteria) {
            selection.selected.push(np);
        }
    }

    Ok(selection)
}

fn matches_thresholds(np: &NormalizedProject, criteria: &HideCriteria) -> bool {
    if let Some(threshold) = criteria.min_hourly_rate {
        // Undefined rates are never auto-hidden by a rate threshold
        if let Rate::PerHour { hourly, .. } = np.rate {
            if hourly < threshold {
                return true;
            }
        }
    }

    if let Some(threshold) = criteria.min_incentive {
        if np.project.incentive < threshold {
            return true;
        }
    }

    if let Some(kind) = criteria.not_kind {
        // A missing kind is treated as "not the requested kind", same
        // as the vendor web app
        if np.project.kind_of_research != Some(kind.code()) {
            return true;
        }
    }

    false
}
