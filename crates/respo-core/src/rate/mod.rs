//! Hourly rate normalization
//!
//! Converts a project's stated incentive and time commitment into an
//! effective hourly rate. The vendor usually reports time as a plain
//! minute count, but older listings carry free-text commitments like
//! "2 hours", "5 days" or "1-2 weeks", so both forms are handled here.

use serde::{Deserialize, Serialize};

use crate::vendor::Project;

/// Minutes in an hour
const MINUTES_PER_HOUR: f64 = 60.0;

/// Hours in a day
const HOURS_PER_DAY: f64 = 24.0;

/// Hours in a week
const HOURS_PER_WEEK: f64 = 168.0;

/// A time commitment as reported by the vendor.
///
/// Numeric values are minute counts (the vendor's
/// `timeMinutesRequired` convention); strings are free-text
/// specifications that need parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSpec {
    Minutes(f64),
    Text(String),
}

/// How to collapse a duration range ("1-2 weeks") to a single value.
///
/// Configured explicitly rather than left to accident; the default is
/// the midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    #[default]
    Midpoint,
    UpperBound,
}

impl RangePolicy {
    fn collapse(self, low: f64, high: f64) -> f64 {
        match self {
            Self::Midpoint => (low + high) / 2.0,
            Self::UpperBound => high,
        }
    }
}

impl std::str::FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "midpoint" => Ok(Self::Midpoint),
            "upper_bound" | "upper-bound" => Ok(Self::UpperBound),
            other => Err(format!(
                "unknown range policy '{}' (expected 'midpoint' or 'upper_bound')",
                other
            )),
        }
    }
}

/// Outcome of normalizing a project's time commitment.
///
/// `Undefined` (zero or missing duration) is deliberately distinct from
/// a computed zero rate so downstream filtering never confuses
/// "unknown" with "worthless". `Malformed` carries the parse failure
/// for manual review.
#[derive(Debug, Clone, PartialEq)]
pub enum Rate {
    PerHour { hours: f64, hourly: f64 },
    Undefined,
    Malformed(String),
}

impl Rate {
    /// The hourly dollar amount, if defined
    pub fn hourly(&self) -> Option<f64> {
        match self {
            Self::PerHour { hourly, .. } => Some(*hourly),
            _ => None,
        }
    }

    /// The total duration in hours, if defined
    pub fn hours(&self) -> Option<f64> {
        match self {
            Self::PerHour { hours, .. } => Some(*hours),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerHour { hourly, .. } => write!(f, "${:.2}/hr", hourly),
            Self::Undefined => write!(f, "n/a"),
            Self::Malformed(reason) => write!(f, "unparseable ({})", reason),
        }
    }
}

/// A project with its derived hourly rate attached
#[derive(Debug, Clone)]
pub struct NormalizedProject {
    pub project: Project,
    pub rate: Rate,
}

impl NormalizedProject {
    /// Normalize a project's time commitment into an hourly rate.
    ///
    /// Pure function of the project payload and the range policy.
    pub fn from_project(project: Project, policy: RangePolicy) -> Self {
        let rate = match &project.time_required {
            None => Rate::Undefined,
            Some(spec) => match duration_hours(spec, policy) {
                Ok(None) => Rate::Undefined,
                Ok(Some(hours)) => Rate::PerHour {
                    hours,
                    hourly: project.incentive / hours,
                },
                Err(reason) => Rate::Malformed(reason),
            },
        };
        Self { project, rate }
    }
}

/// Convert a duration specification to hours.
///
/// Returns `Ok(None)` for a zero or negative duration (rate undefined)
/// and `Err` for text that cannot be parsed.
fn duration_hours(spec: &DurationSpec, policy: RangePolicy) -> Result<Option<f64>, String> {
    let hours = match spec {
        DurationSpec::Minutes(minutes) => minutes / MINUTES_PER_HOUR,
        DurationSpec::Text(text) => parse_duration_text(text, policy)?,
    };

    if hours > 0.0 {
        Ok(Some(hours))
    } else {
        Ok(None)
    }
}

/// Parse a free-text time commitment like "30 minutes", "2 hours",
/// "5 days" or "1-2 weeks" into hours.
fn parse_duration_text(text: &str, policy: RangePolicy) -> Result<f64, String> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut parts = text.split_whitespace();
    let amount_str = parts
        .next()
        .ok_or_else(|| format!("no amount in '{}'", text))?;
    let unit = parts.next();

    if parts.next().is_some() {
        return Err(format!("unrecognized duration '{}'", text));
    }

    let amount = parse_amount(amount_str, policy)?;

    let hours = match unit {
        // A bare number follows the vendor's minutes convention
        None => amount / MINUTES_PER_HOUR,
        Some(u) => match u.trim_end_matches('s') {
            "minute" | "min" | "m" => amount / MINUTES_PER_HOUR,
            "hour" | "hr" | "h" => amount,
            "day" | "d" => amount * HOURS_PER_DAY,
            "week" | "wk" | "w" => amount * HOURS_PER_WEEK,
            other => return Err(format!("unknown duration unit '{}'", other)),
        },
    };

    Ok(hours)
}

/// Parse a numeric amount, which may be a range like "1-2"
fn parse_amount(s: &str, policy: RangePolicy) -> Result<f64, String> {
    if let Some((low, high)) = s.split_once('-') {
        let low: f64 = low
            .trim()
            .parse()
            .map_err(|_| format!("invalid range start '{}'", low))?;
        let high: f64 = high
            .trim()
            .parse()
            .map_err(|_| format!("invalid range end '{}'", high))?;
        if high < low {
            return Err(format!("descending range '{}'", s));
        }
        Ok(policy.collapse(low, high))
    } else {
        s.parse().map_err(|_| format!("invalid amount '{}'", s))
    }
}
