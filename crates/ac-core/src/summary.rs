//! Structured run summary
//!
//! A [`RunReport`] records, per selector, how many resources matched and,
//! per alarm name, what happened to it. It is what the CLI prints and what
//! `--output json` serializes.

use crate::names::{AlarmName, SelectorId};
use crate::resource::ResourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to one alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Created,
    Updated,
    Unchanged,
    Deleted,
    /// The operation failed after retries
    Failed,
    /// The operation was not attempted (cancelled, withheld, or dry run)
    Skipped,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeKind::Created => "created",
            OutcomeKind::Updated => "updated",
            OutcomeKind::Unchanged => "unchanged",
            OutcomeKind::Deleted => "deleted",
            OutcomeKind::Failed => "failed",
            OutcomeKind::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of one alarm in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmOutcome {
    pub name: AlarmName,
    pub outcome: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AlarmOutcome {
    fn of(name: AlarmName, outcome: OutcomeKind) -> Self {
        Self {
            name,
            outcome,
            reason: None,
        }
    }

    pub fn created(name: AlarmName) -> Self {
        Self::of(name, OutcomeKind::Created)
    }

    pub fn updated(name: AlarmName) -> Self {
        Self::of(name, OutcomeKind::Updated)
    }

    pub fn unchanged(name: AlarmName) -> Self {
        Self::of(name, OutcomeKind::Unchanged)
    }

    pub fn deleted(name: AlarmName) -> Self {
        Self::of(name, OutcomeKind::Deleted)
    }

    /// Terminal failure of the alarm's operation.
    pub fn failed(name: AlarmName, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::of(name, OutcomeKind::Failed)
        }
    }

    pub fn skipped(name: AlarmName, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::of(name, OutcomeKind::Skipped)
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == OutcomeKind::Failed
    }
}

/// Discovery result of one selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorReport {
    pub selector: SelectorId,
    pub resource_type: ResourceType,
    /// Resources matched (0 when discovery failed)
    pub matched: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A (resource, metric) pair no alarm could be generated for.
///
/// Only that alarm is left out; the rest of its selector is reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedAlarm {
    pub selector: SelectorId,
    pub resource_name: String,
    pub metric_name: String,
    pub reason: String,
}

/// Number of alarms per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    fn add(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Created => self.created += 1,
            OutcomeKind::Updated => self.updated += 1,
            OutcomeKind::Unchanged => self.unchanged += 1,
            OutcomeKind::Deleted => self.deleted += 1,
            OutcomeKind::Failed => self.failed += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
    }
}

/// Summary of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub run_id: Uuid,

    pub started_at: DateTime<Utc>,

    /// Set by [`RunReport::finish`]
    pub finished_at: Option<DateTime<Utc>>,

    /// True when nothing was applied
    pub dry_run: bool,

    pub selectors: Vec<SelectorReport>,

    /// Sorted by alarm name once finished
    pub alarms: Vec<AlarmOutcome>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedAlarm>,

    pub counts: OutcomeCounts,

    /// True when every selector was discovered, every desired alarm could be
    /// generated and every planned operation succeeded
    pub success: bool,
}

impl RunReport {
    /// Start a new report.
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            selectors: Vec::new(),
            alarms: Vec::new(),
            rejected: Vec::new(),
            counts: OutcomeCounts::default(),
            success: false,
        }
    }

    pub fn record_selector(&mut self, report: SelectorReport) {
        self.selectors.push(report);
    }

    pub fn record(&mut self, outcome: AlarmOutcome) {
        self.alarms.push(outcome);
    }

    pub fn record_rejected(&mut self, rejected: impl IntoIterator<Item = RejectedAlarm>) {
        self.rejected.extend(rejected);
    }

    pub fn record_all(&mut self, outcomes: impl IntoIterator<Item = AlarmOutcome>) {
        self.alarms.extend(outcomes);
    }

    /// Sort outcomes, compute counts and the overall success flag.
    ///
    /// In a dry run, `skipped` entries are the planned operations and do not
    /// count against success.
    pub fn finish(&mut self) {
        self.alarms.sort_by(|a, b| a.name.cmp(&b.name));

        let mut counts = OutcomeCounts::default();
        for outcome in &self.alarms {
            counts.add(outcome.outcome);
        }
        self.counts = counts;

        let selectors_ok = self.selectors.iter().all(|s| s.error.is_none());
        let alarms_ok = counts.failed == 0 && (self.dry_run || counts.skipped == 0);
        self.success = selectors_ok && alarms_ok && self.rejected.is_empty();
        self.finished_at = Some(Utc::now());
    }

    /// Alarms whose operation failed.
    pub fn failures(&self) -> impl Iterator<Item = &AlarmOutcome> {
        self.alarms.iter().filter(|a| a.is_failure())
    }

    /// Selectors whose discovery failed.
    pub fn failed_selectors(&self) -> impl Iterator<Item = &SelectorReport> {
        self.selectors.iter().filter(|s| s.error.is_some())
    }

    /// Outcome recorded for a given alarm.
    pub fn outcome_of(&self, name: &str) -> Option<&AlarmOutcome> {
        self.alarms.iter().find(|a| a.name == name)
    }

    /// Wall-clock duration in milliseconds, once finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
