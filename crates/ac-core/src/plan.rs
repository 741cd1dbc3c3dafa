//! The reconciler: diff desired alarms against owned alarms
//!
//! Planning is a pure map operation. Nothing here touches the cloud, so the
//! whole create/update/delete decision can be tested in isolation.

use crate::alarm::{DesiredAlarmSpec, ExistingAlarm};
use crate::error::{CoreError, CoreResult};
use crate::names::{AlarmName, AlarmNaming};
use std::collections::{BTreeMap, BTreeSet};

/// A desired alarm that exists but must be put again.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmUpdate {
    pub spec: DesiredAlarmSpec,

    /// Fields that differ from the stored alarm; empty for a forced put
    pub changed_fields: Vec<&'static str>,
}

impl AlarmUpdate {
    /// True when the put was requested with `update_all` rather than by a diff.
    pub fn is_forced(&self) -> bool {
        self.changed_fields.is_empty()
    }
}

/// Output of [`Reconciler::plan`]. Every list is sorted by alarm name.
///
/// `to_create`, `to_update`, `to_delete`, `unchanged` and `withheld` are
/// pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    pub to_create: Vec<DesiredAlarmSpec>,
    pub to_update: Vec<AlarmUpdate>,
    pub to_delete: Vec<AlarmName>,
    pub unchanged: Vec<DesiredAlarmSpec>,
    /// Owned alarms that look orphaned but were kept because the selector
    /// that might still want them failed discovery
    pub withheld: Vec<AlarmName>,
}

impl ReconciliationPlan {
    /// True when applying the plan would not change anything.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Number of cloud mutations the plan implies.
    pub fn mutation_count(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    /// Specs to put, creates first.
    pub fn puts(&self) -> impl Iterator<Item = &DesiredAlarmSpec> {
        self.to_create
            .iter()
            .chain(self.to_update.iter().map(|u| &u.spec))
    }
}

/// Computes reconciliation plans for one naming convention.
#[derive(Debug, Clone)]
pub struct Reconciler {
    naming: AlarmNaming,
    update_all: bool,
    protected_namespaces: BTreeSet<String>,
}

impl Reconciler {
    pub fn new(naming: AlarmNaming) -> Self {
        Self {
            naming,
            update_all: false,
            protected_namespaces: BTreeSet::new(),
        }
    }

    /// Put every desired alarm, even the ones that did not change.
    pub fn update_all(mut self, update_all: bool) -> Self {
        self.update_all = update_all;
        self
    }

    /// Never delete owned alarms in these namespaces, nor owned alarms whose
    /// definition could not be read.
    ///
    /// Used when discovery failed for selectors targeting these namespaces:
    /// their resources may still exist, so their alarms are not orphans.
    pub fn protect_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_namespaces
            .extend(namespaces.into_iter().map(Into::into));
        self
    }

    /// Diff desired specs against existing alarms.
    ///
    /// Existing alarms outside the naming convention are ignored. Fails with
    /// [`CoreError::AlarmNameConflict`] when two desired specs share a name
    /// with different definitions; identical duplicates collapse.
    pub fn plan(
        &self,
        desired: impl IntoIterator<Item = DesiredAlarmSpec>,
        existing: impl IntoIterator<Item = ExistingAlarm>,
    ) -> CoreResult<ReconciliationPlan> {
        let desired = index_desired(desired)?;

        let mut owned: BTreeMap<AlarmName, ExistingAlarm> = BTreeMap::new();
        for alarm in existing {
            if !self.naming.owns(alarm.name.as_str()) {
                log::debug!("Ignoring alarm '{}': not owned", alarm.name);
                continue;
            }
            owned.entry(alarm.name.clone()).or_insert(alarm);
        }

        let mut plan = ReconciliationPlan::default();

        for (name, spec) in desired.iter() {
            match owned.get(name) {
                None => plan.to_create.push(spec.clone()),
                Some(current) => {
                    let changed_fields = match &current.definition {
                        Some(def) => spec.definition.differences(def),
                        None => vec!["definition"],
                    };
                    if !changed_fields.is_empty() || self.update_all {
                        plan.to_update.push(AlarmUpdate {
                            spec: spec.clone(),
                            changed_fields,
                        });
                    } else {
                        plan.unchanged.push(spec.clone());
                    }
                }
            }
        }

        for (name, alarm) in owned {
            if desired.contains_key(&name) {
                continue;
            }
            if self.is_protected(&alarm) {
                log::warn!(
                    "Keeping alarm '{}': discovery failed for a selector that may own it",
                    name
                );
                plan.withheld.push(name);
            } else {
                plan.to_delete.push(name);
            }
        }

        Ok(plan)
    }

    fn is_protected(&self, alarm: &ExistingAlarm) -> bool {
        if self.protected_namespaces.is_empty() {
            return false;
        }
        match &alarm.definition {
            Some(def) => self.protected_namespaces.contains(&def.namespace),
            None => true,
        }
    }
}

fn index_desired(
    desired: impl IntoIterator<Item = DesiredAlarmSpec>,
) -> CoreResult<BTreeMap<AlarmName, DesiredAlarmSpec>> {
    let mut index: BTreeMap<AlarmName, DesiredAlarmSpec> = BTreeMap::new();
    for spec in desired {
        if let Some(previous) = index.get(&spec.name) {
            if previous.definition.is_equivalent(&spec.definition) {
                continue;
            }
            return Err(CoreError::AlarmNameConflict {
                name: spec.name.to_string(),
                first: previous.selector.to_string(),
                second: spec.selector.to_string(),
            });
        }
        index.insert(spec.name.clone(), spec);
    }
    Ok(index)
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
