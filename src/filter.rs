//! Filter state for the ticket list
//!
//! Holds which filter fields are active (in the order the agent added them),
//! their operators and values, and turns that into the cleaned payload the
//! list endpoint receives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TicketDeskError};
use crate::schema::{FilterField, FilterSchema, Operator};

/// Default number of non-pinned filters that may be active at once
pub const DEFAULT_MAX_ACTIVE_FILTERS: usize = 4;

/// A raw filter value as entered by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Text(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// Build a set value, keeping first-seen order and dropping duplicates
    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for v in values {
            let v = v.into();
            if !out.contains(&v) {
                out.push(v);
            }
        }
        FilterValue::Many(out)
    }

    /// The value with blank parts removed, or `None` if nothing is left.
    ///
    /// This is the single definition of "empty means absent" for payloads.
    pub fn cleaned(&self) -> Option<FilterValue> {
        match self {
            FilterValue::Null => None,
            FilterValue::Text(s) => {
                if s.trim().is_empty() {
                    None
                } else {
                    Some(FilterValue::Text(s.clone()))
                }
            }
            FilterValue::Many(items) => {
                let kept: Vec<String> = items
                    .iter()
                    .filter(|s| !s.trim().is_empty())
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(FilterValue::Many(kept))
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cleaned().is_none()
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

/// A field the agent has added to the filter panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilter {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

/// One entry of the cleaned query payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub operator: Operator,
    pub value: FilterValue,
}

/// Cleaned filter payload: only non-empty values, keyed by field name
pub type QueryPayload = BTreeMap<String, FilterClause>;

/// Cardinality policy for active filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Maximum number of non-pinned active filters
    pub max_active: usize,
    /// Field that is always active and exempt from the cap
    pub pinned_field: Option<String>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE_FILTERS,
            pinned_field: None,
        }
    }
}

impl FilterPolicy {
    pub fn with_pinned(mut self, field: impl Into<String>) -> Self {
        self.pinned_field = Some(field.into());
        self
    }

    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    pub fn is_pinned(&self, field: &str) -> bool {
        self.pinned_field.as_deref() == Some(field)
    }
}

/// Current filter panel state
#[derive(Debug, Clone)]
pub struct FilterStateStore {
    schema: FilterSchema,
    policy: FilterPolicy,
    active: Vec<ActiveFilter>,
}

impl FilterStateStore {
    /// Create a store over a loaded schema. The pinned field, if any, starts
    /// active; if the schema does not declare it, a text field is added.
    pub fn new(mut schema: FilterSchema, policy: FilterPolicy) -> Self {
        if let Some(pinned) = &policy.pinned_field
            && schema.field(pinned).is_none()
        {
            schema.insert(FilterField::text(pinned.clone()));
        }

        let mut store = Self {
            schema,
            policy,
            active: Vec::new(),
        };
        store.seed_pinned();
        store
    }

    fn seed_pinned(&mut self) {
        let Some(pinned) = self.policy.pinned_field.clone() else {
            return;
        };
        let filter = self.fresh_filter(&pinned);
        match self.active.iter_mut().find(|f| f.field == pinned) {
            Some(existing) => *existing = filter,
            None => self.active.insert(0, filter),
        }
    }

    fn fresh_filter(&self, name: &str) -> ActiveFilter {
        let operator = self
            .schema
            .field(name)
            .map(|f| f.default_operator)
            .unwrap_or(Operator::Contains);
        ActiveFilter {
            field: name.to_string(),
            operator,
            value: self.schema.initial_value(name),
        }
    }

    /// Move the current filters onto a newly loaded schema.
    ///
    /// Active filters keep their values and operators as long as the new
    /// schema declares the field (the pinned field always survives). Fields
    /// the schema does not know are dropped with a warning.
    pub fn with_schema(self, schema: FilterSchema) -> Self {
        let mut store = Self::new(schema, self.policy.clone());
        for filter in self.active {
            if store.policy.is_pinned(&filter.field) {
                if let Some(pinned) = store.active.iter_mut().find(|f| f.field == filter.field) {
                    *pinned = filter;
                }
                continue;
            }
            if store.schema.field(&filter.field).is_none() {
                tracing::warn!(
                    "filter '{}' is not in the loaded schema; dropping it",
                    filter.field
                );
                continue;
            }
            if store.capped_count() < store.policy.max_active {
                store.active.push(filter);
            }
        }
        store
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// Active filters in the order they were added (pinned first)
    pub fn active(&self) -> &[ActiveFilter] {
        &self.active
    }

    pub fn is_active(&self, field: &str) -> bool {
        self.active.iter().any(|f| f.field == field)
    }

    /// Number of active filters that count against the cap
    pub fn capped_count(&self) -> usize {
        self.active
            .iter()
            .filter(|f| !self.policy.is_pinned(&f.field))
            .count()
    }

    /// Fields the "add filter" menu can still offer
    pub fn available_fields(&self) -> Vec<&FilterField> {
        self.schema
            .fields
            .iter()
            .filter(|f| !self.is_active(&f.name))
            .collect()
    }

    pub fn value(&self, field: &str) -> Option<&FilterValue> {
        self.active
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.value)
    }

    /// Add a field to the active set, seeded with its initial value
    pub fn activate(&mut self, field: &str) -> Result<()> {
        if self.schema.field(field).is_none() {
            return Err(TicketDeskError::UnknownFilterField(field.to_string()));
        }
        if self.is_active(field) {
            return Ok(());
        }
        if !self.policy.is_pinned(field) && self.capped_count() >= self.policy.max_active {
            return Err(TicketDeskError::FilterLimitExceeded {
                cap: self.policy.max_active,
            });
        }

        let filter = self.fresh_filter(field);
        self.active.push(filter);
        Ok(())
    }

    /// Remove a field from the active set. The pinned field stays.
    pub fn deactivate(&mut self, field: &str) {
        if self.policy.is_pinned(field) {
            return;
        }
        self.active.retain(|f| f.field != field);
    }

    /// Store a raw value on an active field. Operator compatibility is not
    /// checked here; inactive fields are ignored.
    pub fn set_value(&mut self, field: &str, value: FilterValue) {
        if let Some(active) = self.active.iter_mut().find(|f| f.field == field) {
            active.value = value;
        }
    }

    pub fn set_operator(&mut self, field: &str, operator: Operator) {
        if let Some(active) = self.active.iter_mut().find(|f| f.field == field) {
            active.operator = operator;
        }
    }

    /// Cleaned payload: active filters whose value is non-empty
    pub fn build_query_payload(&self) -> QueryPayload {
        self.active
            .iter()
            .filter_map(|f| {
                f.value.cleaned().map(|value| {
                    (
                        f.field.clone(),
                        FilterClause {
                            operator: f.operator,
                            value,
                        },
                    )
                })
            })
            .collect()
    }

    /// Drop every non-pinned filter and clear all values
    pub fn reset_all(&mut self) {
        let pinned = self.policy.pinned_field.clone();
        self.active
            .retain(|f| pinned.as_deref() == Some(f.field.as_str()));
        self.seed_pinned();
    }
}
