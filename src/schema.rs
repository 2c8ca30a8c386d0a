//! Filter schema normalization
//!
//! The backend declares its filterable fields at runtime as loosely typed
//! JSON. This module turns that into a typed [`FilterSchema`]. It never fails:
//! anything it cannot understand is skipped or degraded with a warning, since
//! a bad schema must not block the ticket list.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TicketDeskError;
use crate::filter::FilterValue;

/// How a filter field is edited and how its value is shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Text,
    Dropdown,
    Multiselect,
    Date,
}

impl FilterKind {
    /// Parse a server-declared type name, accepting common aliases
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Some(FilterKind::Text),
            "dropdown" | "select" => Some(FilterKind::Dropdown),
            "multiselect" | "multi_select" | "multi-select" => Some(FilterKind::Multiselect),
            "date" | "datetime" => Some(FilterKind::Date),
            _ => None,
        }
    }

    pub fn has_choices(self) -> bool {
        matches!(self, FilterKind::Dropdown | FilterKind::Multiselect)
    }

    /// Value a freshly activated field starts with
    pub fn initial_value(self) -> FilterValue {
        match self {
            FilterKind::Multiselect => FilterValue::Many(Vec::new()),
            FilterKind::Text | FilterKind::Dropdown | FilterKind::Date => {
                FilterValue::Text(String::new())
            }
        }
    }

    pub fn default_operator(self) -> Operator {
        match self {
            FilterKind::Text => Operator::Contains,
            FilterKind::Dropdown | FilterKind::Date => Operator::Equals,
            FilterKind::Multiselect => Operator::In,
        }
    }
}

/// Comparison applied between a field and its filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    DoesNotContain,
    DoesNotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Between,
    In,
    NotIn,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Equals,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::DoesNotContain,
        Operator::DoesNotEqual,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThanOrEqual,
        Operator::Between,
        Operator::In,
        Operator::NotIn,
    ];
}

enum_display_fromstr!(
    Operator,
    TicketDeskError::invalid_operator,
    {
        Equals => "equals",
        Contains => "contains",
        StartsWith => "startsWith",
        EndsWith => "endsWith",
        DoesNotContain => "doesNotContain",
        DoesNotEqual => "doesNotEqual",
        GreaterThan => "greaterThan",
        LessThan => "lessThan",
        GreaterThanOrEqual => "greaterThanOrEqual",
        LessThanOrEqual => "lessThanOrEqual",
        Between => "between",
        In => "in",
        NotIn => "notIn",
    }
);

/// One selectable option of a dropdown or multiselect field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A typed filter field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    pub label: String,
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    pub default_operator: Operator,
}

impl FilterField {
    /// A plain text field with the kind's default operator
    pub fn text(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind: FilterKind::Text,
            choices: Vec::new(),
            default_operator: FilterKind::Text.default_operator(),
        }
    }

    /// Look up a choice by its value, e.g. to label a stored filter value
    pub fn choice(&self, value: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.value == value)
    }
}

/// The loaded schema: fields in server order plus their initial values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSchema {
    pub fields: Vec<FilterField>,
    pub initial_values: BTreeMap<String, FilterValue>,
}

impl FilterSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn initial_value(&self, name: &str) -> FilterValue {
        self.initial_values
            .get(name)
            .cloned()
            .unwrap_or_else(|| FilterValue::Text(String::new()))
    }

    /// Add a field if its name is not taken yet. Returns whether it was added.
    pub fn insert(&mut self, field: FilterField) -> bool {
        if self.field(&field.name).is_some() {
            return false;
        }
        self.initial_values
            .insert(field.name.clone(), field.kind.initial_value());
        self.fields.push(field);
        true
    }
}

/// Normalize the raw schema payload into a [`FilterSchema`].
///
/// Accepts a bare array of descriptors or an object wrapping one under
/// `data`. `null` and anything else degrade to an empty schema.
pub fn adapt_schema(raw: &Value) -> FilterSchema {
    let descriptors: &[Value] = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                tracing::warn!("filter schema object has no `data` array; no filters available");
                &[]
            }
        },
        Value::Null => &[],
        other => {
            tracing::warn!("filter schema is not an array (got {other}); no filters available");
            &[]
        }
    };

    let mut schema = FilterSchema::empty();
    let mut seen = HashSet::new();

    for (index, descriptor) in descriptors.iter().enumerate() {
        let Some(field) = adapt_descriptor(index, descriptor) else {
            continue;
        };
        if !seen.insert(field.name.clone()) {
            tracing::warn!(
                "duplicate filter field '{}' at index {index}; keeping the first",
                field.name
            );
            continue;
        }
        schema.insert(field);
    }

    schema
}

fn adapt_descriptor(index: usize, descriptor: &Value) -> Option<FilterField> {
    let Some(obj) = descriptor.as_object() else {
        tracing::warn!("filter descriptor at index {index} is not an object; skipping");
        return None;
    };

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let Some(name) = name else {
        tracing::warn!("filter descriptor at index {index} has no name; skipping");
        return None;
    };

    let label = obj
        .get("label")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
        .to_string();

    let raw_kind = obj.get("type").and_then(Value::as_str).unwrap_or("");
    let kind = FilterKind::parse(raw_kind).unwrap_or_else(|| {
        tracing::warn!("filter field '{name}' has unrecognized type '{raw_kind}'; treating as text");
        FilterKind::Text
    });

    let choices = if kind.has_choices() {
        obj.get("choices").map(adapt_choices).unwrap_or_default()
    } else {
        Vec::new()
    };

    let default_operator = obj
        .get("operator")
        .or_else(|| obj.get("defaultOperator"))
        .and_then(Value::as_str)
        .and_then(|s| match Operator::from_str(s) {
            Ok(op) => Some(op),
            Err(_) => {
                tracing::warn!("filter field '{name}' has unknown operator '{s}'; using default");
                None
            }
        })
        .unwrap_or_else(|| kind.default_operator());

    Some(FilterField {
        name: name.to_string(),
        label,
        kind,
        choices,
        default_operator,
    })
}

fn adapt_choices(raw: &Value) -> Vec<Choice> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(Choice {
                value: s.clone(),
                label: s.clone(),
                color: None,
            }),
            Value::Number(n) => Some(Choice {
                value: n.to_string(),
                label: n.to_string(),
                color: None,
            }),
            Value::Object(obj) => {
                let value = match obj.get("value")? {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                let label = obj
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.clone());
                let color = obj.get("color").and_then(Value::as_str).map(str::to_string);
                Some(Choice {
                    value,
                    label,
                    color,
                })
            }
            _ => None,
        })
        .collect()
}
