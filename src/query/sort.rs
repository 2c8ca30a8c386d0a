//! Explicit sort selection for the ticket list.
//!
//! Sorting is done by the backend's dedicated sorted-list endpoint; this
//! module only describes which column and direction were chosen.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TicketDeskError;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

enum_display_fromstr!(
    SortOrder,
    TicketDeskError::invalid_sort_order,
    {
        Asc => "asc",
        Desc => "desc",
    }
);

/// A column plus direction for the sorted listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    /// Next state when the agent clicks a column header: a new column starts
    /// ascending, the same column flips direction.
    pub fn toggled(current: Option<&SortSpec>, field: &str) -> SortSpec {
        match current {
            Some(spec) if spec.field == field => SortSpec::new(field, spec.order.reverse()),
            _ => SortSpec::asc(field),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.order)
    }
}
