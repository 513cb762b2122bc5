//! Filter expressions for `search_params.expr`.
//!
//! The service accepts a small boolean language over result metadata:
//! `field == 'value'`, `field CONTAINS 'value'`, joined with `&&` and `||`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterExpr {
    Eq { field: String, value: String },
    Contains { field: String, value: String },
    All { clauses: Vec<FilterExpr> },
    Any { clauses: Vec<FilterExpr> },
}

impl FilterExpr {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn all(clauses: impl IntoIterator<Item = FilterExpr>) -> Self {
        Self::All {
            clauses: clauses.into_iter().collect(),
        }
    }

    pub fn any(clauses: impl IntoIterator<Item = FilterExpr>) -> Self {
        Self::Any {
            clauses: clauses.into_iter().collect(),
        }
    }

    pub fn and(self, other: FilterExpr) -> Self {
        match self {
            Self::All { mut clauses } => {
                clauses.push(other);
                Self::All { clauses }
            }
            first => Self::all([first, other]),
        }
    }

    pub fn or(self, other: FilterExpr) -> Self {
        match self {
            Self::Any { mut clauses } => {
                clauses.push(other);
                Self::Any { clauses }
            }
            first => Self::any([first, other]),
        }
    }

    fn needs_parens(&self) -> bool {
        match self {
            Self::All { clauses } | Self::Any { clauses } => clauses.len() > 1,
            _ => false,
        }
    }

    fn write_joined(f: &mut fmt::Formatter<'_>, clauses: &[FilterExpr], op: &str) -> fmt::Result {
        for (i, clause) in clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " {op} ")?;
            }
            if clause.needs_parens() {
                write!(f, "({clause})")?;
            } else {
                write!(f, "{clause}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { field, value } => write!(f, "{field} == '{}'", quote(value)),
            Self::Contains { field, value } => write!(f, "{field} CONTAINS '{}'", quote(value)),
            Self::All { clauses } => Self::write_joined(f, clauses, "&&"),
            Self::Any { clauses } => Self::write_joined(f, clauses, "||"),
        }
    }
}

fn quote(value: &str) -> String {
    value.replace('\'', "\\'")
}
