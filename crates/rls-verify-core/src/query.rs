// crates/rls-verify-core/src/query.rs
// ============================================================================
// Module: Query Builder
// Description: Renders PostgREST query pairs for reads, updates, and deletes.
// Purpose: Centralize equality-predicate construction and guard mass writes.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every REST call renders its query string through [`build_query`]. Filters
//! are equality predicates rendered as `field=eq.value` and conjoined in field
//! order. Percent-encoding happens when the pairs are appended to a URL, so a
//! value can never terminate its own predicate.
//!
//! ## Invariants
//! - Update and delete operations require at least one predicate.
//! - Field names are non-empty.

use std::collections::BTreeMap;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Conjunction of equality predicates keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Field to expected value.
    predicates: BTreeMap<String, String>,
}

impl Filters {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter set with a single `field = value` predicate.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().and(field, value)
    }

    /// Adds a `field = value` predicate; a repeated field replaces the old value.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.insert(field.into(), value.into());
        self
    }

    /// Returns true when no predicates are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns the number of predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Iterates predicates in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.predicates.iter().map(|(field, value)| (field.as_str(), value.as_str()))
    }
}

/// Operation a query string is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOp {
    /// Read with a column projection and optional row limit.
    Select {
        /// Comma-separated column projection (`*` when empty).
        columns: String,
        /// Optional maximum number of rows.
        limit: Option<usize>,
    },
    /// Partial update scoped by filters.
    Update,
    /// Delete scoped by filters.
    Delete,
}

impl QueryOp {
    /// Builds an unbounded select.
    #[must_use]
    pub fn select(columns: &str) -> Self {
        Self::Select {
            columns: columns.to_string(),
            limit: None,
        }
    }

    /// Builds a select bounded to `limit` rows.
    #[must_use]
    pub fn select_limited(columns: &str, limit: usize) -> Self {
        Self::Select {
            columns: columns.to_string(),
            limit: Some(limit),
        }
    }

    /// Returns the operation label used in error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Select {
                ..
            } => "select",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Query construction error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Update or delete without any predicate.
    #[error("refusing unfiltered {0}")]
    Unfiltered(&'static str),
    /// A predicate with an empty field name.
    #[error("filter field name must not be empty")]
    EmptyField,
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the ordered, unencoded query pairs for `op` and `filters`.
///
/// # Errors
///
/// Returns [`QueryError::Unfiltered`] for an update or delete without
/// predicates and [`QueryError::EmptyField`] for an empty field name.
pub fn build_query(op: &QueryOp, filters: &Filters) -> Result<Vec<(String, String)>, QueryError> {
    if filters.iter().any(|(field, _)| field.trim().is_empty()) {
        return Err(QueryError::EmptyField);
    }
    let mut pairs = Vec::with_capacity(filters.len() + 2);
    match op {
        QueryOp::Select {
            columns,
            ..
        } => {
            let projection = if columns.trim().is_empty() { "*" } else { columns.as_str() };
            pairs.push(("select".to_string(), projection.to_string()));
        }
        QueryOp::Update | QueryOp::Delete => {
            if filters.is_empty() {
                return Err(QueryError::Unfiltered(op.label()));
            }
        }
    }
    pairs.extend(filters.iter().map(|(field, value)| (field.to_string(), format!("eq.{value}"))));
    if let QueryOp::Select {
        limit: Some(limit),
        ..
    } = op
    {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    Ok(pairs)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
