//! Column scopes
//!
//! A scope maps a qualifier (table name or alias) to the column names known
//! to be consumed downstream. The empty qualifier is the unqualified scope.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Qualifier used for columns not attributed to any table
pub const UNQUALIFIED: &str = "";

/// Mapping from qualifier to the set of available column names
///
/// A qualifier mapped to an empty set and a missing qualifier behave the same
/// for expansion (nothing known, nothing rewritten), but are kept distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnScope {
    columns: BTreeMap<String, BTreeSet<String>>,
}

impl ColumnScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope holding only unqualified columns
    pub fn unqualified<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scope = Self::new();
        scope.extend(UNQUALIFIED, columns);
        scope
    }

    /// Add a single column under a qualifier
    pub fn insert(&mut self, qualifier: impl Into<String>, column: impl Into<String>) -> &mut Self {
        self.columns
            .entry(qualifier.into())
            .or_default()
            .insert(column.into());
        self
    }

    /// Add columns under a qualifier, creating the qualifier even if `columns` is empty
    pub fn extend<I, S>(&mut self, qualifier: impl Into<String>, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .entry(qualifier.into())
            .or_default()
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Columns registered for a qualifier, if the qualifier is present
    pub fn get(&self, qualifier: &str) -> Option<&BTreeSet<String>> {
        self.columns.get(qualifier)
    }

    /// Whether the qualifier is present (possibly with no columns)
    pub fn contains_qualifier(&self, qualifier: &str) -> bool {
        self.columns.contains_key(qualifier)
    }

    /// Union of the columns of every qualifier, sorted and de-duplicated
    pub fn union(&self) -> BTreeSet<&str> {
        self.columns
            .values()
            .flat_map(|cols| cols.iter().map(String::as_str))
            .collect()
    }

    /// True when no qualifier carries any column
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(BTreeSet::is_empty)
    }

    /// Iterate over qualifiers and their columns in qualifier order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.columns.iter().map(|(q, cols)| (q.as_str(), cols))
    }
}

impl<Q, I, S> FromIterator<(Q, I)> for ColumnScope
where
    Q: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (Q, I)>>(iter: T) -> Self {
        let mut scope = Self::new();
        for (qualifier, columns) in iter {
            scope.extend(qualifier, columns);
        }
        scope
    }
}
