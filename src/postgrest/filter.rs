//! Filter operations for PostgrestClient

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOperator {
    /// Equal to
    Eq,

    /// Match a full-text search query
    Fts,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Fts => "fts",
        }
    }

    /// The query value for this operator, e.g. `eq.42`
    pub fn apply(&self, value: &str) -> String {
        format!("{}.{}", self.as_str(), value)
    }
}
