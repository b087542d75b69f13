//! Types for the PostgrestClient

/// Count options for queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountOption {
    /// Exact count
    Exact,

    /// Planned count (estimated)
    Planned,

    /// Estimated count
    Estimated,
}

impl CountOption {
    /// Convert the option to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CountOption::Exact => "exact",
            CountOption::Planned => "planned",
            CountOption::Estimated => "estimated",
        }
    }
}

/// Options for returning data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnOption {
    /// Return representation (the data)
    Representation,

    /// Return minimal data
    Minimal,
}

impl ReturnOption {
    /// Convert the option to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnOption::Representation => "representation",
            ReturnOption::Minimal => "minimal",
        }
    }

    /// Value of the `Prefer` header
    pub fn prefer(&self) -> String {
        format!("return={}", self.as_str())
    }
}

/// Total row count from a `Content-Range` header such as `0-9/42` or `*/0`
pub fn content_range_total(value: &str) -> Option<i64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}
