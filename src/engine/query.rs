//! # Search Query Parser
//!
//! Turns request query parameters into a search over one entity type.
//!
//! - `sort` and `limit` are reserved; every other key is a field filter
//! - Keys are reduced to `[A-Za-z0-9_-]`; a key left empty is ignored
//! - `sort=name,-birthDate` sorts ascending by name, then descending by date

use super::filters::{FieldFilter, FilterSet};

/// Maximum number of records a search can return
pub const MAX_LIMIT: usize = 1000;

/// Number of records returned when no usable limit is given
pub const DEFAULT_LIMIT: usize = 100;

/// Result-size policy applied to every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl Limits {
    /// Missing, unparsable or non-positive → default; too large → max.
    pub fn resolve(&self, requested: Option<&str>) -> usize {
        match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
            Some(n) if n > 0 => (n as u64).min(self.max_limit as u64) as usize,
            _ => self.default_limit.min(self.max_limit),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One key of a multi-key sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A parsed search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub filters: FilterSet,
    pub sort: Vec<SortKey>,
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            filters: FilterSet::default(),
            sort: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchQuery {
    /// Parse query parameters, in request order.
    pub fn parse<I, K, V>(params: I, limits: &Limits) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Vec::new();
        let mut sort = Vec::new();
        let mut limit = None;

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "sort" => sort = parse_sort(value),
                "limit" => limit = Some(value.to_string()),
                _ => {
                    let field = sanitize_field_name(key);
                    if !field.is_empty() {
                        filters.push(FieldFilter::new(field, value));
                    }
                }
            }
        }

        Self {
            filters: FilterSet::new(filters),
            sort,
            limit: limits.resolve(limit.as_deref()),
        }
    }
}

/// Parse a comma-separated sort list; a leading `-` means descending.
fn parse_sort(value: &str) -> Vec<SortKey> {
    value
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            let (raw, direction) = match part.strip_prefix('-') {
                Some(rest) => (rest, SortDirection::Desc),
                None => (part, SortDirection::Asc),
            };
            let field = sanitize_field_name(raw);
            if field.is_empty() {
                None
            } else {
                Some(SortKey { field, direction })
            }
        })
        .collect()
}

/// Drops every character outside `[A-Za-z0-9_-]`.
pub fn sanitize_field_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
