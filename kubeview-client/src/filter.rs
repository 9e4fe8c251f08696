//! Row filtering for the table view.
//!
//! A filter is a case-insensitive regular expression matched against the
//! space-joined fields of each row:
//!
//! ```text
//! "ngin.*run"
//! └── keep rows whose joined text (e.g. "default nginx-7c 1/1 Running")
//!     matches the pattern, ignoring case
//! ```
//!
//! Input starting with `-l` is not a pattern but a label selector, forwarded
//! to the data source as a server-side query. The two never apply together.

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};

use crate::structs::{RowEvent, TableData};

pub const SELECTOR_PREFIX: &str = "-l";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterQuery {
    None,
    Pattern(String),
    Selector(String),
}

impl FilterQuery {
    pub fn parse(input: &str) -> Self {
        if input.trim().is_empty() {
            return Self::None;
        }
        match input.trim_start().strip_prefix(SELECTOR_PREFIX) {
            Some(sel) if sel.trim().is_empty() => Self::None,
            Some(sel) => Self::Selector(sel.trim().to_string()),
            None => Self::Pattern(input.to_string()),
        }
    }

    pub fn is_selector(&self) -> bool {
        matches!(self, Self::Selector(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid filter expression `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled row filter.
#[derive(Debug, Clone)]
pub struct RowFilter {
    pattern: String,
    rx: Regex,
}

impl RowFilter {
    pub fn compile(pattern: &str) -> Result<Self, FilterError> {
        let rx = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            rx,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, ev: &RowEvent) -> bool {
        self.rx.is_match(&ev.joined())
    }
}

/// Narrows `data` to the rows matching `filter`. `None` keeps every row.
#[tracing::instrument(skip(data, filter), fields(rows = data.rows.len()))]
pub fn filter_table(data: &TableData, filter: Option<&RowFilter>) -> TableData {
    let Some(filter) = filter else {
        return data.clone();
    };

    let mut out = data.head();
    out.rows = data
        .rows
        .par_iter()
        .filter(|(_, ev)| filter.matches(ev))
        .map(|(k, ev)| (k.clone(), ev.clone()))
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::NamespaceScope;

    fn table(rows: &[(&str, &[&str])]) -> TableData {
        let mut data = TableData::empty(
            vec!["NAME".into(), "STATUS".into()],
            NamespaceScope::All,
        );
        for (k, fields) in rows {
            data.rows.insert(
                k.to_string(),
                RowEvent::new(fields.iter().map(|s| s.to_string()).collect()),
            );
        }
        data
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(FilterQuery::parse(""), FilterQuery::None);
        assert_eq!(FilterQuery::parse("   "), FilterQuery::None);
        assert_eq!(FilterQuery::parse("nginx"), FilterQuery::Pattern("nginx".into()));
        assert_eq!(
            FilterQuery::parse("-l app=nginx"),
            FilterQuery::Selector("app=nginx".into())
        );
        assert_eq!(FilterQuery::parse("-l "), FilterQuery::None);
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let data = table(&[("a", &["a", "Running"]), ("b", &["b", "Pending"])]);
        assert_eq!(filter_table(&data, None), data);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let data = table(&[
            ("1", &["ABC", "x"]),
            ("2", &["abc", "x"]),
            ("3", &["zzz", "AbC"]),
            ("4", &["zzz", "x"]),
        ]);
        let filter = RowFilter::compile("(?i)abc").expect("valid");
        let out = filter_table(&data, Some(&filter));

        let mut keys: Vec<_> = out.rows.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["1", "2", "3"]);
        assert_eq!(out.header, data.header);
    }

    #[test]
    fn test_filter_matches_across_fields() {
        let data = table(&[("a", &["nginx", "Running"]), ("b", &["redis", "Running"])]);
        let filter = RowFilter::compile("nginx running").expect("valid");
        let out = filter_table(&data, Some(&filter));
        assert_eq!(out.rows.len(), 1);
        assert!(out.rows.contains_key("a"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RowFilter::compile("[unclosed").expect_err("invalid");
        assert!(err.to_string().contains("[unclosed"));
    }
}
