//! Inclusion/exclusion filtering of raw facet values.
//!
//! A facet value such as `"Dendrites, Soma, Axon"` is either matched token
//! by token (split on commas, trimmed, lowercased) or by plain substring.

/// How filter terms are compared against a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Each term must equal one of the value's comma-separated tokens.
    Exact,
    /// Each term must occur somewhere in the raw value.
    Substring,
}

/// Allowed and forbidden terms for one facet.
///
/// Terms are expected in lowercase. An empty list never rejects anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetFilter<'a> {
    pub allowed: &'a [&'a str],
    pub not_allowed: &'a [&'a str],
    pub mode: MatchMode,
}

impl<'a> FacetFilter<'a> {
    pub const fn exact(allowed: &'a [&'a str], not_allowed: &'a [&'a str]) -> Self {
        Self {
            allowed,
            not_allowed,
            mode: MatchMode::Exact,
        }
    }

    pub const fn substring(allowed: &'a [&'a str], not_allowed: &'a [&'a str]) -> Self {
        Self {
            allowed,
            not_allowed,
            mode: MatchMode::Substring,
        }
    }

    /// True when every allowed term matches and no forbidden term does.
    pub fn accepts(&self, value: &str) -> bool {
        match self.mode {
            MatchMode::Exact => {
                let tokens = tokens(value);
                self.allowed.iter().all(|t| tokens.iter().any(|tok| tok == t))
                    && !self.not_allowed.iter().any(|t| tokens.iter().any(|tok| tok == t))
            }
            MatchMode::Substring => {
                self.allowed.iter().all(|t| value.contains(t))
                    && !self.not_allowed.iter().any(|t| value.contains(t))
            }
        }
    }

    /// Keep the accepted values, preserving their order.
    pub fn apply<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        values
            .iter()
            .map(|v| v.as_ref())
            .filter(|v| self.accepts(v))
            .map(str::to_string)
            .collect()
    }
}

/// Partition `values`, keeping those accepted by the given terms.
pub fn filter_values<S: AsRef<str>>(
    values: &[S],
    allowed: &[&str],
    not_allowed: &[&str],
    exact: bool,
) -> Vec<String> {
    let filter = FacetFilter {
        allowed,
        not_allowed,
        mode: if exact {
            MatchMode::Exact
        } else {
            MatchMode::Substring
        },
    };
    filter.apply(values)
}

fn tokens(value: &str) -> Vec<String> {
    value.split(',').map(|t| t.trim().to_lowercase()).collect()
}
