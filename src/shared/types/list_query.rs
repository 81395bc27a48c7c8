//! Canonical list query
//!
//! `ListQuery` is the parameter set describing one page request. It is
//! produced by the list client from table state and parsed back by the list
//! endpoint; both sides agree on the wire names below.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::errors::FieldErrors;

pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "per_page";
pub const SORT_PARAM: &str = "sort";
pub const DIRECTION_PARAM: &str = "direction";
pub const FILTER_PARAM: &str = "filter";
pub const FILTER_VALUE_PARAM: &str = "filter_value";

/// Every parameter name owned by the list protocol.
pub const LIST_PARAMS: [&str; 6] = [
    PAGE_PARAM,
    PER_PAGE_PARAM,
    SORT_PARAM,
    DIRECTION_PARAM,
    FILTER_PARAM,
    FILTER_VALUE_PARAM,
];

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Parameter set for one page request.
///
/// `page` and `per_page` are always present; at most one sort and one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<Sort>,
    pub filter: Option<Filter>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            sort: None,
            filter: None,
        }
    }
}

impl ListQuery {
    /// Wire parameters in canonical order.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (PAGE_PARAM, self.page.to_string()),
            (PER_PAGE_PARAM, self.per_page.to_string()),
        ];
        if let Some(sort) = &self.sort {
            params.push((SORT_PARAM, sort.field.clone()));
            params.push((DIRECTION_PARAM, sort.direction.to_string()));
        }
        if let Some(filter) = &self.filter {
            params.push((FILTER_PARAM, filter.field.clone()));
            params.push((FILTER_VALUE_PARAM, filter.value.clone()));
        }
        params
    }
}

/// Bounds applied when resolving raw list parameters.
#[derive(Debug, Clone, Copy)]
pub struct ListLimits {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }
}

/// Raw list parameters as they arrive in a query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number (1-based). Defaults to 1; values below 1 are treated as 1
    pub page: Option<String>,
    /// Page size. Defaults to 10, capped at the configured maximum
    pub per_page: Option<String>,
    /// Column to sort by
    pub sort: Option<String>,
    /// `asc` or `desc`; only meaningful with `sort`
    pub direction: Option<String>,
    /// Column to filter on
    pub filter: Option<String>,
    /// Filter value; only meaningful with `filter`
    pub filter_value: Option<String>,
}

impl ListParams {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key {
                PAGE_PARAM => &mut params.page,
                PER_PAGE_PARAM => &mut params.per_page,
                SORT_PARAM => &mut params.sort,
                DIRECTION_PARAM => &mut params.direction,
                FILTER_PARAM => &mut params.filter,
                FILTER_VALUE_PARAM => &mut params.filter_value,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        params
    }

    /// Resolve into a canonical query.
    ///
    /// Page and page size are clamped rather than rejected. An unparseable
    /// direction is the only error raised here; column names are checked by
    /// the record-specific layer.
    pub fn resolve(&self, limits: ListLimits) -> Result<ListQuery, FieldErrors> {
        let page = parse_number(self.page.as_deref()).unwrap_or(1).max(1);
        let per_page = parse_number(self.per_page.as_deref())
            .unwrap_or(limits.default_per_page)
            .clamp(1, limits.max_per_page.max(1));

        let mut errors = FieldErrors::new();

        let sort = match non_empty(self.sort.as_deref()) {
            Some(field) => match non_empty(self.direction.as_deref()) {
                None => Some(Sort::asc(field)),
                Some(raw) => match raw.parse::<SortDirection>() {
                    Ok(direction) => Some(Sort::new(field, direction)),
                    Err(_) => {
                        errors.insert(
                            DIRECTION_PARAM.to_string(),
                            vec!["The direction must be asc or desc.".to_string()],
                        );
                        None
                    }
                },
            },
            None => None,
        };

        let filter = match (
            non_empty(self.filter.as_deref()),
            non_empty(self.filter_value.as_deref()),
        ) {
            (Some(field), Some(value)) => Some(Filter::new(field, value)),
            _ => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ListQuery {
            page,
            per_page,
            sort,
            filter,
        })
    }
}

fn parse_number(raw: Option<&str>) -> Option<u32> {
    // Negative or zero pages still mean "the first page".
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn defaults_when_nothing_is_given() {
        let query = ListParams::default().resolve(ListLimits::default()).unwrap();
        assert_eq!(query, ListQuery::default());
        assert_eq!(
            query.to_params(),
            vec![(PAGE_PARAM, "1".to_string()), (PER_PAGE_PARAM, "10".to_string())]
        );
    }

    #[test]
    fn page_below_one_and_garbage_fall_back_to_first_page() {
        for raw in ["0", "-3", "abc", ""] {
            let query = params(&[("page", raw)]).resolve(ListLimits::default()).unwrap();
            assert_eq!(query.page, 1, "page={raw}");
        }
    }

    #[test]
    fn per_page_is_clamped() {
        let limits = ListLimits::default();
        assert_eq!(params(&[("per_page", "500")]).resolve(limits).unwrap().per_page, 100);
        assert_eq!(params(&[("per_page", "0")]).resolve(limits).unwrap().per_page, 1);
        assert_eq!(params(&[("per_page", "25")]).resolve(limits).unwrap().per_page, 25);
    }

    #[test]
    fn sort_defaults_to_ascending() {
        let query = params(&[("sort", "name")]).resolve(ListLimits::default()).unwrap();
        assert_eq!(query.sort, Some(Sort::asc("name")));
    }

    #[test]
    fn direction_without_sort_is_ignored() {
        let query = params(&[("direction", "desc")]).resolve(ListLimits::default()).unwrap();
        assert_eq!(query.sort, None);
    }

    #[test]
    fn invalid_direction_is_a_field_error() {
        let errors = params(&[("sort", "name"), ("direction", "sideways")])
            .resolve(ListLimits::default())
            .unwrap_err();
        assert!(errors.contains_key("direction"));
    }

    #[test]
    fn filter_needs_a_value() {
        let query = params(&[("filter", "email"), ("filter_value", "  ")])
            .resolve(ListLimits::default())
            .unwrap();
        assert_eq!(query.filter, None);
    }

    #[test]
    fn full_query_in_canonical_order() {
        let query = params(&[
            ("filter_value", "ann"),
            ("filter", "name"),
            ("direction", "DESC"),
            ("sort", "email"),
            ("per_page", "20"),
            ("page", "2"),
        ])
        .resolve(ListLimits::default())
        .unwrap();

        let keys: Vec<_> = query.to_params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, LIST_PARAMS.to_vec());
        assert_eq!(query.sort, Some(Sort::desc("email")));
        assert_eq!(query.filter, Some(Filter::new("name", "ann")));
    }
}
