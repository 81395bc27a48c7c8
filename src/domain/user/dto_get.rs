use std::str::FromStr;

use crate::domain::{DomainError, DomainResult, FieldErrors};
use crate::shared::{
    ListQuery, SortDirection, FILTER_PARAM, FILTER_VALUE_PARAM, SORT_PARAM,
};

use super::{UserRole, UserStatus};

/// Columns the user list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Id,
    Name,
    Email,
    PhoneNumber,
    Role,
    Status,
    CreatedAt,
}

impl FromStr for UserColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "phone_number" => Ok(Self::PhoneNumber),
            "role" => Ok(Self::Role),
            "status" => Ok(Self::Status),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(format!("unknown column '{}'", other)),
        }
    }
}

/// Filter predicate on one column.
///
/// Text columns match by case-insensitive substring, enum columns exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Name(String),
    Email(String),
    PhoneNumber(String),
    Role(UserRole),
    Status(UserStatus),
}

/// Typed user list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserDto {
    pub page: u32,
    pub per_page: u32,
    /// `None` means newest first
    pub sort: Option<(UserColumn, SortDirection)>,
    pub filter: Option<UserFilter>,
}

impl GetUserDto {
    /// Map a canonical list query onto user columns.
    ///
    /// Unknown sort/filter columns and unknown enum values are rejected
    /// with field errors on the offending parameter.
    pub fn from_query(query: &ListQuery) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();

        let sort = match &query.sort {
            Some(sort) => match sort.field.parse::<UserColumn>() {
                Ok(column) => Some((column, sort.direction)),
                Err(_) => {
                    errors.insert(
                        SORT_PARAM.to_string(),
                        vec![format!("The list cannot be sorted by '{}'.", sort.field)],
                    );
                    None
                }
            },
            None => None,
        };

        let filter = match &query.filter {
            Some(filter) => {
                let value = filter.value.clone();
                let parsed = match filter.field.as_str() {
                    "name" => Ok(UserFilter::Name(value)),
                    "email" => Ok(UserFilter::Email(value)),
                    "phone_number" => Ok(UserFilter::PhoneNumber(value)),
                    "role" => value
                        .parse()
                        .map(UserFilter::Role)
                        .map_err(|_| (FILTER_VALUE_PARAM, "The selected role is invalid.".to_string())),
                    "status" => value
                        .parse()
                        .map(UserFilter::Status)
                        .map_err(|_| (FILTER_VALUE_PARAM, "The selected status is invalid.".to_string())),
                    other => Err((
                        FILTER_PARAM,
                        format!("The list cannot be filtered by '{}'.", other),
                    )),
                };
                match parsed {
                    Ok(filter) => Some(filter),
                    Err((field, message)) => {
                        errors.insert(field.to_string(), vec![message]);
                        None
                    }
                }
            }
            None => None,
        };

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        Ok(Self {
            page: query.page,
            per_page: query.per_page,
            sort,
            filter,
        })
    }
}
