//! List request shape and the settings that constrain it

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Sentinel filter key meaning "no filter".
pub const ALL_FILTER: &str = "All";

/// Default quiet period before a search/filter change is fetched.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Page number (1-indexed)
    pub page: u32,
    /// Rows per page, one of [`ListSettings::page_sizes`]
    pub page_size: u32,
    /// Raw search input as typed; trimmed when sent
    pub search: String,
    /// Role filter key, `None` for "All"
    pub filter: Option<String>,
    /// Account status filter key, `None` for "All"
    pub status: Option<String>,
}

impl ListQuery {
    /// First page with no search or filters.
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            search: String::new(),
            filter: None,
            status: None,
        }
    }

    /// Search term as sent to the server. Blank input counts as absent.
    pub fn search_term(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Label of the active role filter ("All" when unset).
    pub fn filter_label(&self) -> &str {
        self.filter.as_deref().unwrap_or(ALL_FILTER)
    }

    /// Label of the active status filter ("All" when unset).
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or(ALL_FILTER)
    }

    /// Wire parameters for the list endpoint.
    ///
    /// `page` and `limit` are always present; `search`, `role` and `status`
    /// only when set. Filter keys are lower-cased.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(term) = self.search_term() {
            params.push(("search", term.to_string()));
        }
        if let Some(role) = &self.filter {
            params.push(("role", role.to_lowercase()));
        }
        if let Some(status) = &self.status {
            params.push(("status", status.to_lowercase()));
        }
        params
    }
}

/// Allowed values and timings for a paginated list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSettings {
    pub page_sizes: Vec<u32>,
    pub default_page_size: u32,
    pub quiet_period: Duration,
    /// Role filter keys
    pub filter_keys: Vec<String>,
    /// Account status filter keys
    pub status_keys: Vec<String>,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_sizes: vec![5, 10],
            default_page_size: 10,
            quiet_period: DEFAULT_QUIET_PERIOD,
            filter_keys: ["user", "admin", "staff", "manager"]
                .into_iter()
                .map(String::from)
                .collect(),
            status_keys: ["active", "inactive"].into_iter().map(String::from).collect(),
        }
    }
}

impl ListSettings {
    /// Query a freshly mounted view starts from.
    pub fn initial_query(&self) -> ListQuery {
        ListQuery::first_page(self.default_page_size)
    }

    pub fn check_page_size(&self, size: u32) -> Result<u32, ControlError> {
        if self.page_sizes.contains(&size) {
            Ok(size)
        } else {
            Err(ControlError::InvalidPageSize {
                size,
                allowed: self.page_sizes.clone(),
            })
        }
    }

    /// Resolve a role filter key. `Ok(None)` is the "All" sentinel.
    pub fn resolve_filter(&self, key: &str) -> Result<Option<String>, ControlError> {
        resolve_key(&self.filter_keys, key)
    }

    /// Resolve an account status key. `Ok(None)` is the "All" sentinel.
    pub fn resolve_status(&self, key: &str) -> Result<Option<String>, ControlError> {
        resolve_key(&self.status_keys, key)
    }

    /// Page size following `current` in the allowed set, wrapping around.
    pub fn next_page_size(&self, current: u32) -> u32 {
        cycle(&self.page_sizes, &current, 1).unwrap_or(current)
    }

    /// Page size preceding `current` in the allowed set, wrapping around.
    pub fn prev_page_size(&self, current: u32) -> u32 {
        cycle(&self.page_sizes, &current, self.page_sizes.len().saturating_sub(1))
            .unwrap_or(current)
    }
}

fn resolve_key(keys: &[String], key: &str) -> Result<Option<String>, ControlError> {
    let key = key.trim();
    if key.is_empty() || key.eq_ignore_ascii_case(ALL_FILTER) {
        return Ok(None);
    }
    keys.iter()
        .find(|k| k.eq_ignore_ascii_case(key))
        .map(|k| Some(k.clone()))
        .ok_or_else(|| ControlError::UnknownFilter(key.to_string()))
}

fn cycle<T: PartialEq + Clone>(values: &[T], current: &T, step: usize) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let idx = values.iter().position(|v| v == current).unwrap_or(0);
    values.get((idx + step) % values.len()).cloned()
}

/// Cycle through `None` ("All") and each key in order.
pub fn next_filter(keys: &[String], current: Option<&str>) -> Option<String> {
    match current {
        None => keys.first().cloned(),
        Some(cur) => {
            let idx = keys.iter().position(|k| k == cur)?;
            keys.get(idx + 1).cloned()
        }
    }
}
