//! Pagination driver: repeated query/locate/accumulate cycles.

use serde_json::Value;
use tracing::debug;

use crate::client::GraphqlClient;
use crate::connection::{Connection, PageInfo, find_connection, find_connection_named};
use crate::error::GraphqlClientError;
use crate::operation::Variables;
use crate::rate_limit::RateLimit;

/// Default page size requested per round trip.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Variable name carrying the page size.
pub const PAGE_SIZE_VARIABLE: &str = "page_size";

/// Variable name carrying the continuation cursor.
pub const CURSOR_VARIABLE: &str = "page_after";

/// Pagination options.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Page size requested per round trip.
    pub page_size: u32,
    /// Node-type name for targeted connection lookup. When unset the
    /// locator walks the tree for the first `pageInfo` it finds.
    pub node_type: Option<String>,
    /// Stop once the cumulative item count reaches this ceiling.
    pub max_items: Option<usize>,
    /// Name of the page-size variable in the query document.
    pub page_size_variable: String,
    /// Name of the cursor variable in the query document.
    pub cursor_variable: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            node_type: None,
            max_items: None,
            page_size_variable: PAGE_SIZE_VARIABLE.to_string(),
            cursor_variable: CURSOR_VARIABLE.to_string(),
        }
    }
}

impl PageOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Locate the connection by node-type name instead of walking for
    /// `pageInfo`.
    #[must_use]
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Cap the cumulative number of fetched items.
    #[must_use]
    pub const fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }
}

fn locate<'a>(
    data: &'a Value,
    node_type: Option<&str>,
) -> Result<Connection<'a>, GraphqlClientError> {
    match node_type {
        Some(name) => find_connection_named(data, name),
        None => Ok(find_connection(data)),
    }
}

impl GraphqlClient {
    /// Fetch every page of a paginated query.
    ///
    /// Round trips are issued strictly sequentially: each request's cursor
    /// comes from the previous response. Rate limit records are logged at
    /// debug level; use [`GraphqlClient::paginate_observed`] to receive
    /// them instead. Returns the accumulated data trees in fetch order. On
    /// a permanent error the whole call fails; no partial result is
    /// returned.
    pub async fn paginate(
        &self,
        query: &str,
        variables: Variables,
        options: &PageOptions,
    ) -> Result<Vec<Value>, GraphqlClientError> {
        self.paginate_observed(query, variables, options, |rate_limit| {
            debug!(%rate_limit, "rate limit");
        })
        .await
    }

    /// Fetch every page of a paginated query, reporting the rate limit of
    /// each round trip to `observe`.
    pub async fn paginate_observed<F>(
        &self,
        query: &str,
        variables: Variables,
        options: &PageOptions,
        mut observe: F,
    ) -> Result<Vec<Value>, GraphqlClientError>
    where
        F: FnMut(&RateLimit),
    {
        // Seed the page-size and cursor variables; caller-supplied values
        // win on conflict.
        let mut vars = Variables::new();
        vars.insert(
            options.page_size_variable.clone(),
            Value::from(options.page_size),
        );
        vars.insert(
            options.cursor_variable.clone(),
            Value::String(String::new()),
        );
        vars.extend(variables);

        let mut pages = Vec::new();
        let mut total_items = 0_usize;
        loop {
            let mut data = self.execute_data(query, &vars).await?;
            let rate_limit = RateLimit::take(&mut data);
            observe(&rate_limit);

            let (page_info, item_count) = {
                let Connection { page_info, items } = locate(&data, options.node_type.as_deref())?;
                (page_info, items.len())
            };
            debug!(
                page = pages.len() + 1,
                items = item_count,
                has_next_page = page_info.has_next_page,
                "fetched page"
            );
            pages.push(data);
            total_items += item_count;

            if !more_pages(&page_info, item_count, total_items, options.max_items) {
                break;
            }
            vars.insert(
                options.cursor_variable.clone(),
                Value::String(page_info.end_cursor),
            );
        }

        Ok(pages)
    }
}

/// Termination policy: continue only while the page had items, the server
/// reported another page, and the optional item ceiling is not reached.
fn more_pages(
    page_info: &PageInfo,
    item_count: usize,
    total_items: usize,
    max_items: Option<usize>,
) -> bool {
    if item_count == 0 || !page_info.has_next_page {
        return false;
    }
    max_items.map_or(true, |max| total_items < max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_info(has_next_page: bool) -> PageInfo {
        PageInfo {
            end_cursor: "c".to_string(),
            start_cursor: String::new(),
            has_previous_page: false,
            has_next_page,
        }
    }

    #[test]
    fn test_empty_page_short_circuits() {
        assert!(!more_pages(&page_info(true), 0, 0, None));
    }

    #[test]
    fn test_last_page_stops() {
        assert!(!more_pages(&page_info(false), 4, 4, None));
    }

    #[test]
    fn test_item_ceiling_stops_at_or_past_limit() {
        assert!(more_pages(&page_info(true), 4, 8, Some(10)));
        assert!(!more_pages(&page_info(true), 4, 12, Some(10)));
        assert!(!more_pages(&page_info(true), 5, 10, Some(10)));
    }

    #[test]
    fn test_no_ceiling_continues() {
        assert!(more_pages(&page_info(true), 4, 4000, None));
    }
}
