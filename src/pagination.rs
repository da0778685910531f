//! Pagination over a query-like object
//!
//! [`Page::load`] evaluates a [`PageQuery`]'s total row count once,
//! computes the page count, and fetches the slice for the requested page.
//! [`Page::json_response`] renders the slice through the response envelope
//! as `{"result": [...], "pagination": {page, per_page, pages, count}}`,
//! serializing each item through its [`JsonRecord`] contract.
//!
//! # Example
//!
//! ```rust,no_run
//! use restglue::prelude::*;
//! # use restglue::pagination::PageQuery;
//! # struct ItemQuery;
//! # struct Item;
//! # impl JsonRecord for Item {
//! #     fn fields(&self) -> &'static [FieldDef] { &[] }
//! #     fn field(&self, _: &str) -> Option<FieldValue> { None }
//! # }
//! # #[async_trait]
//! # impl PageQuery for ItemQuery {
//! #     type Item = Item;
//! #     async fn count(&self) -> Result<u64, ApiError> { Ok(0) }
//! #     async fn fetch(&self, _: u64, _: u64) -> Result<Vec<Item>, ApiError> { Ok(vec![]) }
//! # }
//!
//! async fn list_items(
//!     Query(params): Query<PageParams>,
//! ) -> Result<PageResponse, ApiError> {
//!     let query = ItemQuery;
//!     let page = Page::load(&query, &params).await?;
//!     Ok(page.json_response())
//! }
//! ```

use async_trait::async_trait;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PaginationConfig;
use crate::response::ApiError;
use crate::serialize::JsonRecord;

/// Items per page when neither the request nor the configuration says
pub const DEFAULT_PER_PAGE: u64 = 20;

/// A countable, sliceable source of records
///
/// The Rust rendering of a query object exposing count / offset / limit /
/// materialize.
#[async_trait]
pub trait PageQuery: Send + Sync {
    /// The record type produced by the query
    type Item;

    /// Total number of matching rows
    async fn count(&self) -> Result<u64, ApiError>;

    /// Materialize `limit` rows starting at `offset`
    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<Self::Item>, ApiError>;
}

/// Page selection parameters, usually extracted from the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// Requested page, 1-indexed
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page; falls back to [`DEFAULT_PER_PAGE`] or the
    /// configured default when absent
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: None,
        }
    }
}

impl PageParams {
    /// The effective per-page value
    #[must_use]
    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1)
    }

    /// The effective per-page value, preferring the configured default
    #[must_use]
    pub fn per_page_or(&self, config: &PaginationConfig) -> u64 {
        self.per_page.unwrap_or(config.default_per_page).max(1)
    }
}

fn default_page() -> u64 {
    1
}

/// One page of records plus derived metadata, computed fresh per request
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Requested page, 1-indexed
    pub page: u64,
    /// Items per page used for the slice
    pub per_page: u64,
    /// Total matching rows
    pub count: u64,
    /// Total pages; at least 1 even for an empty result set
    pub pages: u64,
    /// The records on this page
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Load a page using [`DEFAULT_PER_PAGE`] as the fallback page size
    pub async fn load<Q>(query: &Q, params: &PageParams) -> Result<Self, ApiError>
    where
        Q: PageQuery<Item = T>,
    {
        Self::load_sized(query, params.page, params.per_page()).await
    }

    /// Load a page using the configured default page size
    pub async fn load_with<Q>(
        query: &Q,
        params: &PageParams,
        config: &PaginationConfig,
    ) -> Result<Self, ApiError>
    where
        Q: PageQuery<Item = T>,
    {
        Self::load_sized(query, params.page, params.per_page_or(config)).await
    }

    async fn load_sized<Q>(query: &Q, page: u64, per_page: u64) -> Result<Self, ApiError>
    where
        Q: PageQuery<Item = T>,
    {
        let page = page.max(1);
        let count = query.count().await?;
        let pages = total_pages(count, per_page);
        let offset = (page - 1).saturating_mul(per_page);
        let items = query.fetch(offset, per_page).await?;

        Ok(Self {
            page,
            per_page,
            count,
            pages,
            items,
        })
    }

    /// The derived pagination metadata
    #[must_use]
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
            count: self.count,
        }
    }
}

impl<T: JsonRecord> Page<T> {
    /// Render the page through the response envelope
    #[must_use]
    pub fn json_response(&self) -> PageResponse {
        PageResponse {
            result: self
                .items
                .iter()
                .map(|item| Value::Object(item.to_json()))
                .collect(),
            pagination: self.meta(),
        }
    }
}

/// Ceiling division, clamped so an empty result set still has one page
fn total_pages(count: u64, per_page: u64) -> u64 {
    let per_page = per_page.max(1);
    (count.saturating_add(per_page - 1) / per_page).max(1)
}

/// Pagination metadata carried next to the result array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Requested page, 1-indexed
    pub page: u64,
    /// Items per page
    pub per_page: u64,
    /// Total pages
    pub pages: u64,
    /// Total matching rows
    pub count: u64,
}

/// The paginated envelope: `{"result": [...], "pagination": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Serialized records for the requested page
    pub result: Vec<Value>,
    /// Derived pagination metadata
    pub pagination: PageMeta,
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{FieldDef, FieldValue};
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct Row {
        index: u64,
    }

    impl JsonRecord for Row {
        fn fields(&self) -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[FieldDef::scalar("index")];
            FIELDS
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "index" => Some(json!(self.index).into()),
                _ => None,
            }
        }
    }

    struct VecQuery {
        rows: Vec<Row>,
    }

    impl VecQuery {
        fn with_rows(n: u64) -> Self {
            Self {
                rows: (0..n).map(|index| Row { index }).collect(),
            }
        }
    }

    #[async_trait]
    impl PageQuery for VecQuery {
        type Item = Row;

        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.rows.len() as u64)
        }

        async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<Row>, ApiError> {
            Ok(self
                .rows
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    fn params(page: u64, per_page: u64) -> PageParams {
        PageParams {
            page,
            per_page: Some(per_page),
        }
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(105, 25), 5);
        assert_eq!(total_pages(105, 10), 11);
        assert_eq!(total_pages(100, 10), 10);
        assert_eq!(total_pages(1, 20), 1);
        // Empty result sets still expose one (empty) page.
        assert_eq!(total_pages(0, 20), 1);
    }

    #[tokio::test]
    async fn test_page_counts() {
        let query = VecQuery::with_rows(105);

        let page = Page::load(&query, &params(1, 25)).await.unwrap();
        assert_eq!(page.count, 105);
        assert_eq!(page.pages, 5);
        assert_eq!(page.items.len(), 25);

        let page = Page::load(&query, &params(1, 10)).await.unwrap();
        assert_eq!(page.pages, 11);
    }

    #[tokio::test]
    async fn test_second_page_slice() {
        let query = VecQuery::with_rows(105);
        let page = Page::load(&query, &params(2, 10)).await.unwrap();

        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items.first().unwrap().index, 10);
        assert_eq!(page.items.last().unwrap().index, 19);
    }

    #[tokio::test]
    async fn test_json_response_shape() {
        let query = VecQuery::with_rows(105);
        let page = Page::load(&query, &params(2, 10)).await.unwrap();
        let response = page.json_response();

        assert_eq!(response.result.len(), 10);
        assert_eq!(response.pagination.pages, 11);
        assert_eq!(response.pagination.page, 2);
        assert_eq!(response.pagination.per_page, 10);
        assert_eq!(response.pagination.count, 105);

        let value = serde_json::to_value(&response).unwrap();
        let body = value.as_object().unwrap();
        assert_eq!(body.len(), 2);
        assert!(body.contains_key("result"));
        assert!(body.contains_key("pagination"));
    }

    #[tokio::test]
    async fn test_empty_query_still_has_one_page() {
        let query = VecQuery::with_rows(0);
        let page = Page::load(&query, &PageParams::default()).await.unwrap();

        assert_eq!(page.count, 0);
        assert_eq!(page.pages, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_page_clamped_to_one() {
        let query = VecQuery::with_rows(5);
        let page = Page::load(&query, &params(0, 10)).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 5);
    }

    #[tokio::test]
    async fn test_huge_page_number_does_not_overflow() {
        let query = VecQuery::with_rows(5);
        // Page numbers come straight off the query string; the offset must
        // saturate instead of wrapping.
        let page = Page::load(&query, &params(u64::MAX, 20)).await.unwrap();

        assert_eq!(page.page, u64::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.pages, 1);
    }

    #[tokio::test]
    async fn test_configured_default_per_page() {
        let query = VecQuery::with_rows(105);
        let config = PaginationConfig {
            default_per_page: 25,
        };
        let page = Page::load_with(&query, &PageParams::default(), &config)
            .await
            .unwrap();

        assert_eq!(page.per_page, 25);
        assert_eq!(page.pages, 5);
    }

    #[test]
    fn test_params_defaults() {
        let params: PageParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);

        let params: PageParams = serde_json::from_value(json!({ "page": 3, "per_page": 5 })).unwrap();
        assert_eq!(params.page, 3);
        assert_eq!(params.per_page(), 5);
    }
}
