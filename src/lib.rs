//! Cursor-paginated GraphQL client.
//!
//! This crate provides:
//! - A small HTTP transport for GraphQL POST requests.
//! - Bounded-attempt retry with backoff for transient transport failures.
//! - Connection discovery inside schema-less response trees.
//! - A pagination driver that follows `pageInfo` cursors to exhaustion.
//! - Per-request rate limit telemetry.
//!
//! Response trees are plain [`serde_json::Value`]s: the client needs no
//! schema beyond the `pageInfo`/`nodes`/`edges` connection shape and the
//! top-level `errors` marker.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

mod client;
mod connection;
mod error;
mod operation;
mod paginate;
mod rate_limit;
mod retry;

pub use client::{
    DEFAULT_TIMEOUT, GraphqlClient, GraphqlClientBuilder, GraphqlClientConfig,
    GraphqlClientMetrics, GraphqlClientMetricsSnapshot,
};
pub use connection::{Connection, PageInfo, find_connection, find_connection_named};
pub use error::{
    GraphqlClientError, GraphqlError, GraphqlErrorLocation, GraphqlPathSegment, HttpErrorInfo,
};
pub use operation::{GraphqlQuery, GraphqlRequest, GraphqlResponse, Variables};
pub use paginate::{CURSOR_VARIABLE, DEFAULT_PAGE_SIZE, PAGE_SIZE_VARIABLE, PageOptions};
pub use rate_limit::RateLimit;
pub use retry::{RetryDecision, RetryPolicy};
