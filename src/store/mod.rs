use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod postgres;

/// Errors from the data store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Table names the API operates on
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const ROLES: &str = "roles";
    pub const USER_ROLES: &str = "user_roles";
    pub const SUBREDDITS: &str = "subreddits";
    pub const SUB_MEMBERS: &str = "sub_members";
    pub const POSTS: &str = "posts";
    pub const POST_VOTES: &str = "post_votes";
    pub const COMMENTS: &str = "comments";
    pub const COMMENT_VOTES: &str = "comment_votes";
}

/// Exact-match filter over table columns
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Single-column ordering
#[derive(Debug, Clone)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Narrow per-table query interface over the external store.
///
/// Rows cross this boundary as JSON objects and are decoded into typed
/// records exactly once, at the call site, via [`decode_row`]/[`decode_rows`].
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>, StoreError>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    /// Applies `patch` to all rows matching `filter`; returns the first
    /// updated row, if any.
    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<Option<Value>, StoreError>;

    /// Deletes matching rows; returns the number removed.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert-or-update keyed by `conflict_keys`; at most one row per key set.
    async fn upsert(
        &self,
        table: &str,
        row: Value,
        conflict_keys: &[&str],
    ) -> Result<Value, StoreError>;

    /// Store connectivity check for the health endpoint
    async fn health(&self) -> Result<(), StoreError>;
}

/// Decode a raw store row into a typed record
pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Decode a batch of raw store rows into typed records
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode_row).collect()
}
