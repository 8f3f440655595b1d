//! In-memory store and request helpers for unit tests. The router tests run
//! entirely against [`MemStore`]; no live database is involved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::config::AppConfig;
use crate::state::AppState;
use crate::store::{tables, DataStore, Filter, Order, StoreError};

pub const TEST_SECRET: &str = "unit-test-secret";

/// In-memory [`DataStore`] with the same insert defaults Postgres supplies
/// (generated id, created_at).
#[derive(Default)]
pub struct MemStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing the trait (test seeding)
    pub fn seed(&self, table: &str, row: Value) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_default()
            .push(with_defaults(row));
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn with_defaults(row: Value) -> Value {
    let mut map = match row {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
    map.entry("created_at")
        .or_insert_with(|| json!(chrono::Utc::now()));
    Value::Object(map)
}

fn matches(row: &Value, filter: &Filter) -> bool {
    filter
        .conditions()
        .iter()
        .all(|(column, value)| row.get(column) == Some(value))
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Value::Object(row), Value::Object(patch)) = (row, patch) {
        for (key, value) in patch {
            row.insert(key.clone(), value.clone());
        }
    }
}

fn compare(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DataStore for MemStore {
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| matches(row, filter))
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        Ok(rows)
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        Ok(self
            .rows(table)
            .into_iter()
            .find(|row| matches(row, filter)))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let row = with_defaults(row);
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let mut first = None;
        for row in rows.iter_mut() {
            if matches(row, filter) {
                merge(row, &patch);
                if first.is_none() {
                    first = Some(row.clone());
                }
            }
        }
        Ok(first)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !matches(row, filter));
        Ok((before - rows.len()) as u64)
    }

    async fn upsert(
        &self,
        table: &str,
        row: Value,
        conflict_keys: &[&str],
    ) -> Result<Value, StoreError> {
        let key_filter = conflict_keys.iter().fold(Filter::new(), |filter, key| {
            filter.eq(*key, row.get(*key).cloned().unwrap_or(Value::Null))
        });

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        for existing in rows.iter_mut() {
            if matches(existing, &key_filter) {
                merge(existing, &row);
                return Ok(existing.clone());
            }
        }
        let row = with_defaults(row);
        rows.push(row.clone());
        Ok(row)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// App state wired to a fresh MemStore and the test JWT secret
pub fn test_state() -> (AppState, Arc<MemStore>) {
    let store = Arc::new(MemStore::new());
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    (AppState::new(store.clone(), config), store)
}

/// Bearer token for a user, signed with the test secret
pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, Some("user@example.com".to_string()), None, 1);
    generate_jwt(&claims, TEST_SECRET).unwrap()
}

/// Seed a profile row and return its id
pub fn seed_user(store: &MemStore, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    store.seed(
        tables::PROFILES,
        json!({ "id": id, "username": username, "bio": null, "avatar_url": null }),
    );
    id
}

/// Seed the static role catalog (ids match schema.sql)
pub fn seed_role_catalog(store: &MemStore) {
    for (id, name) in [(1, "admin"), (2, "mod"), (3, "member"), (4, "owner")] {
        store.seed(tables::ROLES, json!({ "id": id, "name": name }));
    }
}

/// Assign a platform role directly
pub fn grant_role(store: &MemStore, user_id: Uuid, role_id: i32) {
    store.seed(
        tables::USER_ROLES,
        json!({ "user_id": user_id, "role_id": role_id }),
    );
}

/// Drive one request through the router and decode the JSON response
pub async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
