use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::store::{DataStore, Filter, Order, StoreError};

/// Postgres-backed [`DataStore`].
///
/// Every statement surfaces rows as JSON through `row_to_json`, so the rest
/// of the crate never touches sqlx row types directly.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url =
            std::env::var("DATABASE_URL").map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&url)
            .await?;

        tracing::info!("Connected to database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Identifiers are interpolated into SQL text and must stay within a strict
/// alphabet; everything else is bound as a parameter.
fn check_ident(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

fn where_clause(filter: &Filter, first_param: usize) -> Result<String, StoreError> {
    if filter.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(filter.conditions().len());
    for (i, (column, _)) in filter.conditions().iter().enumerate() {
        check_ident(column)?;
        parts.push(format!("{} = ${}", quote_ident(column), first_param + i));
    }
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

fn order_clause(order: Option<&Order>) -> Result<String, StoreError> {
    match order {
        None => Ok(String::new()),
        Some(o) => {
            check_ident(&o.column)?;
            let dir = if o.descending { "DESC" } else { "ASC" };
            Ok(format!(" ORDER BY {} {}", quote_ident(&o.column), dir))
        }
    }
}

fn row_object(row: &Value) -> Result<&Map<String, Value>, StoreError> {
    match row {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(StoreError::QueryError("empty row".to_string())),
        _ => Err(StoreError::QueryError("row must be a JSON object".to_string())),
    }
}

/// Columns usable in an INSERT: null values are omitted so the column
/// default (or SQL NULL) applies; binding a typed NULL would require knowing
/// the column's SQL type.
fn non_null_columns(map: &Map<String, Value>) -> Result<(Vec<String>, Vec<(&str, &Value)>), StoreError> {
    let mut columns = Vec::with_capacity(map.len());
    let mut params = Vec::with_capacity(map.len());
    for (column, value) in map {
        if value.is_null() {
            continue;
        }
        check_ident(column)?;
        columns.push(quote_ident(column));
        params.push((column.as_str(), value));
    }
    Ok((columns, params))
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Only id columns hold uuids; a UUID-shaped string aimed at a text column
/// (a subreddit named like a uuid, say) must stay text.
fn is_id_column(column: &str) -> bool {
    column == "id" || column.ends_with("_id")
}

/// Bind a JSON value as a typed SQL parameter for the named column.
fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    column: &str,
    v: &Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(uuid) if is_id_column(column) => q.bind(uuid),
            _ => q.bind(s.clone()),
        },
        // Arrays and objects land in jsonb columns
        other => q.bind(other.clone()),
    }
}

impl PgStore {
    async fn fetch_json_rows(
        &self,
        sql: &str,
        params: Vec<(&str, &Value)>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut q = sqlx::query(sql);
        for (column, value) in params {
            q = bind_value(q, column, value);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| r.try_get::<Value, _>("row").map_err(StoreError::from))
            .collect()
    }

    async fn fetch_json_optional(
        &self,
        sql: &str,
        params: Vec<(&str, &Value)>,
    ) -> Result<Option<Value>, StoreError> {
        let mut q = sqlx::query(sql);
        for (column, value) in params {
            q = bind_value(q, column, value);
        }
        match q.fetch_optional(&self.pool).await? {
            Some(r) => Ok(Some(r.try_get::<Value, _>("row")?)),
            None => Ok(None),
        }
    }
}

fn filter_params(filter: &Filter) -> Vec<(&str, &Value)> {
    filter
        .conditions()
        .iter()
        .map(|(c, v)| (c.as_str(), v))
        .collect()
}

#[async_trait]
impl DataStore for PgStore {
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Value>, StoreError> {
        check_ident(table)?;
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {}{}{}) t",
            quote_ident(table),
            where_clause(filter, 1)?,
            order_clause(order)?,
        );
        self.fetch_json_rows(&sql, filter_params(filter)).await
    }

    async fn select_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        check_ident(table)?;
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {}{} LIMIT 1) t",
            quote_ident(table),
            where_clause(filter, 1)?,
        );
        self.fetch_json_optional(&sql, filter_params(filter)).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        check_ident(table)?;
        let map = row_object(&row)?;
        let (columns, params) = non_null_columns(map)?;

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} AS t DEFAULT VALUES RETURNING row_to_json(t) AS row",
                quote_ident(table),
            )
        } else {
            format!(
                "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING row_to_json(t) AS row",
                quote_ident(table),
                columns.join(", "),
                placeholders(params.len()),
            )
        };

        self.fetch_json_optional(&sql, params)
            .await?
            .ok_or_else(|| StoreError::QueryError("insert returned no row".to_string()))
    }

    async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        check_ident(table)?;
        let map = row_object(&patch)?;

        let mut sets = Vec::with_capacity(map.len());
        let mut params = Vec::with_capacity(map.len() + filter.conditions().len());
        for (i, (column, value)) in map.iter().enumerate() {
            check_ident(column)?;
            sets.push(format!("{} = ${}", quote_ident(column), i + 1));
            params.push((column.as_str(), value));
        }
        params.extend(filter_params(filter));

        let sql = format!(
            "UPDATE {} AS t SET {}{} RETURNING row_to_json(t) AS row",
            quote_ident(table),
            sets.join(", "),
            where_clause(filter, map.len() + 1)?,
        );

        self.fetch_json_optional(&sql, params).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        check_ident(table)?;
        let sql = format!(
            "DELETE FROM {}{}",
            quote_ident(table),
            where_clause(filter, 1)?,
        );
        let mut q = sqlx::query(&sql);
        for (column, value) in filter.conditions() {
            q = bind_value(q, column, value);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn upsert(
        &self,
        table: &str,
        row: Value,
        conflict_keys: &[&str],
    ) -> Result<Value, StoreError> {
        check_ident(table)?;
        let map = row_object(&row)?;
        for key in conflict_keys {
            check_ident(key)?;
            if map.get(*key).map_or(true, Value::is_null) {
                return Err(StoreError::QueryError(format!(
                    "upsert key {} must be present and non-null",
                    key
                )));
            }
        }

        let (columns, params) = non_null_columns(map)?;
        let updates: Vec<String> = params
            .iter()
            .filter(|(column, _)| !conflict_keys.contains(column))
            .map(|(column, _)| {
                format!("{} = EXCLUDED.{}", quote_ident(column), quote_ident(column))
            })
            .collect();

        let conflict_cols = conflict_keys
            .iter()
            .map(|k| quote_ident(k))
            .collect::<Vec<_>>()
            .join(", ");

        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let sql = format!(
            "INSERT INTO {} AS t ({}) VALUES ({}) ON CONFLICT ({}) {} RETURNING row_to_json(t) AS row",
            quote_ident(table),
            columns.join(", "),
            placeholders(params.len()),
            conflict_cols,
            action,
        );

        if let Some(returned) = self.fetch_json_optional(&sql, params).await? {
            return Ok(returned);
        }

        // DO NOTHING on conflict returns no row; the existing one satisfies
        // the at-most-one-per-key invariant, so fetch it.
        let mut filter = Filter::new();
        for key in conflict_keys {
            let value = map.get(*key).cloned().unwrap_or(Value::Null);
            filter = filter.eq(*key, value);
        }
        self.select_one(table, &filter)
            .await?
            .ok_or_else(|| StoreError::QueryError("upsert returned no row".to_string()))
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn idents_reject_quoting_escapes() {
        assert!(check_ident("post_votes").is_ok());
        assert!(check_ident("a\"; DROP TABLE posts; --").is_err());
        assert!(check_ident("").is_err());
        assert!(check_ident("Posts").is_err());
    }

    #[test]
    fn where_clause_numbers_params_from_offset() {
        let filter = Filter::new().eq("user_id", "u").eq("post_id", "p");
        let clause = where_clause(&filter, 3).unwrap();
        assert_eq!(clause, " WHERE \"user_id\" = $3 AND \"post_id\" = $4");
    }

    #[test]
    fn order_clause_directions() {
        assert_eq!(
            order_clause(Some(&Order::desc("created_at"))).unwrap(),
            " ORDER BY \"created_at\" DESC"
        );
        assert_eq!(order_clause(None).unwrap(), "");
    }

    #[test]
    fn null_columns_are_left_to_their_defaults() {
        // A top-level comment carries parent_id: null; the column must not
        // appear in the statement at all, since a bound NULL would carry the
        // wrong parameter type for a uuid column.
        let row = json!({
            "post_id": "p",
            "content": "hi",
            "parent_id": null,
            "media_urls": null,
        });
        let map = row.as_object().unwrap();
        let (columns, params) = non_null_columns(map).unwrap();

        assert!(columns.contains(&"\"content\"".to_string()));
        assert!(columns.contains(&"\"post_id\"".to_string()));
        assert!(!columns.contains(&"\"parent_id\"".to_string()));
        assert!(!columns.contains(&"\"media_urls\"".to_string()));
        assert_eq!(columns.len(), params.len());
    }

    #[test]
    fn uuid_coercion_applies_to_id_columns_only() {
        assert!(is_id_column("id"));
        assert!(is_id_column("post_id"));
        assert!(is_id_column("subreddit_id"));
        assert!(!is_id_column("name"));
        assert!(!is_id_column("title"));
        assert!(!is_id_column("identity"));
    }
}
