//! Generic parameterized access to relational tables.
//!
//! Queries are written with named placeholders (`:product_id`) and executed
//! with a slice of `(name, value)` pairs. Each value is bound with a type
//! inferred from its JSON shape, see [`BindType`].

use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, FromQueryResult, JsonValue,
    Statement, Value,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Map;
use thiserror::Error;

pub type Row = Map<String, JsonValue>;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("No value supplied for query parameter `{0}`")]
    MissingParam(String),
    #[error("Query parameter `{0}` is not used by the statement")]
    UnusedParam(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("Failed to map row: {0}")]
    Mapping(#[from] serde_json::Error),
}

/// How a runtime value travels to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindType {
    Bool,
    Int,
    Str,
    Null,
}

impl BindType {
    pub fn of(value: &JsonValue) -> BindType {
        match value {
            JsonValue::Bool(_) => BindType::Bool,
            JsonValue::Number(n) if n.is_i64() => BindType::Int,
            JsonValue::Null => BindType::Null,
            // decimals, oversized integers, strings and composites go as text
            _ => BindType::Str,
        }
    }
}

pub fn bind_value(value: &JsonValue) -> Value {
    match (BindType::of(value), value) {
        (BindType::Bool, JsonValue::Bool(b)) => Value::from(*b),
        (BindType::Int, JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => Value::from(n.to_string()),
        },
        (BindType::Null, _) => Value::String(None),
        (_, JsonValue::String(s)) => Value::from(s.clone()),
        (_, other) => Value::from(other.to_string()),
    }
}

/// Rewrites `:name` placeholders into the backend's positional form and
/// collects the bound values in placeholder order.
pub fn prepare(
    backend: DatabaseBackend,
    sql: &str,
    params: &[(&str, JsonValue)],
) -> Result<Statement, TableError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut used = HashSet::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            ':' if i + 1 < chars.len() && chars[i + 1] == ':' => {
                out.push_str("::");
                i += 2;
            }
            ':' if i + 1 < chars.len() && is_ident_start(chars[i + 1]) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = params
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value)
                    .ok_or_else(|| TableError::MissingParam(name.clone()))?;

                values.push(bind_value(value));
                match backend {
                    DatabaseBackend::Postgres => out.push_str(&format!("${}", values.len())),
                    _ => out.push('?'),
                }
                used.insert(name);
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    if let Some((name, _)) = params.iter().find(|(name, _)| !used.contains(*name)) {
        return Err(TableError::UnusedParam(name.to_string()));
    }

    Ok(Statement::from_sql_and_values(backend, out, values))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Shared entry point for DAOs. Holds the pooled connection; the `*_on`
/// variants run against any connection, including an open transaction.
#[derive(Clone)]
pub struct Table {
    db: Arc<DatabaseConnection>,
}

impl Table {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn fetch_all(
        &self,
        sql: &str,
        params: &[(&str, JsonValue)],
    ) -> Result<Vec<Row>, TableError> {
        Self::fetch_all_on(&*self.db, sql, params).await
    }

    pub async fn fetch_one(
        &self,
        sql: &str,
        params: &[(&str, JsonValue)],
    ) -> Result<Option<Row>, TableError> {
        Self::fetch_one_on(&*self.db, sql, params).await
    }

    pub async fn execute_non_query(
        &self,
        sql: &str,
        params: &[(&str, JsonValue)],
    ) -> Result<u64, TableError> {
        Self::execute_non_query_on(&*self.db, sql, params).await
    }

    pub async fn fetch_all_on<C: ConnectionTrait>(
        conn: &C,
        sql: &str,
        params: &[(&str, JsonValue)],
    ) -> Result<Vec<Row>, TableError> {
        let stmt = prepare(conn.get_database_backend(), sql, params)?;
        let rows = JsonValue::find_by_statement(stmt).all(conn).await?;
        Ok(rows.into_iter().filter_map(into_row).collect())
    }

    pub async fn fetch_one_on<C: ConnectionTrait>(
        conn: &C,
        sql: &str,
        params: &[(&str, JsonValue)],
    ) -> Result<Option<Row>, TableError> {
        let stmt = prepare(conn.get_database_backend(), sql, params)?;
        let row = JsonValue::find_by_statement(stmt).one(conn).await?;
        Ok(row.and_then(into_row))
    }

    /// Returns the number of affected rows; callers treat `> 0` as success.
    pub async fn execute_non_query_on<C: ConnectionTrait>(
        conn: &C,
        sql: &str,
        params: &[(&str, JsonValue)],
    ) -> Result<u64, TableError> {
        let stmt = prepare(conn.get_database_backend(), sql, params)?;
        let result = conn.execute(stmt).await?;
        Ok(result.rows_affected())
    }
}

fn into_row(value: JsonValue) -> Option<Row> {
    match value {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}

/// Copy of `structure` where every key it already has is overwritten by the
/// matching key of `data`. Keys unknown to `structure` are dropped. Anything
/// but two objects yields an empty object.
pub fn fill_struct(structure: &JsonValue, data: &JsonValue) -> JsonValue {
    match (structure, data) {
        (JsonValue::Object(shape), JsonValue::Object(input)) => {
            let mut filled = shape.clone();
            for (key, value) in input {
                if let Some(slot) = filled.get_mut(key) {
                    *slot = value.clone();
                }
            }
            JsonValue::Object(filled)
        }
        _ => JsonValue::Object(Map::new()),
    }
}

/// Fills `T::default()` from a row and reads it back as `T`.
pub fn hydrate<T>(row: Row) -> Result<T, TableError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let shape = serde_json::to_value(T::default())?;
    let filled = fill_struct(&shape, &JsonValue::Object(row));
    Ok(serde_json::from_value(filled)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn infers_bind_types_from_runtime_values() {
        assert_eq!(BindType::of(&json!(true)), BindType::Bool);
        assert_eq!(BindType::of(&json!(42)), BindType::Int);
        assert_eq!(BindType::of(&json!(10.5)), BindType::Str);
        assert_eq!(BindType::of(&json!("abc")), BindType::Str);
        assert_eq!(BindType::of(&json!(null)), BindType::Null);
        assert_eq!(BindType::of(&json!([1, 2])), BindType::Str);
        assert_eq!(BindType::of(&json!({"a": 1})), BindType::Str);
    }

    #[test]
    fn decimals_are_bound_as_text() {
        assert_eq!(bind_value(&json!(10.5)), Value::from("10.5".to_string()));
        assert_eq!(bind_value(&json!(7)), Value::from(7i64));
        assert_eq!(
            bind_value(&json!({"a": 1})),
            Value::from("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn rewrites_named_placeholders_for_sqlite() {
        let stmt = prepare(
            DatabaseBackend::Sqlite,
            "UPDATE products SET product_name = :name WHERE product_id = :id",
            &[("id", json!(3)), ("name", json!("Lamp"))],
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE products SET product_name = ? WHERE product_id = ?"
        );
        let values = stmt.values.unwrap().0;
        assert_eq!(values, vec![Value::from("Lamp".to_string()), Value::from(3i64)]);
    }

    #[test]
    fn rewrites_named_placeholders_for_postgres_and_skips_casts_and_literals() {
        let stmt = prepare(
            DatabaseBackend::Postgres,
            "SELECT ':skip', x::text FROM t WHERE a = :a OR b = :a",
            &[("a", json!(1))],
        )
        .unwrap();

        assert_eq!(stmt.sql, "SELECT ':skip', x::text FROM t WHERE a = $1 OR b = $2");
        assert_eq!(stmt.values.unwrap().0.len(), 2);
    }

    #[test]
    fn missing_and_unused_params_fail() {
        let missing = prepare(DatabaseBackend::Sqlite, "SELECT :a", &[]);
        assert!(matches!(missing, Err(TableError::MissingParam(name)) if name == "a"));

        let unused = prepare(DatabaseBackend::Sqlite, "SELECT 1", &[("a", json!(1))]);
        assert!(matches!(unused, Err(TableError::UnusedParam(name)) if name == "a"));
    }

    #[test]
    fn fill_struct_is_a_whitelisted_merge() {
        let shape = json!({"id": 0, "name": "", "status": "ACT"});
        let input = json!({"name": "Lamp", "is_admin": true});

        assert_eq!(
            fill_struct(&shape, &input),
            json!({"id": 0, "name": "Lamp", "status": "ACT"})
        );
        assert_eq!(fill_struct(&shape, &json!("nope")), json!({}));
        assert_eq!(fill_struct(&json!([1]), &input), json!({}));
    }

    #[derive(Default, Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        id: i64,
        name: String,
    }

    #[test]
    fn hydrate_ignores_foreign_columns() {
        let row = json!({"id": 9, "name": "Lamp", "extra": "x"});
        let JsonValue::Object(row) = row else { unreachable!() };

        let sample: Sample = hydrate(row).unwrap();
        assert_eq!(sample, Sample { id: 9, name: "Lamp".into() });
    }
}
