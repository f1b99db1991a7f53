use rusqlite::{Connection, OptionalExtension, params, types::Value as SqlValue};
use serde_json::{Map, Value};
use tracing::debug;

use crate::store::{DocumentStore, FieldValue, Fields, Snapshot, Write};
use crate::{Database, StoreError};

impl DocumentStore for Database {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.with_conn(|conn| load(conn, collection, id))
    }

    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let path = field_path(field)?;
        let param = sql_param(value)?;

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body FROM documents
                 WHERE collection = ?1 AND json_extract(body, ?2) = ?3
                 ORDER BY id",
            )?;

            let rows = stmt
                .query_map(params![collection, path, param], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(id, body)| -> Result<Snapshot, StoreError> {
                    Ok(Snapshot {
                        id,
                        data: serde_json::from_str(&body)?,
                    })
                })
                .collect()
        })
    }

    fn commit(&self, writes: Vec<Write>) -> Result<Vec<bool>, StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        let count = writes.len();

        let applied = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let applied = writes
                .into_iter()
                .map(|write| apply(&tx, write, now))
                .collect::<Result<Vec<_>, _>>()?;
            tx.commit()?;
            Ok(applied)
        })?;

        debug!("Committed batch of {} writes", count);
        Ok(applied)
    }
}

fn apply(conn: &Connection, write: Write, now: i64) -> Result<bool, StoreError> {
    match write {
        Write::Set {
            collection,
            id,
            fields,
        } => {
            let mut doc = Map::new();
            apply_fields(&mut doc, fields, now);
            save(conn, &collection, &id, doc)?;
            Ok(true)
        }
        Write::Update {
            collection,
            id,
            fields,
        } => {
            let mut doc = load_object(conn, &collection, &id)?
                .ok_or_else(|| StoreError::not_found(&collection, &id))?;
            apply_fields(&mut doc, fields, now);
            save(conn, &collection, &id, doc)?;
            Ok(true)
        }
        Write::PatchArrayEntry {
            collection,
            id,
            field,
            key_field,
            key,
            patch,
        } => {
            let mut doc = load_object(conn, &collection, &id)?
                .ok_or_else(|| StoreError::not_found(&collection, &id))?;

            let target = doc
                .get_mut(&field)
                .and_then(Value::as_array_mut)
                .and_then(|items| {
                    items
                        .iter_mut()
                        .find(|item| item.get(&key_field) == Some(&key))
                })
                .and_then(Value::as_object_mut);

            let Some(entry) = target else {
                return Ok(false);
            };
            entry.extend(patch);

            save(conn, &collection, &id, doc)?;
            Ok(true)
        }
    }
}

fn apply_fields(doc: &mut Map<String, Value>, fields: Fields, now: i64) {
    for (name, field) in fields.0 {
        match field {
            FieldValue::Value(value) => {
                doc.insert(name, value);
            }
            FieldValue::ServerTimestamp => {
                doc.insert(name, Value::from(now));
            }
            FieldValue::ArrayUnion(items) => {
                let mut merged = match doc.remove(&name) {
                    Some(Value::Array(existing)) => existing,
                    _ => Vec::new(),
                };
                for item in items {
                    if !merged.contains(&item) {
                        merged.push(item);
                    }
                }
                doc.insert(name, Value::Array(merged));
            }
            FieldValue::ArrayAppend(items) => {
                let mut appended = match doc.remove(&name) {
                    Some(Value::Array(existing)) => existing,
                    _ => Vec::new(),
                };
                appended.extend(items);
                doc.insert(name, Value::Array(appended));
            }
        }
    }
}

fn load(conn: &Connection, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            [collection, id],
            |row| row.get(0),
        )
        .optional()?;

    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

fn load_object(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> Result<Option<Map<String, Value>>, StoreError> {
    match load(conn, collection, id)? {
        Some(Value::Object(doc)) => Ok(Some(doc)),
        Some(_) => Err(StoreError::InvalidDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: "document body is not an object".into(),
        }),
        None => Ok(None),
    }
}

fn save(
    conn: &Connection,
    collection: &str,
    id: &str,
    doc: Map<String, Value>,
) -> Result<(), StoreError> {
    let body = serde_json::to_string(&Value::Object(doc))?;
    conn.execute(
        "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
         ON CONFLICT(collection, id) DO UPDATE
            SET body = excluded.body, updated_at = datetime('now')",
        params![collection, id, body],
    )?;
    Ok(())
}

/// JSON path for a top-level field. Only plain identifiers are accepted.
fn field_path(field: &str) -> Result<String, StoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StoreError::InvalidQuery(format!(
            "unsupported field name '{}'",
            field
        )));
    }
    Ok(format!("$.{}", field))
}

/// json_extract yields SQL scalars, so the comparison value must be one too.
fn sql_param(value: &Value) -> Result<SqlValue, StoreError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(SqlValue::Integer(i)),
            (None, Some(f)) => Ok(SqlValue::Real(f)),
            _ => Err(StoreError::InvalidQuery(format!("unsupported number {}", n))),
        },
        Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidQuery(
            "equality queries take scalar values".into(),
        )),
    }
}
