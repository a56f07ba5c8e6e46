#![forbid(unsafe_code)]

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use sd_core::{EngineError, ExecutionResult, SqlEngine, SqlValue};

/// In-memory SQLite backend for drill sessions.
///
/// One connection per session; `reset_schema` rebuilds the sandbox between
/// attempts instead of reopening the database.
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    pub fn in_memory() -> Result<Self, EngineError> {
        let conn = Connection::open_in_memory().map_err(engine_err)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(engine_err)?;
        Ok(Self { conn })
    }
}

impl SqlEngine for SqliteEngine {
    fn execute(&mut self, sql: &str) -> Result<ExecutionResult, EngineError> {
        let mut stmt = self.conn.prepare(sql).map_err(engine_err)?;

        // Statements without a result shape (DDL/DML) report the change count.
        if stmt.column_count() == 0 {
            let affected = stmt.execute([]).map_err(engine_err)?;
            return Ok(ExecutionResult {
                columns: Vec::new(),
                rows: Vec::new(),
                affected_rows: Some(affected as u64),
            });
        }

        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let column_count = columns.len();

        let mut collected: Vec<Vec<SqlValue>> = Vec::new();
        let mut rows = stmt.query([]).map_err(engine_err)?;
        while let Some(row) = rows.next().map_err(engine_err)? {
            let mut out = Vec::with_capacity(column_count);
            for index in 0..column_count {
                out.push(value_from_ref(row.get_ref(index).map_err(engine_err)?));
            }
            collected.push(out);
        }

        Ok(ExecutionResult {
            columns,
            rows: collected,
            affected_rows: None,
        })
    }

    fn reset_schema(&mut self, setup_sql: &str) -> Result<(), EngineError> {
        // Foreign keys stay off during the sweep so drop order cannot matter.
        self.conn
            .execute_batch("PRAGMA foreign_keys=OFF;")
            .map_err(engine_err)?;

        let objects = {
            let mut stmt = self
                .conn
                .prepare(
                    "SELECT name, type FROM sqlite_master \
                     WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'",
                )
                .map_err(engine_err)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(engine_err)?;
            let mut objects: Vec<(String, String)> = Vec::new();
            for row in rows {
                objects.push(row.map_err(engine_err)?);
            }
            objects
        };

        for (name, kind) in objects {
            let drop_stmt = if kind == "view" {
                format!("DROP VIEW IF EXISTS {}", quote_ident(&name))
            } else {
                format!("DROP TABLE IF EXISTS {}", quote_ident(&name))
            };
            self.conn.execute_batch(&drop_stmt).map_err(engine_err)?;
        }

        self.conn
            .execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(engine_err)?;
        self.conn.execute_batch(setup_sql).map_err(engine_err)
    }
}

fn value_from_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Integer(v),
        ValueRef::Real(v) => SqlValue::Real(v),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

fn quote_ident(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

fn engine_err(err: rusqlite::Error) -> EngineError {
    EngineError::new(err.to_string())
}
