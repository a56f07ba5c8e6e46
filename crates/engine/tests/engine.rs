#![forbid(unsafe_code)]

use sd_core::{Catalog, SqlEngine, SqlValue};
use sd_engine::SqliteEngine;

const PETS_SETUP: &str = "
CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT, grams REAL);
INSERT INTO pets (name, grams) VALUES ('Rex', 4200.5), ('Mia', NULL);
";

fn engine_with(setup: &str) -> SqliteEngine {
    let mut engine = SqliteEngine::in_memory().expect("open in-memory engine");
    engine.reset_schema(setup).expect("setup runs");
    engine
}

#[test]
fn select_reports_columns_and_typed_rows() {
    let mut engine = engine_with(PETS_SETUP);
    let result = engine
        .execute("SELECT id, name, grams FROM pets ORDER BY id;")
        .expect("query runs");

    assert_eq!(result.columns, vec!["id", "name", "grams"]);
    assert_eq!(
        result.rows,
        vec![
            vec![
                SqlValue::Integer(1),
                SqlValue::Text("Rex".to_string()),
                SqlValue::Real(4200.5),
            ],
            vec![
                SqlValue::Integer(2),
                SqlValue::Text("Mia".to_string()),
                SqlValue::Null,
            ],
        ]
    );
    assert_eq!(result.affected_rows, None);
    assert!(result.is_row_set());
}

#[test]
fn writes_report_affected_rows() {
    let mut engine = engine_with(PETS_SETUP);

    let insert = engine
        .execute("INSERT INTO pets (name, grams) VALUES ('Taro', 900.0);")
        .expect("insert runs");
    assert_eq!(insert.affected_rows, Some(1));
    assert!(!insert.is_row_set());

    let update = engine
        .execute("UPDATE pets SET grams = 1.0;")
        .expect("update runs");
    assert_eq!(update.affected_rows, Some(3));

    let noop = engine
        .execute("DELETE FROM pets WHERE name = 'nobody';")
        .expect("delete runs");
    assert_eq!(noop.affected_rows, Some(0));
}

#[test]
fn ddl_reports_zero_affected() {
    let mut engine = engine_with(PETS_SETUP);
    let result = engine
        .execute("CREATE TABLE scratch (x INTEGER);")
        .expect("ddl runs");
    assert_eq!(result.affected_rows, Some(0));
    assert!(result.columns.is_empty());
}

#[test]
fn errors_carry_sqlite_text_verbatim() {
    let mut engine = engine_with(PETS_SETUP);

    let err = engine.execute("SELEKT 1;").expect_err("syntax error");
    assert!(err.message().contains("syntax error"), "got: {err}");

    let err = engine
        .execute("SELECT * FROM missing;")
        .expect_err("unknown table");
    assert!(err.message().contains("no such table"), "got: {err}");

    // The connection stays usable after a failed statement.
    let result = engine.execute("SELECT COUNT(*) FROM pets;").expect("runs");
    assert_eq!(result.rows, vec![vec![SqlValue::Integer(2)]]);
}

#[test]
fn reset_drops_extra_tables_and_views() {
    let mut engine = engine_with(PETS_SETUP);
    engine
        .execute("CREATE TABLE scratch (x INTEGER);")
        .expect("create table");
    engine
        .execute("CREATE VIEW heavy AS SELECT name FROM pets WHERE grams > 1000;")
        .expect("create view");

    engine.reset_schema(PETS_SETUP).expect("reset runs");

    let err = engine
        .execute("SELECT * FROM scratch;")
        .expect_err("scratch is gone");
    assert!(err.message().contains("no such table"), "got: {err}");

    let survivors = engine
        .execute(
            "SELECT name FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name;",
        )
        .expect("master query");
    assert_eq!(
        survivors.rows,
        vec![vec![SqlValue::Text("pets".to_string())]]
    );
}

#[test]
fn reset_restores_baseline_rows() {
    let mut engine = engine_with(PETS_SETUP);
    engine.execute("DELETE FROM pets;").expect("wipe");

    engine.reset_schema(PETS_SETUP).expect("reset runs");

    let count = engine
        .execute("SELECT COUNT(*) FROM pets;")
        .expect("count runs");
    assert_eq!(count.rows, vec![vec![SqlValue::Integer(2)]]);
}

#[test]
fn builtin_setup_script_replays_cleanly() {
    let catalog = Catalog::builtin();
    let setup = &catalog.first().setup_sql;

    let mut engine = engine_with(setup);
    engine.reset_schema(setup).expect("second reset runs");

    let users = engine
        .execute("SELECT COUNT(*) FROM users;")
        .expect("users count");
    assert_eq!(users.rows, vec![vec![SqlValue::Integer(5)]]);

    let orders = engine
        .execute("SELECT COUNT(*) FROM orders;")
        .expect("orders count");
    assert_eq!(orders.rows, vec![vec![SqlValue::Integer(6)]]);
}

#[test]
fn blob_and_null_literals_map_to_values() {
    let mut engine = engine_with(PETS_SETUP);
    let result = engine
        .execute("SELECT x'0102', NULL;")
        .expect("literal select");
    assert_eq!(
        result.rows,
        vec![vec![SqlValue::Blob(vec![1, 2]), SqlValue::Null]]
    );
}
