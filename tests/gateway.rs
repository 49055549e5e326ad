mod common;

use common::CollectingSink;
use sqlite_gateway::{
    GatewayConfig, GatewayEvent, HostValue, SelectStatement, SqliteGateway, Value,
};
use std::sync::Arc;
use tempfile::TempDir;

fn open_gateway(dir: &TempDir) -> (SqliteGateway, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::default());
    let gateway = SqliteGateway::with_sink(GatewayConfig::new(dir.path()), sink.clone());
    assert!(gateway.open());
    (gateway, sink)
}

fn create_kv_table(gateway: &SqliteGateway) {
    assert!(gateway.execute("CREATE TABLE t (name TEXT, value TEXT)", &[]));
}

#[test]
fn round_trip_insert_and_select() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);

    let row_id = gateway.insert("t", &["name", "value"], &["a".into(), "1".into()]);
    assert_eq!(row_id, 1);

    let rows = gateway.select_sql("SELECT * FROM t WHERE name='a'", &[]);
    assert_eq!(
        rows,
        vec![HostValue::List(vec![
            HostValue::from("a"),
            HostValue::from("1"),
        ])]
    );
}

#[test]
fn round_trip_with_column_names() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(CollectingSink::default());
    let config = GatewayConfig::new(dir.path()).with_return_column_names(true);
    let gateway = SqliteGateway::with_sink(config, sink);
    assert!(gateway.open());
    create_kv_table(&gateway);

    gateway.insert("t", &["name", "value"], &["a".into(), "1".into()]);
    let rows = gateway.select_sql("SELECT * FROM t WHERE name='a'", &[]);
    assert_eq!(
        rows,
        vec![HostValue::List(vec![
            HostValue::pair("name", "a"),
            HostValue::pair("value", "1"),
        ])]
    );
}

#[test]
fn single_column_select_is_flat() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    gateway.insert("t", &["name", "value"], &["a".into(), "1".into()]);
    gateway.insert("t", &["name", "value"], &["b".into(), "2".into()]);

    let rows = gateway.select_sql("SELECT name FROM t ORDER BY name", &[]);
    assert_eq!(rows, vec![HostValue::from("a"), HostValue::from("b")]);
}

#[test]
fn select_statement_with_clauses() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    for (name, value) in [("a", "1"), ("b", "2"), ("c", "3")] {
        gateway.insert("t", &["name", "value"], &[name.into(), value.into()]);
    }

    let statement = SelectStatement::table("t")
        .columns(&["name"])
        .filter("value > ?", &[Value::Text("1".into())])
        .order_by("name DESC")
        .limit("1");
    let rows = gateway.select(&statement);
    assert_eq!(rows, vec![HostValue::from("c")]);
}

#[test]
fn closed_gateway_returns_sentinels_without_events() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(CollectingSink::default());
    let gateway = SqliteGateway::with_sink(GatewayConfig::new(dir.path()), sink.clone());

    assert!(!gateway.is_open());
    assert_eq!(gateway.table_count(), -1);
    assert_eq!(gateway.table_names(), Vec::<String>::new());
    assert!(!gateway.table_exists("t"));
    assert_eq!(gateway.table_row_count("t"), -1);
    assert!(!gateway.execute("CREATE TABLE t (a TEXT)", &[]));
    assert_eq!(gateway.execute_file("missing.sql"), -1);
    assert_eq!(gateway.select_sql("SELECT 1", &[]), Vec::<HostValue>::new());
    assert_eq!(gateway.insert("t", &["a"], &["1".into()]), -1);
    assert_eq!(gateway.replace("t", &["a"], &["1".into()]), -1);
    assert_eq!(gateway.update("t", &["a"], &["1".into()], "", &[]), -1);
    assert_eq!(gateway.delete("t", "", &[]), -1);
    assert!(!gateway.begin_transaction());

    // Precondition failures are debug-only, and debug events are off.
    assert!(sink.snapshot().is_empty());
}

#[test]
fn open_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (gateway, sink) = open_gateway(&dir);
    assert!(gateway.is_open());
    assert!(gateway.open());
    assert!(gateway.is_open());
    assert_eq!(
        sink.count_matching(|e| matches!(e, GatewayEvent::Opened)),
        1
    );
}

#[test]
fn sql_error_reported_through_event() {
    let dir = TempDir::new().unwrap();
    let (gateway, sink) = open_gateway(&dir);

    assert!(!gateway.execute("THIS IS NOT SQL", &[]));
    assert_eq!(
        sink.count_matching(|e| matches!(e, GatewayEvent::SqlError { .. })),
        1
    );
    // The handle stays usable after a failure.
    create_kv_table(&gateway);
    assert_eq!(gateway.table_count(), 1);
}

#[test]
fn delete_count_quirk() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    for i in 0..3 {
        gateway.insert("t", &["name", "value"], &["x".into(), Value::Integer(i)]);
    }

    // No where-clause: all rows go, but the reported count stays 0.
    assert_eq!(gateway.delete("t", "", &[]), 0);
    assert_eq!(gateway.table_row_count("t"), 0);

    for i in 0..3 {
        gateway.insert("t", &["name", "value"], &["x".into(), Value::Integer(i)]);
    }
    // "1" removes everything and reports the true count.
    assert_eq!(gateway.delete("t", "1", &[]), 3);
    assert_eq!(gateway.table_row_count("t"), 0);
}

#[test]
fn update_with_and_without_where_clause() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    gateway.insert("t", &["name", "value"], &["a".into(), "1".into()]);
    gateway.insert("t", &["name", "value"], &["b".into(), "2".into()]);

    let changed = gateway.update("t", &["value"], &["9".into()], "name = ?", &["a".into()]);
    assert_eq!(changed, 1);
    let changed = gateway.update("t", &["value"], &["0".into()], "", &[]);
    assert_eq!(changed, 2);

    let rows = gateway.select_sql("SELECT DISTINCT value FROM t", &[]);
    assert_eq!(rows, vec![HostValue::from("0")]);
}

#[test]
fn replace_overwrites_by_primary_key() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    gateway.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, value TEXT)", &[]);

    assert_eq!(gateway.replace("t", &["id", "value"], &["1".into(), "old".into()]), 1);
    assert_eq!(gateway.replace("t", &["id", "value"], &["1".into(), "new".into()]), 1);
    assert_eq!(gateway.table_row_count("t"), 1);
    let rows = gateway.select_sql("SELECT value FROM t", &[]);
    assert_eq!(rows, vec![HostValue::from("new")]);
}

#[test]
fn insert_pairs_round_trip_and_malformed_payload() {
    let dir = TempDir::new().unwrap();
    let (gateway, sink) = open_gateway(&dir);
    create_kv_table(&gateway);

    let pairs = vec![HostValue::pair("name", "a"), HostValue::pair("value", "1")];
    assert_eq!(gateway.insert_pairs("t", &pairs), 1);

    // A bare scalar is not a [name, value] pair.
    let malformed = vec![HostValue::pair("name", "b"), HostValue::from("2")];
    assert_eq!(gateway.insert_pairs("t", &malformed), -1);
    assert_eq!(
        sink.count_matching(|e| matches!(e, GatewayEvent::SqlError { .. })),
        1
    );
    assert_eq!(gateway.table_row_count("t"), 1);
}

#[test]
fn mismatched_columns_and_values_fail() {
    let dir = TempDir::new().unwrap();
    let (gateway, sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    assert_eq!(gateway.insert("t", &["name", "value"], &["a".into()]), -1);
    assert_eq!(
        sink.count_matching(|e| matches!(e, GatewayEvent::SqlError { .. })),
        1
    );
}

#[test]
fn introspection_reports_schema() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    gateway.execute("CREATE TABLE u (id INTEGER)", &[]);

    assert_eq!(gateway.table_count(), 2);
    let mut names = gateway.table_names();
    names.sort();
    assert_eq!(names, vec!["t".to_string(), "u".to_string()]);
    assert!(gateway.table_exists("t"));
    assert!(!gateway.table_exists("nope"));
    assert_eq!(gateway.table_row_count("u"), 0);
}

#[test]
fn nested_transaction_rollback_discards_everything() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);

    assert!(gateway.begin_transaction());
    gateway.insert("t", &["name", "value"], &["outer".into(), "1".into()]);
    assert!(gateway.begin_transaction());
    gateway.insert("t", &["name", "value"], &["inner".into(), "2".into()]);
    assert!(gateway.rollback_transaction());
    assert!(gateway.commit_transaction());

    // The inner rollback poisons the outermost transaction.
    assert_eq!(gateway.table_row_count("t"), 0);
}

#[test]
fn nested_transaction_commit_persists() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);

    assert!(gateway.begin_transaction());
    gateway.insert("t", &["name", "value"], &["outer".into(), "1".into()]);
    assert!(gateway.begin_transaction());
    gateway.insert("t", &["name", "value"], &["inner".into(), "2".into()]);
    assert!(gateway.commit_transaction());
    // Still inside the outer transaction.
    assert!(gateway.commit_transaction());

    assert_eq!(gateway.table_row_count("t"), 2);
}

#[test]
fn commit_without_begin_is_a_defined_failure() {
    let dir = TempDir::new().unwrap();
    let (gateway, sink) = open_gateway(&dir);
    assert!(!gateway.commit_transaction());
    assert!(!gateway.rollback_transaction());
    // Transaction-state failures are debug-only, not SQL errors.
    assert_eq!(
        sink.count_matching(|e| matches!(e, GatewayEvent::SqlError { .. })),
        0
    );
}

#[test]
fn close_rolls_back_open_transaction() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);

    assert!(gateway.begin_transaction());
    gateway.insert("t", &["name", "value"], &["a".into(), "1".into()]);
    assert!(gateway.close());

    assert!(gateway.open());
    assert_eq!(gateway.table_row_count("t"), 0);
}

#[test]
fn execute_file_runs_script() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    std::fs::write(
        dir.path().join("setup.sql"),
        "CREATE TABLE t (name TEXT, value TEXT); -- schema\n\
         /* seed data */\n\
         INSERT INTO t VALUES ('a', '1');\n\
         INSERT INTO t \\\n\
         VALUES ('b', '2');\n",
    )
    .unwrap();

    assert_eq!(gateway.execute_file("setup.sql"), 3);
    assert_eq!(gateway.table_row_count("t"), 2);
}

#[test]
fn execute_file_stops_at_first_error() {
    let dir = TempDir::new().unwrap();
    let (gateway, sink) = open_gateway(&dir);
    std::fs::write(
        dir.path().join("bad.sql"),
        "CREATE TABLE t (a TEXT);\nNOT SQL;\nINSERT INTO t VALUES ('x');\n",
    )
    .unwrap();

    assert_eq!(gateway.execute_file("bad.sql"), 1);
    assert_eq!(
        sink.count_matching(|e| matches!(e, GatewayEvent::SqlError { .. })),
        1
    );
    assert_eq!(gateway.table_row_count("t"), 0);
}

#[test]
fn insert_file_loads_rows() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    create_kv_table(&gateway);
    std::fs::write(
        dir.path().join("rows.csv"),
        "name, value\na, 1\n\nb, 2\n",
    )
    .unwrap();

    assert_eq!(gateway.insert_file("t", "rows.csv"), 2);
    let rows = gateway.select_sql("SELECT name FROM t ORDER BY name", &[]);
    assert_eq!(rows, vec![HostValue::from("a"), HostValue::from("b")]);
}

#[test]
fn bound_parameters_are_text() {
    let dir = TempDir::new().unwrap();
    let (gateway, _sink) = open_gateway(&dir);
    gateway.execute("CREATE TABLE n (v INTEGER)", &[]);

    // Text binding plus column affinity stores a real integer.
    assert!(gateway.execute("INSERT INTO n (v) VALUES (?)", &[Value::Integer(7)]));
    let rows = gateway.select_sql("SELECT v FROM n", &[]);
    assert_eq!(rows, vec![HostValue::Scalar(Value::Integer(7))]);
}
