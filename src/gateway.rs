use rusqlite::{params_from_iter, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::events::{EventSink, GatewayEvent, NullSink, Reporter};
use crate::script;
use crate::value::{HostValue, Rows, Value};
use crate::worker::{SerialWorker, TaskOutcome};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory holding the database file.
    pub data_dir: PathBuf,
    /// Name of the database file.
    pub db_name: String,
    /// Requested schema version, stamped into `PRAGMA user_version`.
    pub db_version: i64,
    /// Return each column value as a two-element `[name, value]` list.
    pub return_column_names: bool,
    /// Mirror debug traces to the host as `Debug` events.
    pub debug_events: bool,
}

impl GatewayConfig {
    /// Create a config with the default database name and version.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_name: "db.sqlite".to_string(),
            db_version: 1,
            return_column_names: false,
            debug_events: false,
        }
    }

    pub fn with_db_name(mut self, db_name: &str) -> Self {
        self.db_name = db_name.to_string();
        self
    }

    /// Schema versions start at 1; lower requests are clamped.
    pub fn with_version(mut self, db_version: i64) -> Self {
        self.db_version = db_version.max(1);
        self
    }

    pub fn with_return_column_names(mut self, on: bool) -> Self {
        self.return_column_names = on;
        self
    }

    pub fn with_debug_events(mut self, on: bool) -> Self {
        self.debug_events = on;
        self
    }
}

/// A composable SELECT over one table. Empty clauses are omitted from the
/// generated statement.
#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    table: String,
    distinct: bool,
    columns: Vec<String>,
    where_clause: String,
    bind_params: Vec<Value>,
    group_by: String,
    having: String,
    order_by: String,
    limit: String,
}

impl SelectStatement {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Column expressions to select; all columns when none are given.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// WHERE clause with its `?` bind parameters. An empty clause matches
    /// all rows.
    pub fn filter(mut self, where_clause: &str, params: &[Value]) -> Self {
        self.where_clause = where_clause.to_string();
        self.bind_params = params.to_vec();
        self
    }

    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = group_by.to_string();
        self
    }

    pub fn having(mut self, having: &str) -> Self {
        self.having = having.to_string();
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = order_by.to_string();
        self
    }

    pub fn limit(mut self, limit: &str) -> Self {
        self.limit = limit.to_string();
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&quote_ident(&self.table));
        for (keyword, clause) in [
            (" WHERE ", &self.where_clause),
            (" GROUP BY ", &self.group_by),
            (" HAVING ", &self.having),
            (" ORDER BY ", &self.order_by),
            (" LIMIT ", &self.limit),
        ] {
            if !clause.is_empty() {
                sql.push_str(keyword);
                sql.push_str(clause);
            }
        }
        sql
    }
}

/// Serialized database gateway.
///
/// One logical handle to a named, versioned SQLite file. Every
/// handle-touching operation is a task submitted to a single worker thread;
/// the calling thread blocks until its task completes. Failures never
/// surface as errors: operations return sentinel values (count -1, id -1,
/// empty rows, false) and notify the configured [`EventSink`].
pub struct SqliteGateway {
    config: GatewayConfig,
    worker: SerialWorker,
    reporter: Reporter,
    open: AtomicBool,
}

impl SqliteGateway {
    /// Create a gateway that discards events.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    /// Create a gateway delivering events to the given sink.
    pub fn with_sink(config: GatewayConfig, sink: Arc<dyn EventSink>) -> Self {
        let reporter = Reporter {
            sink,
            debug_events: config.debug_events,
        };
        Self {
            config,
            worker: SerialWorker::spawn(),
            reporter,
            open: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    //========================================================
    // Lifecycle
    //

    /// Whether the handle is currently open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Full path to the database file, whether or not it exists yet.
    pub fn database_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.db_name)
    }

    /// Whether the database file exists.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Open the database, creating the file and directory as needed.
    ///
    /// A fresh file emits `Created`; a stored schema version differing from
    /// the configured one emits `Upgraded` or `Downgraded` and restamps
    /// `PRAGMA user_version`; every successful open then emits `Opened`.
    /// Opening an already-open database is a no-op returning true.
    pub fn open(&self) -> bool {
        if self.is_open() {
            return true;
        }
        let data_dir = self.config.data_dir.clone();
        let path = self.database_path();
        let requested = self.config.db_version;
        let reporter = self.reporter.clone();
        let outcome = self.worker.submit(move |state| {
            if state.conn.is_some() {
                return TaskOutcome::ok();
            }
            match open_handle(&data_dir, &path, requested, &reporter) {
                Ok(conn) => {
                    state.conn = Some(conn);
                    TaskOutcome::ok()
                }
                Err(err) => {
                    reporter.failure(&err);
                    TaskOutcome::default()
                }
            }
        });
        if outcome.success {
            self.open.store(true, Ordering::SeqCst);
        }
        outcome.success
    }

    /// Close the database. Any uncommitted transaction is rolled back.
    /// Closing an already-closed database is a no-op returning true.
    pub fn close(&self) -> bool {
        if !self.is_open() {
            return true;
        }
        self.worker.submit(move |state| {
            // Dropping the handle rolls back whatever transaction is open.
            state.conn = None;
            state.tx_depth = 0;
            state.tx_rollback = false;
            TaskOutcome::ok()
        });
        self.open.store(false, Ordering::SeqCst);
        self.reporter.debug("database closed");
        self.reporter.dispatch(GatewayEvent::Closed);
        true
    }

    /// Delete a closed database file permanently.
    pub fn delete_database(&self) -> bool {
        if !self.guard_closed("delete_database") {
            return false;
        }
        let path = self.database_path();
        let removed = fs::remove_file(&path).is_ok();
        for suffix in ["-journal", "-wal", "-shm"] {
            let _ = fs::remove_file(sibling(&path, suffix));
        }
        if removed {
            self.reporter.debug("database deleted");
        }
        removed
    }

    /// Replace the closed database with a byte-copy of the given file.
    pub fn import_database(&self, file: &str) -> bool {
        if !self.guard_closed("import_database") {
            return false;
        }
        let source = self.resolve_file(file);
        let result = fs::create_dir_all(&self.config.data_dir)
            .and_then(|_| fs::copy(&source, self.database_path()));
        match result {
            Ok(_) => {
                self.reporter.debug("database imported");
                true
            }
            Err(err) => {
                self.reporter.failure(&GatewayError::Io(err));
                false
            }
        }
    }

    /// Byte-copy the closed database out to the given file.
    pub fn export_database(&self, file: &str) -> bool {
        if !self.guard_closed("export_database") {
            return false;
        }
        let target = self.resolve_file(file);
        match fs::copy(self.database_path(), &target) {
            Ok(_) => {
                self.reporter.debug("database exported");
                true
            }
            Err(err) => {
                self.reporter.failure(&GatewayError::Io(err));
                false
            }
        }
    }

    //========================================================
    // Introspection
    //

    /// Number of tables, or -1 when closed or on error.
    pub fn table_count(&self) -> i64 {
        if !self.guard_open("table_count") {
            return -1;
        }
        let outcome = self.run_db(|conn| {
            let count: i64 = conn.query_row(
                "SELECT count(1) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )?;
            Ok(TaskOutcome::with_count(count))
        });
        outcome.count
    }

    /// Names of the tables, or an empty list when closed or on error.
    pub fn table_names(&self) -> Vec<String> {
        if !self.guard_open("table_names") {
            return Vec::new();
        }
        let outcome = self.run_db(|conn| {
            let rows = query_rows(
                conn,
                "SELECT name FROM sqlite_master WHERE type='table'",
                &[],
            )?;
            Ok(TaskOutcome::with_rows(rows))
        });
        outcome
            .rows
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|value| value.to_string())
            .collect()
    }

    /// Whether the named table exists.
    pub fn table_exists(&self, table: &str) -> bool {
        if !self.guard_open("table_exists") {
            return false;
        }
        let table = table.to_string();
        let outcome = self.run_db(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT count(1) FROM sqlite_master WHERE type='table' AND name=?",
                [&table],
                |row| row.get(0),
            )?;
            Ok(TaskOutcome::with_count(count))
        });
        outcome.count == 1
    }

    /// Number of rows in a table, or -1 when closed or on error.
    pub fn table_row_count(&self, table: &str) -> i64 {
        if !self.guard_open("table_row_count") {
            return -1;
        }
        let sql = format!("SELECT count(1) FROM {}", quote_ident(table));
        let outcome = self.run_db(move |conn| {
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(TaskOutcome::with_count(count))
        });
        outcome.count
    }

    //========================================================
    // Transactions
    //

    /// Begin a transaction. Nested begins are permitted: only the outermost
    /// level touches the engine.
    pub fn begin_transaction(&self) -> bool {
        if !self.guard_open("begin_transaction") {
            return false;
        }
        let reporter = self.reporter.clone();
        let outcome = self.worker.submit(move |state| {
            let Some(conn) = state.conn.as_ref() else {
                return TaskOutcome::default();
            };
            if state.tx_depth == 0 {
                if let Err(err) = conn.execute_batch("BEGIN") {
                    reporter.failure(&err.into());
                    return TaskOutcome::default();
                }
                state.tx_rollback = false;
            }
            state.tx_depth += 1;
            TaskOutcome::ok()
        });
        if outcome.success {
            self.reporter.debug("transaction started");
        }
        outcome.success
    }

    /// Commit the innermost open transaction level. Only the outermost
    /// commit persists changes; if any level rolled back, the whole
    /// transaction rolls back instead.
    pub fn commit_transaction(&self) -> bool {
        if !self.guard_open("commit_transaction") {
            return false;
        }
        let reporter = self.reporter.clone();
        let outcome = self.worker.submit(move |state| {
            let Some(conn) = state.conn.as_ref() else {
                return TaskOutcome::default();
            };
            if state.tx_depth == 0 {
                reporter.failure(&GatewayError::TransactionState(
                    "no transaction in progress",
                ));
                return TaskOutcome::default();
            }
            state.tx_depth -= 1;
            if state.tx_depth == 0 {
                let sql = if state.tx_rollback { "ROLLBACK" } else { "COMMIT" };
                if let Err(err) = conn.execute_batch(sql) {
                    reporter.failure(&err.into());
                    return TaskOutcome::default();
                }
            }
            TaskOutcome::ok()
        });
        if outcome.success {
            self.reporter.debug("transaction committed");
        }
        outcome.success
    }

    /// Roll back the innermost open transaction level. A rollback at any
    /// level discards the entire outermost transaction.
    pub fn rollback_transaction(&self) -> bool {
        if !self.guard_open("rollback_transaction") {
            return false;
        }
        let reporter = self.reporter.clone();
        let outcome = self.worker.submit(move |state| {
            let Some(conn) = state.conn.as_ref() else {
                return TaskOutcome::default();
            };
            if state.tx_depth == 0 {
                reporter.failure(&GatewayError::TransactionState(
                    "no transaction in progress",
                ));
                return TaskOutcome::default();
            }
            state.tx_rollback = true;
            state.tx_depth -= 1;
            if state.tx_depth == 0 {
                if let Err(err) = conn.execute_batch("ROLLBACK") {
                    reporter.failure(&err.into());
                    return TaskOutcome::default();
                }
            }
            TaskOutcome::ok()
        });
        if outcome.success {
            self.reporter.debug("transaction rolled back");
        }
        outcome.success
    }

    //========================================================
    // Data manipulation
    //

    /// Execute a single non-SELECT statement with `?` parameters bound as
    /// text. Returns whether it succeeded; false when closed.
    pub fn execute(&self, sql: &str, params: &[Value]) -> bool {
        if !self.guard_open("execute") {
            return false;
        }
        let owned = sql.to_string();
        let texts = bind_texts(params);
        let outcome = self.run_db(move |conn| {
            conn.execute(&owned, params_from_iter(texts.iter()))?;
            Ok(TaskOutcome::ok())
        });
        if outcome.success {
            self.reporter.debug(format!("execute: {sql}"));
        }
        outcome.success
    }

    /// Execute statements from a SQL script file, stopping at the first
    /// error. Returns the count of statements executed; -1 when closed.
    pub fn execute_file(&self, file: &str) -> i64 {
        if !self.guard_open("execute_file") {
            return -1;
        }
        let path = self.resolve_file(file);
        let reporter = self.reporter.clone();
        let outcome = self.worker.submit(move |state| {
            let Some(conn) = state.conn.as_ref() else {
                return TaskOutcome::default();
            };
            let statements = match script::read_statements(&path) {
                Ok(statements) => statements,
                Err(err) => {
                    reporter.debug(format!("{err:#}"));
                    return TaskOutcome::with_count(0);
                }
            };
            let mut count = 0;
            for statement in statements {
                if let Err(err) = conn.execute_batch(&statement) {
                    reporter.failure(&err.into());
                    break;
                }
                count += 1;
            }
            TaskOutcome::with_count(count)
        });
        self.reporter
            .debug(format!("execute_file: {} statements executed", outcome.count));
        outcome.count
    }

    /// Execute a raw SELECT with `?` parameters bound as text. Returns the
    /// host-shaped result rows; empty when closed or on error.
    pub fn select_sql(&self, sql: &str, params: &[Value]) -> Vec<HostValue> {
        if !self.guard_open("select_sql") {
            return Vec::new();
        }
        let owned = sql.to_string();
        let texts = bind_texts(params);
        let outcome = self.run_db(move |conn| {
            let rows = query_rows(conn, &owned, &texts)?;
            Ok(TaskOutcome::with_rows(rows))
        });
        self.reporter
            .debug(format!("select_sql: {} rows", outcome.rows.len()));
        outcome.rows.into_host(self.config.return_column_names)
    }

    /// Execute a clause-built SELECT. Returns the host-shaped result rows;
    /// empty when closed or on error.
    pub fn select(&self, statement: &SelectStatement) -> Vec<HostValue> {
        if !self.guard_open("select") {
            return Vec::new();
        }
        let sql = statement.to_sql();
        let texts = bind_texts(&statement.bind_params);
        let outcome = self.run_db(move |conn| {
            let rows = query_rows(conn, &sql, &texts)?;
            Ok(TaskOutcome::with_rows(rows))
        });
        self.reporter.debug(format!(
            "select: {} rows from {}",
            outcome.rows.len(),
            statement.table
        ));
        outcome.rows.into_host(self.config.return_column_names)
    }

    /// Insert one row. Returns the new row id, or -1 when closed or on
    /// error.
    pub fn insert(&self, table: &str, columns: &[&str], values: &[Value]) -> i64 {
        let Some(pairs) = self.zip_columns("insert", columns, values) else {
            return -1;
        };
        self.write_row("insert", table, pairs, false)
    }

    /// Insert one row from a bulk pairs payload: every element must be a
    /// two-element `[name, value]` list. Returns the new row id, or -1 when
    /// closed, on a malformed payload, or on error.
    pub fn insert_pairs(&self, table: &str, pairs: &[HostValue]) -> i64 {
        if !self.guard_open("insert_pairs") {
            return -1;
        }
        let mut named = Vec::with_capacity(pairs.len());
        for element in pairs {
            match element.as_pair() {
                Ok(pair) => named.push(pair),
                Err(err) => {
                    self.reporter.failure(&err);
                    return -1;
                }
            }
        }
        self.write_row("insert_pairs", table, named, false)
    }

    /// Insert rows from a comma-separated file: first line names the
    /// columns, each further line is one row. Returns the count of rows
    /// inserted, stopping at the first error; -1 when closed.
    pub fn insert_file(&self, table: &str, file: &str) -> i64 {
        if !self.guard_open("insert_file") {
            return -1;
        }
        let path = self.resolve_file(file);
        let table = quote_ident(table);
        let reporter = self.reporter.clone();
        let outcome = self.worker.submit(move |state| {
            let Some(conn) = state.conn.as_ref() else {
                return TaskOutcome::default();
            };
            let (columns, rows) = match script::read_csv_rows(&path) {
                Ok(parsed) => parsed,
                Err(err) => {
                    reporter.debug(format!("{err:#}"));
                    return TaskOutcome::with_count(0);
                }
            };
            let sql = insert_sql(&table, &columns, false);
            let mut count = 0;
            for row in rows {
                if let Err(err) = conn.execute(&sql, params_from_iter(row.iter())) {
                    reporter.failure(&err.into());
                    break;
                }
                count += 1;
            }
            TaskOutcome::with_count(count)
        });
        self.reporter
            .debug(format!("insert_file: {} rows inserted", outcome.count));
        outcome.count
    }

    /// Insert or replace one row (SQL REPLACE). Returns the new or updated
    /// row id, or -1 when closed or on error.
    pub fn replace(&self, table: &str, columns: &[&str], values: &[Value]) -> i64 {
        let Some(pairs) = self.zip_columns("replace", columns, values) else {
            return -1;
        };
        self.write_row("replace", table, pairs, true)
    }

    /// Update rows matching the where-clause (all rows when it is empty).
    /// Returns the changed count, or -1 when closed or on error.
    pub fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        where_clause: &str,
        params: &[Value],
    ) -> i64 {
        let Some(pairs) = self.zip_columns("update", columns, values) else {
            return -1;
        };
        let mut sql = format!("UPDATE {} SET ", quote_ident(table));
        let assignments: Vec<String> = pairs
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_ident(name)))
            .collect();
        sql.push_str(&assignments.join(", "));
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(where_clause);
        }
        let mut texts: Vec<String> = pairs.iter().map(|(_, v)| v.to_string()).collect();
        texts.extend(bind_texts(params));
        let outcome = self.run_db(move |conn| {
            let count = conn.execute(&sql, params_from_iter(texts.iter()))?;
            Ok(TaskOutcome::with_count(count as i64))
        });
        self.reporter
            .debug(format!("update: {table} {} rows", outcome.count));
        outcome.count
    }

    /// Delete rows matching the where-clause. With an empty clause all rows
    /// are removed but the reported count is 0; callers rely on that
    /// distinction, so pass "1" to remove all rows and get the true count.
    /// Returns -1 when closed or on error.
    pub fn delete(&self, table: &str, where_clause: &str, params: &[Value]) -> i64 {
        if !self.guard_open("delete") {
            return -1;
        }
        let unconditional = where_clause.is_empty();
        let mut sql = format!("DELETE FROM {}", quote_ident(table));
        if !unconditional {
            sql.push_str(" WHERE ");
            sql.push_str(where_clause);
        }
        let texts = bind_texts(params);
        let outcome = self.run_db(move |conn| {
            let count = conn.execute(&sql, params_from_iter(texts.iter()))?;
            Ok(TaskOutcome::with_count(if unconditional {
                0
            } else {
                count as i64
            }))
        });
        if unconditional && outcome.success {
            self.reporter.debug(format!("delete: {table} all rows"));
        } else {
            self.reporter
                .debug(format!("delete: {table} {} rows", outcome.count));
        }
        outcome.count
    }

    //========================================================
    // Internals
    //

    pub(crate) fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Resolve a file argument: absolute paths are taken as-is, everything
    /// else is relative to the data directory.
    fn resolve_file(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.data_dir.join(path)
        }
    }

    /// Closed-state short-circuit: data operations return their sentinel
    /// without submitting a task.
    fn guard_open(&self, operation: &str) -> bool {
        if self.is_open() {
            return true;
        }
        self.reporter
            .debug(format!("database is not open: {operation}"));
        false
    }

    fn guard_closed(&self, operation: &str) -> bool {
        if !self.is_open() {
            return true;
        }
        self.reporter
            .debug(format!("database must be closed: {operation}"));
        false
    }

    fn run_db<F>(&self, task: F) -> TaskOutcome
    where
        F: FnOnce(&Connection) -> Result<TaskOutcome, GatewayError> + Send + 'static,
    {
        let reporter = self.reporter.clone();
        self.worker.submit(move |state| {
            let Some(conn) = state.conn.as_ref() else {
                return TaskOutcome::default();
            };
            match task(conn) {
                Ok(outcome) => outcome,
                Err(err) => {
                    reporter.failure(&err);
                    TaskOutcome::default()
                }
            }
        })
    }

    fn zip_columns(
        &self,
        operation: &str,
        columns: &[&str],
        values: &[Value],
    ) -> Option<Vec<(String, Value)>> {
        if !self.guard_open(operation) {
            return None;
        }
        if columns.len() != values.len() {
            self.reporter.failure(&GatewayError::MalformedPairs);
            return None;
        }
        Some(
            columns
                .iter()
                .map(|c| c.to_string())
                .zip(values.iter().cloned())
                .collect(),
        )
    }

    fn write_row(
        &self,
        operation: &str,
        table: &str,
        pairs: Vec<(String, Value)>,
        or_replace: bool,
    ) -> i64 {
        let quoted = quote_ident(table);
        let columns: Vec<String> = pairs.iter().map(|(name, _)| name.clone()).collect();
        let sql = insert_sql(&quoted, &columns, or_replace);
        let texts: Vec<String> = pairs.iter().map(|(_, v)| v.to_string()).collect();
        let outcome = self.run_db(move |conn| {
            conn.execute(&sql, params_from_iter(texts.iter()))?;
            Ok(TaskOutcome::with_row_id(conn.last_insert_rowid()))
        });
        self.reporter
            .debug(format!("{operation}: {table} id = {}", outcome.row_id));
        outcome.row_id
    }
}

/// Open the backing file and walk the version transition table, emitting
/// lifecycle events synchronously inside the open task.
fn open_handle(
    data_dir: &Path,
    path: &Path,
    requested: i64,
    reporter: &Reporter,
) -> Result<Connection, GatewayError> {
    fs::create_dir_all(data_dir)?;
    let existed = path.exists();
    let conn = Connection::open(path)?;
    let previous: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if !existed {
        reporter.debug("database created");
        reporter.dispatch(GatewayEvent::Created);
        conn.pragma_update(None, "user_version", requested)?;
    } else if previous < requested {
        reporter.debug(format!("database upgraded from {previous} to {requested}"));
        reporter.dispatch(GatewayEvent::Upgraded {
            old_version: previous,
            new_version: requested,
        });
        conn.pragma_update(None, "user_version", requested)?;
    } else if previous > requested {
        reporter.debug(format!("database downgraded from {previous} to {requested}"));
        reporter.dispatch(GatewayEvent::Downgraded {
            old_version: previous,
            new_version: requested,
        });
        conn.pragma_update(None, "user_version", requested)?;
    }
    reporter.debug("database opened");
    reporter.dispatch(GatewayEvent::Opened);
    Ok(conn)
}

fn query_rows(conn: &Connection, sql: &str, texts: &[String]) -> Result<Rows, GatewayError> {
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut raw = stmt.query(params_from_iter(texts.iter()))?;
    let mut rows = Vec::new();
    while let Some(row) = raw.next()? {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            values.push(Value::from_column(row.get_ref(i)?));
        }
        rows.push(values);
    }
    Ok(Rows { column_names, rows })
}

fn insert_sql(quoted_table: &str, columns: &[String], or_replace: bool) -> String {
    let verb = if or_replace { "REPLACE" } else { "INSERT" };
    let names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let marks: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "{verb} INTO {quoted_table} ({}) VALUES ({})",
        names.join(", "),
        marks.join(", ")
    )
}

fn bind_texts(params: &[Value]) -> Vec<String> {
    params.iter().map(|v| v.to_string()).collect()
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}
