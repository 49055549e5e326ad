//! Asynchronous entry points.
//!
//! Each `*_async` variant spawns an independent caller thread that performs
//! the synchronous call, so the block on the serialized worker happens there
//! and never on the host's primary execution context. The thread then
//! delivers exactly one completion event carrying the caller's correlation
//! tag and a result identical to what the synchronous variant returns for
//! equivalent input.

use std::sync::Arc;
use std::thread;

use crate::events::GatewayEvent;
use crate::gateway::{SelectStatement, SqliteGateway};
use crate::value::{HostValue, Value};

impl SqliteGateway {
    /// Asynchronous [`execute`](Self::execute); completes with `AfterExecute`.
    pub fn execute_async(self: &Arc<Self>, tag: &str, sql: &str, params: &[Value]) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let sql = sql.to_string();
        let params = params.to_vec();
        thread::spawn(move || {
            let success = gateway.execute(&sql, &params);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterExecute { tag, success });
        });
    }

    /// Asynchronous [`execute_file`](Self::execute_file); completes with
    /// `AfterExecuteFile`.
    pub fn execute_file_async(self: &Arc<Self>, tag: &str, file: &str) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let file = file.to_string();
        thread::spawn(move || {
            let count = gateway.execute_file(&file);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterExecuteFile { tag, count });
        });
    }

    /// Asynchronous [`select_sql`](Self::select_sql); completes with
    /// `AfterSelect`.
    pub fn select_sql_async(self: &Arc<Self>, tag: &str, sql: &str, params: &[Value]) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let sql = sql.to_string();
        let params = params.to_vec();
        thread::spawn(move || {
            let rows = gateway.select_sql(&sql, &params);
            gateway.reporter().dispatch(after_select(tag, rows));
        });
    }

    /// Asynchronous [`select`](Self::select); completes with `AfterSelect`.
    pub fn select_async(self: &Arc<Self>, tag: &str, statement: &SelectStatement) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let statement = statement.clone();
        thread::spawn(move || {
            let rows = gateway.select(&statement);
            gateway.reporter().dispatch(after_select(tag, rows));
        });
    }

    /// Asynchronous [`insert`](Self::insert); completes with `AfterInsert`.
    pub fn insert_async(self: &Arc<Self>, tag: &str, table: &str, columns: &[&str], values: &[Value]) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let table = table.to_string();
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let values = values.to_vec();
        thread::spawn(move || {
            let borrowed: Vec<&str> = columns.iter().map(String::as_str).collect();
            let row_id = gateway.insert(&table, &borrowed, &values);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterInsert { tag, row_id });
        });
    }

    /// Asynchronous [`insert_pairs`](Self::insert_pairs); completes with
    /// `AfterInsert`.
    pub fn insert_pairs_async(self: &Arc<Self>, tag: &str, table: &str, pairs: &[HostValue]) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let table = table.to_string();
        let pairs = pairs.to_vec();
        thread::spawn(move || {
            let row_id = gateway.insert_pairs(&table, &pairs);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterInsert { tag, row_id });
        });
    }

    /// Asynchronous [`insert_file`](Self::insert_file); completes with
    /// `AfterInsertFile`.
    pub fn insert_file_async(self: &Arc<Self>, tag: &str, table: &str, file: &str) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let table = table.to_string();
        let file = file.to_string();
        thread::spawn(move || {
            let count = gateway.insert_file(&table, &file);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterInsertFile { tag, count });
        });
    }

    /// Asynchronous [`replace`](Self::replace); completes with `AfterReplace`.
    pub fn replace_async(self: &Arc<Self>, tag: &str, table: &str, columns: &[&str], values: &[Value]) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let table = table.to_string();
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let values = values.to_vec();
        thread::spawn(move || {
            let borrowed: Vec<&str> = columns.iter().map(String::as_str).collect();
            let row_id = gateway.replace(&table, &borrowed, &values);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterReplace { tag, row_id });
        });
    }

    /// Asynchronous [`update`](Self::update); completes with `AfterUpdate`.
    pub fn update_async(
        self: &Arc<Self>,
        tag: &str,
        table: &str,
        columns: &[&str],
        values: &[Value],
        where_clause: &str,
        params: &[Value],
    ) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let table = table.to_string();
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let values = values.to_vec();
        let where_clause = where_clause.to_string();
        let params = params.to_vec();
        thread::spawn(move || {
            let borrowed: Vec<&str> = columns.iter().map(String::as_str).collect();
            let count = gateway.update(&table, &borrowed, &values, &where_clause, &params);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterUpdate { tag, count });
        });
    }

    /// Asynchronous [`delete`](Self::delete); completes with `AfterDelete`.
    pub fn delete_async(
        self: &Arc<Self>,
        tag: &str,
        table: &str,
        where_clause: &str,
        params: &[Value],
    ) {
        let gateway = Arc::clone(self);
        let tag = tag.to_string();
        let table = table.to_string();
        let where_clause = where_clause.to_string();
        let params = params.to_vec();
        thread::spawn(move || {
            let count = gateway.delete(&table, &where_clause, &params);
            gateway
                .reporter()
                .dispatch(GatewayEvent::AfterDelete { tag, count });
        });
    }
}

fn after_select(tag: String, rows: Vec<HostValue>) -> GatewayEvent {
    GatewayEvent::AfterSelect {
        tag,
        row_count: rows.len() as i64,
        rows,
    }
}
