use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::value::HostValue;

/// One-way, fire-and-forget notifications emitted by the gateway.
///
/// Delivery order matches the completion order of the serialized tasks that
/// produced them. `tag` fields carry the caller-supplied correlation tag of
/// the asynchronous call that completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GatewayEvent {
    Opened,
    Created,
    Closed,
    Upgraded { old_version: i64, new_version: i64 },
    Downgraded { old_version: i64, new_version: i64 },
    AfterExecute { tag: String, success: bool },
    AfterExecuteFile { tag: String, count: i64 },
    AfterSelect { tag: String, row_count: i64, rows: Vec<HostValue> },
    AfterInsert { tag: String, row_id: i64 },
    AfterInsertFile { tag: String, count: i64 },
    AfterReplace { tag: String, row_id: i64 },
    AfterUpdate { tag: String, count: i64 },
    AfterDelete { tag: String, count: i64 },
    SqlError { message: String },
    Debug { message: String },
}

/// Where gateway events are delivered.
///
/// The implementation stands in for the host's primary execution context:
/// `dispatch` is called once per notification, from whichever thread
/// completed the work, and must hand the event over without blocking the
/// gateway for long.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: GatewayEvent);
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn dispatch(&self, _event: GatewayEvent) {}
}

/// Shared emission helper, cloned into serialized task bodies.
#[derive(Clone)]
pub(crate) struct Reporter {
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) debug_events: bool,
}

impl Reporter {
    pub(crate) fn dispatch(&self, event: GatewayEvent) {
        self.sink.dispatch(event);
    }

    /// Debug trace, optionally mirrored to the host as a `Debug` event.
    pub(crate) fn debug(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{message}");
        if self.debug_events {
            self.sink.dispatch(GatewayEvent::Debug { message });
        }
    }

    /// Record a task failure: always a debug trace, plus a `SqlError` event
    /// for engine failures and malformed bulk input.
    pub(crate) fn failure(&self, err: &GatewayError) {
        tracing::warn!("operation failed: {err}");
        let message = err.to_string();
        if self.debug_events {
            self.sink.dispatch(GatewayEvent::Debug {
                message: message.clone(),
            });
        }
        if err.is_sql_error() {
            self.sink.dispatch(GatewayEvent::SqlError { message });
        }
    }
}
