use rusqlite::Connection;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::value::Rows;

/// Everything mutable the gateway owns, held by the worker thread and
/// accessed only from task bodies.
#[derive(Default)]
pub(crate) struct GatewayState {
    pub(crate) conn: Option<Connection>,
    pub(crate) tx_depth: u32,
    pub(crate) tx_rollback: bool,
}

/// The result captured by one serialized task.
///
/// Defaults are the documented failure sentinels: success false, no rows,
/// count -1, row id -1.
pub(crate) struct TaskOutcome {
    pub(crate) success: bool,
    pub(crate) rows: Rows,
    pub(crate) count: i64,
    pub(crate) row_id: i64,
}

impl Default for TaskOutcome {
    fn default() -> Self {
        Self {
            success: false,
            rows: Rows::default(),
            count: -1,
            row_id: -1,
        }
    }
}

impl TaskOutcome {
    pub(crate) fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_rows(rows: Rows) -> Self {
        Self {
            success: true,
            rows,
            ..Self::default()
        }
    }

    pub(crate) fn with_count(count: i64) -> Self {
        Self {
            success: true,
            count,
            ..Self::default()
        }
    }

    pub(crate) fn with_row_id(row_id: i64) -> Self {
        Self {
            success: true,
            row_id,
            ..Self::default()
        }
    }
}

type Task = Box<dyn FnOnce(&mut GatewayState) -> TaskOutcome + Send>;

/// Single-worker serial execution context.
///
/// Tasks queue in FIFO submission order across all calling threads; the
/// worker runs at most one at a time, and `submit` blocks its caller until
/// that caller's task has completed. The connection handle lives inside
/// `GatewayState` and is never touched outside a task body, so no further
/// locking exists anywhere in the crate.
pub(crate) struct SerialWorker {
    tx: Option<Sender<(Task, Sender<TaskOutcome>)>>,
    handle: Option<JoinHandle<()>>,
}

impl SerialWorker {
    pub(crate) fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<(Task, Sender<TaskOutcome>)>();
        let handle = thread::spawn(move || {
            let mut state = GatewayState::default();
            while let Ok((task, done)) = rx.recv() {
                let outcome = task(&mut state);
                // Receiver may have given up; the task still ran to completion.
                let _ = done.send(outcome);
            }
        });
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Enqueue one task and block until it completes.
    pub(crate) fn submit<F>(&self, task: F) -> TaskOutcome
    where
        F: FnOnce(&mut GatewayState) -> TaskOutcome + Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::channel();
        let sent = self
            .tx
            .as_ref()
            .map(|tx| tx.send((Box::new(task), done_tx)).is_ok())
            .unwrap_or(false);
        if !sent {
            return TaskOutcome::default();
        }
        done_rx.recv().unwrap_or_default()
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        // Disconnect the channel so the worker loop exits, then reap it.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
