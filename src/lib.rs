//! Serialized SQLite gateway.
//!
//! # Intention
//!
//! - Expose one named, versioned SQLite database behind a single choke
//!   point: every handle-touching operation runs as a task on one dedicated
//!   worker thread, so operations issued concurrently from any number of
//!   caller threads never overlap on the connection.
//! - Offer both synchronous (blocking) and asynchronous
//!   (fire-and-forget-with-event) entry points over the same serialized
//!   path.
//! - Keep failures inside the gateway: operations return documented
//!   sentinel values (count -1, id -1, empty rows, false) and report detail
//!   through a one-way [`EventSink`] instead of returning errors.
//!
//! # Architectural Boundaries
//!
//! - Durability, indexing, query planning, and ACID guarantees belong to
//!   SQLite; this crate only marshals values, serializes access, and
//!   translates outcomes into events.
//! - The [`EventSink`] implementation stands in for the host's primary
//!   execution context; nothing here assumes a particular host runtime.

mod asynch;
mod error;
pub mod events;
pub mod gateway;
mod script;
pub mod value;
mod worker;

pub use events::{EventSink, GatewayEvent, NullSink};
pub use gateway::{GatewayConfig, SelectStatement, SqliteGateway};
pub use value::{HostValue, Rows, Value};
