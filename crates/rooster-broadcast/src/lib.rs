//! # Rooster Broadcast
//! The fan-out engine: snapshots the subscriber directory, picks content,
//! and sends to every recipient with per-recipient failure isolation. One
//! unreachable recipient never aborts the batch. Also hosts the membership
//! reconciler, the only transport-signal-driven mutation path into the
//! directory.

pub mod dispatcher;
pub mod reconciler;
pub mod report;

pub use dispatcher::Dispatcher;
pub use reconciler::Reconciler;
pub use report::BroadcastReport;
