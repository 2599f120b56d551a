//! Mileage sinks - where emitted records are persisted.
//!
//! The tracking session never writes to a sink directly; records go through
//! the retrying [`SinkWriter`](crate::tracking::SinkWriter) so a slow or
//! failing sink cannot stall position processing.
//!
//! Sinks use `Pin<Box<dyn Future>>` returns so they stay dyn-compatible and
//! can be shared as `Arc<dyn MileageSink>`.

mod jsonl;
mod memory;

pub use jsonl::{JsonlFileSink, StoredMileageRecord};
pub use memory::MemorySink;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;

use crate::tracking::MileageRecord;

/// Boxed future used by dyn-compatible async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised while persisting a mileage record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O error writing to the backing store.
    #[error("I/O error writing to '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink refused the record.
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Durable destination for mileage records.
pub trait MileageSink: Send + Sync {
    /// Persist one record for `user_id`.
    fn append<'a>(
        &'a self,
        record: &'a MileageRecord,
        user_id: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>>;
}
