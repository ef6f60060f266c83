//! Storage collaborator used by the ingest and health handlers.
//!
//! Dyn-compatible through boxed futures so one `Arc<dyn DocumentStore>` can
//! be shared by every request, and tests can swap in a mock.

use crate::domain::CanonicalDocument;
use crate::error::BridgeError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type StoreFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BridgeError>> + Send + 'a>>;

pub trait DocumentStore: Send + Sync {
    /// Check the backend is reachable, giving up after `timeout`.
    fn ping(&self, timeout: Duration) -> StoreFuture<'_>;

    /// Write a single document to `database.collection`.
    fn insert_one<'a>(
        &'a self,
        database: &'a str,
        collection: &'a str,
        document: CanonicalDocument,
    ) -> StoreFuture<'a>;

    /// Write all `documents` to `database.collection` in one round trip.
    fn insert_many<'a>(
        &'a self,
        database: &'a str,
        collection: &'a str,
        documents: Vec<CanonicalDocument>,
    ) -> StoreFuture<'a>;
}
