//! Shared test support utilities
//!
//! Provides a `MockStore` implementing `DocumentStore` that records every call,
//! for use in unit and integration tests.

use crate::domain::CanonicalDocument;
use crate::error::BridgeError;
use crate::port::DocumentStore;
use crate::port::document_store::StoreFuture;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One call received by [`MockStore`].
#[derive(Debug, Clone)]
pub enum StoreCall {
    Ping,
    InsertOne {
        database: String,
        collection: String,
        document: CanonicalDocument,
    },
    InsertMany {
        database: String,
        collection: String,
        documents: Vec<CanonicalDocument>,
    },
}

/// In-memory store that captures calls and can be told to fail or stall.
pub struct MockStore {
    calls: Arc<Mutex<Vec<StoreCall>>>,
    should_fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            should_fail: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Sleep this long inside every call before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that wrote documents, ignoring pings.
    pub fn write_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, StoreCall::Ping))
            .collect()
    }

    /// Every document written, in write order.
    pub fn written_documents(&self) -> Vec<CanonicalDocument> {
        self.calls()
            .into_iter()
            .flat_map(|call| match call {
                StoreCall::Ping => Vec::new(),
                StoreCall::InsertOne { document, .. } => vec![document],
                StoreCall::InsertMany { documents, .. } => documents,
            })
            .collect()
    }

    fn respond(&self, call: StoreCall) -> StoreFuture<'_> {
        let delay = *self.delay.lock().unwrap();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push(call);
            if self.should_fail.load(Ordering::SeqCst) {
                let refused = io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused by clickhouse-0.internal:8123",
                );
                return Err(BridgeError::Storage(clickhouse::error::Error::Network(
                    Box::new(refused),
                )));
            }
            Ok(())
        })
    }
}

impl DocumentStore for MockStore {
    fn ping(&self, _timeout: Duration) -> StoreFuture<'_> {
        self.respond(StoreCall::Ping)
    }

    fn insert_one<'a>(
        &'a self,
        database: &'a str,
        collection: &'a str,
        document: CanonicalDocument,
    ) -> StoreFuture<'a> {
        self.respond(StoreCall::InsertOne {
            database: database.to_string(),
            collection: collection.to_string(),
            document,
        })
    }

    fn insert_many<'a>(
        &'a self,
        database: &'a str,
        collection: &'a str,
        documents: Vec<CanonicalDocument>,
    ) -> StoreFuture<'a> {
        self.respond(StoreCall::InsertMany {
            database: database.to_string(),
            collection: collection.to_string(),
            documents,
        })
    }
}
