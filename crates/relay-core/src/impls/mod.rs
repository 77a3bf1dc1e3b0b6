//! Impls - implementations of the ports.
//!
//! # Included
//! - **InMemoryQueue / InMemoryQueueProvider**: lease-based queue for tests and local runs
//! - **InMemoryRecordStore**: versioned record store for tests and local runs
//! - **HttpInvoker**: reqwest-based remote invoker (production)

pub mod http_invoker;
pub mod inmem_queue;
pub mod inmem_record_store;

pub use self::http_invoker::HttpInvoker;
pub use self::inmem_queue::{InMemoryQueue, InMemoryQueueProvider};
pub use self::inmem_record_store::InMemoryRecordStore;
