//! Ports - traits at every external seam.
//!
//! The queue transport, the record store, the remote endpoint and the clock
//! are all provided by infrastructure. The application layer only sees these
//! traits, so the in-memory implementations in `impls` can stand in for them
//! in tests and local runs.

pub mod clock;
pub mod invoker;
pub mod message_queue;
pub mod record_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::invoker::RemoteInvoker;
pub use self::message_queue::{MessageQueue, QueueMessage, QueueProvider};
pub use self::record_store::RecordStore;
