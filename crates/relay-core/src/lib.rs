//! relay-core
//!
//! Building blocks of the call relay: queue message in, SOAP call out,
//! outcome recorded and routed onward.
//!
//! # Modules
//! - **domain**: call envelope, call record, outcome, ids, errors
//! - **ports**: RecordStore, MessageQueue, QueueProvider, RemoteInvoker, Clock
//! - **translate**: envelope to SOAP wire document
//! - **app**: dispatcher, recorder, forwarder, poller, push handler, builder
//! - **impls**: in-memory queue and record store, HTTP invoker
//! - **settings**: configuration assembled once at startup

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod settings;
pub mod translate;
