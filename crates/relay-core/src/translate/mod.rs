//! Envelope translation into the power-on service's wire format.

pub mod soap;

pub use self::soap::{WireDocument, translate};
