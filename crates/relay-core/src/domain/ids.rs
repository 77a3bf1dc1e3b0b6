//! Domain identifiers (strongly-typed, string backed).
//!
//! Call and correlation identifiers arrive from upstream as opaque strings, so
//! unlike generated ids they are never parsed. The phantom marker keeps a
//! `CallId` from being passed where a `CorrelationId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker: [`Id`] が何を識別するかを型で区別するためのマーカー
pub trait IdMarker: Send + Sync + 'static {}

/// Generic string identifier.
///
/// # Example
/// ```ignore
/// let call_id = CallId::from("abc-123");
/// let correlation_id = CorrelationId::from("abc-123");
/// // same text, different types: they cannot be mixed up
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// True when upstream sent no usable identifier.
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl<T: IdMarker> Default for Id<T> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Marker for call identifiers (record-store row key and queue message body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Call {}

impl IdMarker for Call {}

/// Marker for correlation identifiers supplied by the upstream caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Correlation {}

impl IdMarker for Correlation {}

pub type CallId = Id<Call>;
pub type CorrelationId = Id<Correlation>;
