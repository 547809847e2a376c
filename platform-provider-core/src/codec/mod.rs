//! Resource codecs: declarative model <-> wire resource.
//!
//! Encoding resolves human names through a [`DirectoryCache`](crate::directory::DirectoryCache)
//! and keeps going after a failed lookup, so one pass reports every
//! unresolved reference. Decoding maps identifiers back to names and drops
//! the ones the snapshot no longer knows.

pub mod agent;
pub mod knowledge;

use serde::Deserialize;

use crate::error::AggregateError;

/// A best-effort value together with the resolution failures met building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub value: T,
    pub errors: AggregateError,
}

impl<T> Partial<T> {
    pub fn new(value: T, errors: AggregateError) -> Self {
        Self { value, errors }
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The value if every reference resolved, otherwise the aggregate error.
    pub fn into_result(self) -> Result<T, AggregateError> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(self.errors)
        }
    }
}

/// List endpoints answer either with a bare array or an `items` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { items: Vec<T> },
}

impl<T> ListBody<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Wrapped { items } => items,
        }
    }
}
