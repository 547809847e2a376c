//! Error taxonomy for the reconciliation core.
//!
//! Every failure the core can produce falls into one of five families:
//! transport, decode, resolution, dispatch and validation. They all
//! propagate unchanged up to the orchestrators, which wrap them with the
//! resource type and action before handing them to the declarative front-end.

use std::fmt;

use thiserror::Error;

use crate::directory::EntityKind;

/// Failures raised by the Transport Core while talking to the remote service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The per-call deadline expired before a response arrived.
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u128 },

    /// The remote service answered with a status code >= 400.
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// A success status code with no body on an endpoint that promises one.
    #[error("request to {url} returned an empty body")]
    EmptyBody { url: String },

    /// The request could not be constructed (bad header, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Status code carried by the error, if the remote service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A single name or identifier that could not be found in a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {token:?} not found")]
pub struct ResolutionError {
    pub kind: EntityKind,
    pub token: String,
}

/// Every resolution failure collected during one encode pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateError(pub Vec<ResolutionError>);

impl AggregateError {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ResolutionError] {
        &self.0
    }

    pub fn push(&mut self, err: ResolutionError) {
        self.0.push(err);
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unresolved reference(s): ", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Failures selecting or feeding a vendor strategy.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported vendor {vendor:?}; supported vendors: {}", .supported.join(", "))]
    UnsupportedVendor {
        vendor: String,
        supported: Vec<&'static str>,
    },

    /// The dynamic configuration value had a shape no vendor can consume.
    #[error("invalid vendor configuration: {0}")]
    InvalidConfig(String),
}

/// A vendor rejected its configuration bag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {vendor} configuration: {message}")]
pub struct ValidationError {
    pub vendor: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(vendor: &'static str, message: impl Into<String>) -> Self {
        Self {
            vendor,
            message: message.into(),
        }
    }
}

/// Lifecycle action an orchestrator was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::List => "list",
        };
        f.write_str(s)
    }
}

/// Umbrella error returned by every public operation of the core.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{resource} response is missing required field {field:?}")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Resolution(#[from] AggregateError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{resource} has no identifier yet; create it first")]
    MissingId { resource: &'static str },

    #[error("{resource} {key:?} not found")]
    NotFound {
        resource: &'static str,
        key: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to {action} {resource} resource: {source}")]
    Operation {
        action: Action,
        resource: &'static str,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        ProviderError::Decode {
            context: context.into(),
            source,
        }
    }

    /// Wraps the error with orchestrator context.
    pub fn during(self, action: Action, resource: &'static str) -> Self {
        ProviderError::Operation {
            action,
            resource,
            source: Box::new(self),
        }
    }

    /// Strips any orchestrator wrapping and returns the underlying cause.
    pub fn root(&self) -> &ProviderError {
        match self {
            ProviderError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the remote service or a list scan reported the resource absent.
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            ProviderError::NotFound { .. } => true,
            ProviderError::Transport(t) => t.status() == Some(404),
            _ => false,
        }
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
