//! Resource orchestrators: Create/Read/Update/Delete per resource type.
//!
//! Every resource follows the same state machine:
//!
//! ```text
//! absent --create--> present --update*--> present --delete--> absent
//! ```
//!
//! - Create encodes, sends, decodes and returns a new model with its
//!   identifier populated. Nothing is recorded if the remote call fails.
//! - Read overwrites the caller's model in place. Not-found is an error; the
//!   front-end decides whether that means "recreate".
//! - Update either uses a dedicated endpoint or, for runners, deletes and
//!   re-creates. The latter is not atomic.
//! - Delete surfaces failures; idempotency on an absent resource depends on
//!   the endpoint.
//!
//! Errors leave each orchestrator wrapped as
//! "failed to <action> <resource> resource: <cause>".

pub mod agent;
pub mod external_knowledge;
pub mod knowledge;
pub mod runner;

use async_trait::async_trait;
use tracing::error;

use crate::error::{Action, ProviderError};

pub use agent::AgentResource;
pub use external_knowledge::ExternalKnowledgeResource;
pub use knowledge::KnowledgeResource;
pub use runner::RunnerResource;

/// Lifecycle callbacks the declarative front-end invokes.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    type Model: Send + Sync;

    /// Resource type name used in logs and error context.
    const RESOURCE: &'static str;

    async fn create(&self, model: &Self::Model) -> Result<Self::Model, ProviderError>;

    async fn read(&self, model: &mut Self::Model) -> Result<(), ProviderError>;

    async fn update(&self, model: &mut Self::Model) -> Result<(), ProviderError>;

    async fn delete(&self, model: &Self::Model) -> Result<(), ProviderError>;
}

/// Logs the failure and wraps it with resource and action context.
pub(crate) fn failed(
    resource: &'static str,
    action: Action,
) -> impl FnOnce(ProviderError) -> ProviderError {
    move |e| {
        error!(resource, action = %action, error = %e, "Resource operation failed");
        e.during(action, resource)
    }
}

/// Identifier of a model that must already exist remotely.
pub(crate) fn require_id<'m>(
    resource: &'static str,
    id: &'m Option<String>,
) -> Result<&'m str, ProviderError> {
    id.as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(ProviderError::MissingId { resource })
}
