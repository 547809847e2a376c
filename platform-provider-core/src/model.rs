//! Declarative models: the caller-facing state of each orchestrated resource.
//!
//! Identity fields are `None` until the remote service has assigned them.
//! References to other entities are held by display name (emails for users).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dynamic::DynamicValue;

/// A knowledge entry agents can consult.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KnowledgeModel {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Agent names.
    #[serde(default)]
    pub supported_agents: Vec<String>,
    /// Group names.
    #[serde(default)]
    pub supported_agents_groups: Vec<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentModel {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    pub runner: String,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// User emails.
    #[serde(default)]
    pub owners: Vec<String>,
    /// User emails.
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// Group names.
    #[serde(default)]
    pub allowed_groups: Vec<String>,
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// A runner is identified by its name; there is no separate identifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunnerModel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    /// Deployment manifest URL, only returned on creation.
    #[serde(default)]
    pub manifest_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A third-party knowledge source, configured through a vendor strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalKnowledgeModel {
    #[serde(default)]
    pub id: Option<String>,
    /// Dispatch key selecting the vendor strategy, e.g. `slack`.
    pub vendor: String,
    /// Vendor-specific configuration blob.
    #[serde(default)]
    pub config: DynamicValue,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
