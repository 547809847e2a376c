use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::Partial;
use crate::directory::{DirectoryCache, EntityKind, Resolver};
use crate::model::KnowledgeModel;

const KNOWLEDGE_TYPE: &str = "knowledge";
const KNOWLEDGE_SOURCE: &str = "declarative";

/// Knowledge entry as the remote service stores it: agent and group
/// references are identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub supported_agents: Vec<String>,
    #[serde(default)]
    pub supported_agents_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_type() -> String {
    KNOWLEDGE_TYPE.to_string()
}

fn default_source() -> String {
    KNOWLEDGE_SOURCE.to_string()
}

/// Builds the wire payload, resolving agent and group names.
///
/// Unresolvable names are left out of the payload and reported together.
pub fn encode(model: &KnowledgeModel, cache: &DirectoryCache) -> Partial<KnowledgeWire> {
    let mut resolver = Resolver::new(cache);
    let supported_agents = resolver.resolve_all(EntityKind::Agent, &model.supported_agents);
    let supported_agents_groups =
        resolver.resolve_all(EntityKind::Group, &model.supported_agents_groups);
    let errors = resolver.finish();

    debug!(
        name = %model.name,
        agents = supported_agents.len(),
        groups = supported_agents_groups.len(),
        unresolved = errors.len(),
        "Encoded knowledge"
    );

    let wire = KnowledgeWire {
        uuid: model.id.clone(),
        name: model.name.clone(),
        description: model.description.clone(),
        content: model.content.clone(),
        labels: model.labels.clone(),
        supported_agents,
        supported_agents_groups,
        owner: model.owner.clone(),
        kind: default_type(),
        source: default_source(),
        created_at: None,
        updated_at: None,
    };
    Partial::new(wire, errors)
}

/// Maps a wire entry back to names. References the snapshot does not know
/// are dropped without error: stale references are expected on read.
pub fn decode(wire: KnowledgeWire, cache: &DirectoryCache) -> KnowledgeModel {
    KnowledgeModel {
        id: wire.uuid,
        supported_agents: cache.names_of(EntityKind::Agent, &wire.supported_agents),
        supported_agents_groups: cache.names_of(EntityKind::Group, &wire.supported_agents_groups),
        name: wire.name,
        description: wire.description,
        content: wire.content,
        labels: wire.labels,
        owner: wire.owner,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
    }
}
