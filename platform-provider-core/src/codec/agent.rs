use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::Partial;
use crate::directory::{DirectoryCache, EntityKind, Resolver};
use crate::model::AgentModel;

/// Directory kinds [`encode`] and [`decode`] consult.
pub const AGENT_DIRECTORY: [EntityKind; 5] = [
    EntityKind::User,
    EntityKind::Group,
    EntityKind::Runner,
    EntityKind::Secret,
    EntityKind::Integration,
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "ai_instructions")]
    pub instructions: String,
    #[serde(default)]
    pub runners: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub allowed_users: Vec<String>,
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

/// Resolves users and groups to identifiers and checks that the runner,
/// secrets and integrations exist. Every failure lands in one aggregate.
pub fn encode(model: &AgentModel, cache: &DirectoryCache) -> Partial<AgentWire> {
    let mut resolver = Resolver::new(cache);
    let owners = resolver.resolve_all(EntityKind::User, &model.owners);
    let allowed_users = resolver.resolve_all(EntityKind::User, &model.allowed_users);
    let allowed_groups = resolver.resolve_all(EntityKind::Group, &model.allowed_groups);
    let runners = resolver
        .resolve(EntityKind::Runner, &model.runner)
        .into_iter()
        .collect();
    let secrets = resolver.resolve_all(EntityKind::Secret, &model.secrets);
    let integrations = resolver.resolve_all(EntityKind::Integration, &model.integrations);
    let errors = resolver.finish();

    debug!(name = %model.name, unresolved = errors.len(), "Encoded agent");

    let wire = AgentWire {
        uuid: model.id.clone(),
        name: model.name.clone(),
        description: model.description.clone(),
        instructions: model.instructions.clone(),
        runners,
        llm_model: model.llm_model.clone(),
        image: model.image.clone(),
        owners,
        allowed_users,
        allowed_groups,
        secrets,
        integrations,
        environment_variables: model.environment_variables.clone(),
        links: model.links.clone(),
    };
    Partial::new(wire, errors)
}

pub fn decode(wire: AgentWire, cache: &DirectoryCache) -> AgentModel {
    AgentModel {
        id: wire.uuid,
        owners: cache.names_of(EntityKind::User, &wire.owners),
        allowed_users: cache.names_of(EntityKind::User, &wire.allowed_users),
        allowed_groups: cache.names_of(EntityKind::Group, &wire.allowed_groups),
        runner: wire.runners.into_iter().next().unwrap_or_default(),
        name: wire.name,
        description: wire.description,
        instructions: wire.instructions,
        llm_model: wire.llm_model,
        image: wire.image,
        secrets: wire.secrets,
        integrations: wire.integrations,
        environment_variables: wire.environment_variables,
        links: wire.links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{GroupEntry, RunnerEntry, SecretEntry, UserEntry};

    fn cache() -> DirectoryCache {
        DirectoryCache {
            users: vec![UserEntry {
                uuid: "u-1".into(),
                email: "ada@example.com".into(),
                name: "Ada".into(),
            }],
            groups: vec![GroupEntry {
                uuid: "g-1".into(),
                name: "sre".into(),
            }],
            runners: vec![RunnerEntry {
                name: "edge".into(),
            }],
            secrets: vec![SecretEntry {
                name: "GH_TOKEN".into(),
            }],
            ..Default::default()
        }
    }

    fn model() -> AgentModel {
        AgentModel {
            name: "deployer".into(),
            runner: "edge".into(),
            owners: vec!["ada@example.com".into()],
            allowed_groups: vec!["sre".into()],
            secrets: vec!["GH_TOKEN".into()],
            ..Default::default()
        }
    }

    #[test]
    fn encode_resolves_users_and_groups_to_ids() {
        let encoded = encode(&model(), &cache());
        assert!(encoded.is_complete());
        assert_eq!(encoded.value.owners, vec!["u-1".to_string()]);
        assert_eq!(encoded.value.allowed_groups, vec!["g-1".to_string()]);
        assert_eq!(encoded.value.runners, vec!["edge".to_string()]);
    }

    #[test]
    fn encode_reports_every_missing_reference() {
        let mut model = model();
        model.runner = "ghost-runner".into();
        model.integrations = vec!["jira".into()];
        model.allowed_users = vec!["bob@example.com".into()];

        let encoded = encode(&model, &cache());
        let message = encoded.errors.to_string();
        assert_eq!(encoded.errors.len(), 3);
        assert!(message.contains("ghost-runner"));
        assert!(message.contains("jira"));
        assert!(message.contains("bob@example.com"));
        // valid references survive in the partial payload
        assert_eq!(encoded.value.owners, vec!["u-1".to_string()]);
    }

    #[test]
    fn encode_reports_blank_runner() {
        let mut model = model();
        model.runner = String::new();

        let encoded = encode(&model, &cache());
        assert!(!encoded.is_complete());
        assert_eq!(encoded.errors.len(), 1);
        assert_eq!(encoded.errors.errors()[0].kind, EntityKind::Runner);
        assert!(encoded.value.runners.is_empty());
    }

    #[test]
    fn decode_restores_names() {
        let cache = cache();
        let decoded = decode(encode(&model(), &cache).value, &cache);
        assert_eq!(decoded, model());
    }
}
