use platform_provider_core::codec::knowledge::{decode, encode};
use platform_provider_core::directory::{AgentEntry, DirectoryCache, EntityKind, GroupEntry};
use platform_provider_core::model::KnowledgeModel;

fn directory() -> DirectoryCache {
    DirectoryCache {
        agents: vec![
            AgentEntry {
                uuid: "a-1".into(),
                name: "support-bot".into(),
            },
            AgentEntry {
                uuid: "a-2".into(),
                name: "deploy-bot".into(),
            },
        ],
        groups: vec![
            GroupEntry {
                uuid: "g-1".into(),
                name: "platform".into(),
            },
            GroupEntry {
                uuid: "g-2".into(),
                name: "sre".into(),
            },
        ],
        ..DirectoryCache::default()
    }
}

fn model() -> KnowledgeModel {
    KnowledgeModel {
        name: "runbooks".into(),
        description: "On-call runbooks".into(),
        content: "Restart the pod.".into(),
        labels: vec!["ops".into()],
        supported_agents: vec!["support-bot".into(), "a-2".into()],
        supported_agents_groups: vec!["platform".into()],
        ..KnowledgeModel::default()
    }
}

#[test]
fn test_encode_resolves_names_and_ids() {
    let partial = encode(&model(), &directory());
    assert!(partial.is_complete(), "unexpected errors: {}", partial.errors);

    let wire = partial.into_result().expect("complete encode");
    assert_eq!(wire.supported_agents, vec!["a-1", "a-2"]);
    assert_eq!(wire.supported_agents_groups, vec!["g-1"]);
    assert_eq!(wire.kind, "knowledge");

    let json = serde_json::to_value(&wire).unwrap();
    assert_eq!(json["type"], "knowledge");
    assert!(json.get("uuid").is_none(), "uuid must be omitted before creation");
}

#[test]
fn test_encode_then_decode_restores_names() {
    let cache = directory();
    let mut wire = encode(&model(), &cache).into_result().expect("complete encode");
    wire.uuid = Some("k-9".into());

    let decoded = decode(wire, &cache);
    assert_eq!(decoded.id.as_deref(), Some("k-9"));
    assert_eq!(decoded.supported_agents, vec!["support-bot", "deploy-bot"]);
    assert_eq!(decoded.supported_agents_groups, vec!["platform"]);
    assert_eq!(decoded.content, "Restart the pod.");
}

#[test]
fn test_missing_group_is_reported_and_partial_payload_kept() {
    let mut knowledge = model();
    knowledge.supported_agents_groups = vec!["platform".into(), "eng-infra".into()];
    knowledge.supported_agents.push("ghost-bot".into());

    let partial = encode(&knowledge, &directory());
    assert!(!partial.is_complete());
    assert_eq!(partial.errors.len(), 2);

    let kinds: Vec<EntityKind> = partial.errors.errors().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EntityKind::Group));
    assert!(kinds.contains(&EntityKind::Agent));

    let msg = partial.errors.to_string();
    assert!(msg.contains("eng-infra"), "got: {msg}");
    assert!(msg.contains("ghost-bot"), "got: {msg}");

    assert_eq!(partial.value.supported_agents_groups, vec!["g-1"]);
    assert_eq!(partial.value.supported_agents, vec!["a-1", "a-2"]);
}

#[test]
fn test_decode_drops_stale_references() {
    let cache = directory();
    let wire = serde_json::from_value(serde_json::json!({
        "uuid": "k-1",
        "name": "runbooks",
        "supported_agents": ["a-1", "a-deleted"],
        "supported_agents_groups": ["g-gone"]
    }))
    .unwrap();

    let decoded = decode(wire, &cache);
    assert_eq!(decoded.supported_agents, vec!["support-bot"]);
    assert!(decoded.supported_agents_groups.is_empty());
}
