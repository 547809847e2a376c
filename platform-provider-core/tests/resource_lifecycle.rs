use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde_json::json;

use platform_provider_core::contract::{HttpRequest, HttpResponse, MockHttpBackend};
use platform_provider_core::dynamic::DynamicValue;
use platform_provider_core::error::ProviderError;
use platform_provider_core::model::{
    AgentModel, ExternalKnowledgeModel, KnowledgeModel, RunnerModel,
};
use platform_provider_core::resources::{
    AgentResource, ExternalKnowledgeResource, KnowledgeResource, Orchestrator, RunnerResource,
};
use platform_provider_core::{ApiClient, ProviderConfig};

const BASE_URL: &str = "http://platform.test";

fn config() -> ProviderConfig {
    ProviderConfig {
        base_url: Some(BASE_URL.into()),
        organization: Some("acme".into()),
        user_email: Some("ops@acme.io".into()),
        ..ProviderConfig::new("test-key")
    }
}

fn path(req: &HttpRequest) -> &str {
    req.url.strip_prefix(BASE_URL).unwrap_or(&req.url)
}

fn respond(req: &HttpRequest, status: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse::new(req.url.clone(), status, body.to_string())
}

/// Answers the three directory listings the knowledge codec needs.
fn directory(req: &HttpRequest) -> Option<HttpResponse> {
    if req.method != Method::GET {
        return None;
    }
    match path(req) {
        "/api/v2/users" => Some(respond(
            req,
            200,
            json!([{"uuid": "u-1", "email": "ada@acme.io", "name": "Ada"}]),
        )),
        "/api/v1/manage/groups" => Some(respond(
            req,
            200,
            json!({"items": [{"uuid": "g-1", "name": "platform"}]}),
        )),
        "/api/v1/agents" => Some(respond(
            req,
            200,
            json!([{"uuid": "a-1", "name": "support-bot"}]),
        )),
        _ => None,
    }
}

fn unexpected(req: &HttpRequest) -> HttpResponse {
    panic!("unexpected request {} {}", req.method, req.url)
}

#[tokio::test]
async fn test_knowledge_create_scopes_legacy_call_and_decodes_names() {
    let mut backend = MockHttpBackend::new();
    backend.expect_send().returning(|req| {
        if let Some(response) = directory(&req) {
            return Ok(response);
        }
        match (req.method.clone(), path(&req)) {
            (Method::POST, "/api/v1/knowledge") => {
                assert_eq!(req.query_param("org"), Some("acme"));
                assert_eq!(req.query_param("email"), Some("ops@acme.io"));
                let body = req.json_body().expect("json body");
                assert_eq!(body["supported_agents"], json!(["a-1"]));
                assert_eq!(body["supported_agents_groups"], json!(["g-1"]));
                Ok(respond(
                    &req,
                    201,
                    json!({
                        "uuid": "k-1",
                        "name": "runbooks",
                        "supported_agents": ["a-1"],
                        "supported_agents_groups": ["g-1"],
                        "created_at": "2026-01-01T00:00:00Z"
                    }),
                ))
            }
            _ => Ok(unexpected(&req)),
        }
    });
    let client = ApiClient::new(backend, &config()).unwrap();
    let knowledge = KnowledgeResource::new(&client);

    let created = knowledge
        .create(&KnowledgeModel {
            name: "runbooks".into(),
            supported_agents: vec!["support-bot".into()],
            supported_agents_groups: vec!["platform".into()],
            ..KnowledgeModel::default()
        })
        .await
        .expect("create succeeds");

    assert_eq!(created.id.as_deref(), Some("k-1"));
    assert_eq!(created.supported_agents, vec!["support-bot"]);
    assert_eq!(created.supported_agents_groups, vec!["platform"]);
    assert_eq!(created.created_at.as_deref(), Some("2026-01-01T00:00:00Z"));
}

#[tokio::test]
async fn test_knowledge_create_with_unknown_group_sends_nothing() {
    let mut backend = MockHttpBackend::new();
    backend.expect_send().returning(|req| match directory(&req) {
        Some(response) => Ok(response),
        None => Ok(unexpected(&req)),
    });
    let client = ApiClient::new(backend, &config()).unwrap();

    let err = KnowledgeResource::new(&client)
        .create(&KnowledgeModel {
            name: "runbooks".into(),
            supported_agents_groups: vec!["eng-infra".into()],
            ..KnowledgeModel::default()
        })
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("failed to create knowledge resource"), "got: {msg}");
    assert!(msg.contains("eng-infra"), "got: {msg}");
    assert!(matches!(err.root(), ProviderError::Resolution(_)));
}

#[tokio::test]
async fn test_knowledge_read_without_id_scans_by_name() {
    let mut backend = MockHttpBackend::new();
    backend.expect_send().returning(|req| {
        if path(&req) == "/api/v1/knowledge" && req.method == Method::GET {
            return Ok(respond(
                &req,
                200,
                json!([
                    {"uuid": "k-0", "name": "other"},
                    {"uuid": "k-1", "name": "runbooks", "supported_agents": ["a-1", "a-gone"]}
                ]),
            ));
        }
        match directory(&req) {
            Some(response) => Ok(response),
            None => Ok(unexpected(&req)),
        }
    });
    let client = ApiClient::new(backend, &config()).unwrap();

    let mut model = KnowledgeModel {
        name: "runbooks".into(),
        ..KnowledgeModel::default()
    };
    KnowledgeResource::new(&client)
        .read(&mut model)
        .await
        .expect("found by name");
    assert_eq!(model.id.as_deref(), Some("k-1"));
    assert_eq!(model.supported_agents, vec!["support-bot"]);

    let mut missing = KnowledgeModel {
        name: "nope".into(),
        ..KnowledgeModel::default()
    };
    let err = KnowledgeResource::new(&client)
        .read(&mut missing)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got: {err}");
}

#[tokio::test]
async fn test_knowledge_delete_surfaces_404() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .times(1)
        .returning(|req| Ok(respond(&req, 404, json!({"error": "not found"}))));
    let client = ApiClient::new(backend, &config()).unwrap();

    let err = KnowledgeResource::new(&client)
        .delete(&KnowledgeModel {
            id: Some("k-1".into()),
            ..KnowledgeModel::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("failed to delete knowledge resource"));
}

#[tokio::test]
async fn test_update_without_id_fails_before_any_call() {
    let backend = MockHttpBackend::new();
    let client = ApiClient::new(backend, &config()).unwrap();

    let mut model = AgentModel {
        name: "deployer".into(),
        ..AgentModel::default()
    };
    let err = AgentResource::new(&client).update(&mut model).await.unwrap_err();
    assert!(matches!(err.root(), ProviderError::MissingId { resource: "agent" }));
}

#[tokio::test]
async fn test_agent_create_validates_runner_and_secrets() {
    let mut backend = MockHttpBackend::new();
    backend.expect_send().returning(|req| {
        if req.method == Method::GET {
            let body = match path(&req) {
                "/api/v2/users" => json!([{"uuid": "u-1", "email": "ada@acme.io"}]),
                "/api/v1/manage/groups" => json!([]),
                "/api/v3/runners" => json!([{"name": "edge"}]),
                "/api/v2/secrets" => json!([{"name": "GH_TOKEN"}]),
                "/api/v2/integrations" => json!([{"name": "github", "integration_type": "scm"}]),
                _ => return Ok(unexpected(&req)),
            };
            return Ok(respond(&req, 200, body));
        }
        assert_eq!(req.method, Method::POST);
        assert_eq!(path(&req), "/api/v1/agents");
        let mut body = req.json_body().expect("json body");
        assert_eq!(body["owners"], json!(["u-1"]));
        assert_eq!(body["runners"], json!(["edge"]));
        assert_eq!(body["ai_instructions"], json!("Ship it."));
        body["uuid"] = json!("a-42");
        Ok(respond(&req, 201, body))
    });
    let client = ApiClient::new(backend, &config()).unwrap();

    let created = AgentResource::new(&client)
        .create(&AgentModel {
            name: "deployer".into(),
            instructions: "Ship it.".into(),
            runner: "edge".into(),
            owners: vec!["ada@acme.io".into()],
            secrets: vec!["GH_TOKEN".into()],
            integrations: vec!["github".into()],
            ..AgentModel::default()
        })
        .await
        .expect("create succeeds");

    assert_eq!(created.id.as_deref(), Some("a-42"));
    assert_eq!(created.owners, vec!["ada@acme.io"]);
    assert_eq!(created.runner, "edge");
}

#[tokio::test]
async fn test_runner_update_create_failure_leaves_runner_absent() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = calls.clone();
    let mut backend = MockHttpBackend::new();
    backend.expect_send().returning(move |req| {
        log.lock().unwrap().push(format!("{} {}", req.method, path(&req)));
        match (req.method.clone(), path(&req)) {
            (Method::DELETE, "/api/v3/runners/edge") => Ok(respond(&req, 204, json!(null))),
            (Method::POST, "/api/v3/runners/edge") => {
                Ok(respond(&req, 500, json!({"error": "quota exceeded"})))
            }
            (Method::GET, "/api/v3/runners") => Ok(respond(&req, 200, json!([]))),
            _ => Ok(unexpected(&req)),
        }
    });
    let client = ApiClient::new(backend, &config()).unwrap();
    let runners = RunnerResource::new(&client);

    let mut model = RunnerModel {
        name: "edge".into(),
        namespace: Some("ci".into()),
        ..RunnerModel::default()
    };
    let err = runners.update(&mut model).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("failed to update runner resource"), "got: {msg}");
    assert!(msg.contains("500"), "got: {msg}");
    assert!(msg.contains("quota exceeded"), "got: {msg}");

    let err = runners.read(&mut model).await.unwrap_err();
    assert!(err.is_not_found(), "got: {err}");

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "DELETE /api/v3/runners/edge",
            "POST /api/v3/runners/edge",
            "GET /api/v3/runners",
        ]
    );
}

#[tokio::test]
async fn test_runner_create_keeps_manifest_url() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .withf(|req: &HttpRequest| {
            req.method == Method::POST
                && req.json_body() == Some(json!({"namespace": "ci"}))
        })
        .times(1)
        .returning(|req| {
            Ok(respond(
                &req,
                201,
                json!({"url": "https://manifests.test/edge.yaml"}),
            ))
        });
    let client = ApiClient::new(backend, &config()).unwrap();

    let created = RunnerResource::new(&client)
        .create(&RunnerModel {
            name: "edge".into(),
            namespace: Some("ci".into()),
            ..RunnerModel::default()
        })
        .await
        .expect("create succeeds");
    assert_eq!(created.manifest_url.as_deref(), Some("https://manifests.test/edge.yaml"));
    assert_eq!(created.name, "edge");
}

#[tokio::test]
async fn test_runner_delete_keeps_name_inside_one_path_segment() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .withf(|req: &HttpRequest| {
            let url = reqwest::Url::parse(&req.url).expect("valid url");
            req.method == Method::DELETE
                && url.path() == "/api/v3/runners/..%2F..%2Fv1%2Fagents%2Fa-1"
                && url.query().is_none()
        })
        .times(1)
        .returning(|req| Ok(respond(&req, 204, json!(null))));
    let client = ApiClient::new(backend, &config()).unwrap();

    RunnerResource::new(&client)
        .delete(&RunnerModel {
            name: "../../v1/agents/a-1".into(),
            ..RunnerModel::default()
        })
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn test_reserved_characters_in_ids_are_encoded() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .withf(|req: &HttpRequest| {
            let url = reqwest::Url::parse(&req.url).expect("valid url");
            url.path() == "/api/v1/agents/a-1%3Fforce%3Dtrue%23x"
                && url.query().is_none()
                && url.fragment().is_none()
        })
        .times(1)
        .returning(|req| Ok(respond(&req, 204, json!(null))));
    let client = ApiClient::new(backend, &config()).unwrap();

    AgentResource::new(&client)
        .delete(&AgentModel {
            id: Some("a-1?force=true#x".into()),
            ..AgentModel::default()
        })
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn test_dot_segment_names_are_rejected_before_any_call() {
    let backend = MockHttpBackend::new();
    let client = ApiClient::new(backend, &config()).unwrap();

    let err = RunnerResource::new(&client)
        .delete(&RunnerModel {
            name: "..".into(),
            ..RunnerModel::default()
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not a valid path segment"), "got: {err}");
}

fn slack_model(id: Option<&str>, channels: &[&str]) -> ExternalKnowledgeModel {
    ExternalKnowledgeModel {
        id: id.map(str::to_string),
        vendor: "slack".into(),
        config: DynamicValue::from(json!({"channel_ids": channels})),
        ..ExternalKnowledgeModel::default()
    }
}

#[tokio::test]
async fn test_external_knowledge_create_dispatches_to_vendor() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .withf(|req: &HttpRequest| {
            req.method == Method::POST
                && req.url == "http://platform.test/api/v1/external-knowledge/slack"
                && req.json_body() == Some(json!({"channel_ids": ["C1", "C2"]}))
        })
        .times(1)
        .returning(|req| {
            Ok(respond(
                &req,
                201,
                json!({"id": "ek-1", "org": "acme", "config": {"channel_ids": ["C1", "C2"]}}),
            ))
        });
    let client = ApiClient::new(backend, &config()).unwrap();

    let created = ExternalKnowledgeResource::new(&client)
        .create(&slack_model(None, &["C1", "C2"]))
        .await
        .expect("create succeeds");
    assert_eq!(created.id.as_deref(), Some("ek-1"));
    assert_eq!(created.org.as_deref(), Some("acme"));
    assert_eq!(
        created.config.to_config_map().unwrap().get("channel_ids"),
        Some(&DynamicValue::string_list(["C1", "C2"]))
    );
}

#[tokio::test]
async fn test_external_knowledge_rejects_unknown_vendor_and_bad_config_locally() {
    let backend = MockHttpBackend::new();
    let client = ApiClient::new(backend, &config()).unwrap();
    let resource = ExternalKnowledgeResource::new(&client);

    let mut unknown = slack_model(None, &["C1"]);
    unknown.vendor = "notion".into();
    let err = resource.create(&unknown).await.unwrap_err();
    assert!(matches!(err.root(), ProviderError::Dispatch(_)));
    assert!(err.to_string().contains("confluence, git, slack"), "got: {err}");

    let err = resource.create(&slack_model(None, &[])).await.unwrap_err();
    assert!(matches!(err.root(), ProviderError::Validation(_)));
}

#[tokio::test]
async fn test_external_knowledge_delete_treats_404_as_absent() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .withf(|req: &HttpRequest| req.method == Method::DELETE)
        .times(2)
        .returning(|req| {
            let status = if req.url.ends_with("/ek-gone") { 404 } else { 409 };
            Ok(respond(&req, status, json!({"error": "conflict"})))
        });
    let client = ApiClient::new(backend, &config()).unwrap();
    let resource = ExternalKnowledgeResource::new(&client);

    resource
        .delete(&slack_model(Some("ek-gone"), &["C1"]))
        .await
        .expect("404 means already deleted");

    let err = resource
        .delete(&slack_model(Some("ek-busy"), &["C1"]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("409"), "got: {err}");
}

#[tokio::test]
async fn test_external_knowledge_update_keeps_id_and_refreshes_config() {
    let mut backend = MockHttpBackend::new();
    backend
        .expect_send()
        .withf(|req: &HttpRequest| {
            req.method == Method::PUT
                && req.url.ends_with("/api/v1/external-knowledge/slack/ek-1")
        })
        .times(1)
        .returning(|req| {
            Ok(respond(
                &req,
                200,
                json!({"config": {"channel_ids": ["C3"]}, "updated_at": "2026-02-02T00:00:00Z"}),
            ))
        });
    let client = ApiClient::new(backend, &config()).unwrap();

    let mut model = slack_model(Some("ek-1"), &["C3"]);
    ExternalKnowledgeResource::new(&client)
        .update(&mut model)
        .await
        .expect("update succeeds");
    assert_eq!(model.id.as_deref(), Some("ek-1"));
    assert_eq!(model.updated_at.as_deref(), Some("2026-02-02T00:00:00Z"));
}
