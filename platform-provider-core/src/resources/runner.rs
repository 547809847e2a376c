use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{failed, Orchestrator};
use crate::client::{item_path, ApiClient, ApiRequest};
use crate::codec::ListBody;
use crate::contract::HttpBackend;
use crate::error::{Action, ProviderError};
use crate::model::RunnerModel;

const RESOURCE: &str = "runner";
const COLLECTION: &str = "/api/v3/runners";

#[derive(Debug, Serialize)]
struct RunnerCreateRequest<'m> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'m str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'m str>,
}

#[derive(Debug, Deserialize)]
struct RunnerCreated {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunnerWire {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Runners have neither a single-item lookup nor an update endpoint: reads
/// scan the collection and updates delete, then re-create.
pub struct RunnerResource<'a, B> {
    client: &'a ApiClient<B>,
}

impl<'a, B: HttpBackend> RunnerResource<'a, B> {
    pub fn new(client: &'a ApiClient<B>) -> Self {
        Self { client }
    }

    fn require_name(model: &RunnerModel) -> Result<&str, ProviderError> {
        if model.name.trim().is_empty() {
            return Err(ProviderError::MissingId { resource: RESOURCE });
        }
        Ok(&model.name)
    }

    async fn create_inner(&self, model: &RunnerModel) -> Result<RunnerModel, ProviderError> {
        let name = Self::require_name(model)?;
        let body = RunnerCreateRequest {
            description: model.description.as_deref(),
            namespace: model.namespace.as_deref(),
        };
        let request = ApiRequest::post(item_path(COLLECTION, name)?)
            .json(&body)?
            .operation("runner.create");
        let created: RunnerCreated = self.client.send_json(request, RESOURCE).await?;

        Ok(RunnerModel {
            manifest_url: created.url,
            ..model.clone()
        })
    }

    async fn read_inner(&self, model: &mut RunnerModel) -> Result<(), ProviderError> {
        let name = Self::require_name(model)?.to_string();
        let request = ApiRequest::get(COLLECTION).operation("runner.list");
        let runners: ListBody<RunnerWire> = self.client.send_json(request, "runner list").await?;
        let found = runners
            .into_vec()
            .into_iter()
            .find(|runner| runner.name == name)
            .ok_or(ProviderError::NotFound {
                resource: RESOURCE,
                key: name,
            })?;

        model.name = found.name;
        model.description = found.description;
        model.namespace = found.namespace;
        model.version = found.version;
        model.status = found.status;
        Ok(())
    }

    async fn delete_inner(&self, model: &RunnerModel) -> Result<(), ProviderError> {
        let name = Self::require_name(model)?;
        let request =
            ApiRequest::delete(item_path(COLLECTION, name)?).operation("runner.delete");
        self.client.send_checked(request).await?;
        Ok(())
    }

    // Not atomic: a failed create after a successful delete leaves the runner absent.
    async fn update_inner(&self, model: &mut RunnerModel) -> Result<(), ProviderError> {
        self.delete_inner(model).await?;
        match self.create_inner(model).await {
            Ok(created) => {
                *model = created;
                Ok(())
            }
            Err(e) => {
                error!(
                    resource = RESOURCE,
                    name = %model.name,
                    error = %e,
                    "Runner was deleted but re-creation failed; it is now absent remotely"
                );
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<'a, B: HttpBackend> Orchestrator for RunnerResource<'a, B> {
    type Model = RunnerModel;
    const RESOURCE: &'static str = RESOURCE;

    async fn create(&self, model: &RunnerModel) -> Result<RunnerModel, ProviderError> {
        info!(resource = RESOURCE, name = %model.name, "Creating resource");
        let created = self
            .create_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Create))?;
        info!(resource = RESOURCE, name = %created.name, "Created resource");
        Ok(created)
    }

    async fn read(&self, model: &mut RunnerModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, name = %model.name, "Reading resource");
        self.read_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Read))
    }

    async fn update(&self, model: &mut RunnerModel) -> Result<(), ProviderError> {
        warn!(
            resource = RESOURCE,
            name = %model.name,
            "No update endpoint, replacing via delete then create"
        );
        self.update_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Update))
    }

    async fn delete(&self, model: &RunnerModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, name = %model.name, "Deleting resource");
        self.delete_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Delete))
    }
}
