use async_trait::async_trait;
use tracing::info;

use super::{failed, require_id, Orchestrator};
use crate::client::{item_path, ApiClient, ApiRequest};
use crate::codec::agent::{decode, encode, AgentWire, AGENT_DIRECTORY};
use crate::contract::HttpBackend;
use crate::directory::DirectoryCache;
use crate::error::{Action, ProviderError};
use crate::model::AgentModel;

const RESOURCE: &str = "agent";
const COLLECTION: &str = "/api/v1/agents";

pub struct AgentResource<'a, B> {
    client: &'a ApiClient<B>,
}

impl<'a, B: HttpBackend> AgentResource<'a, B> {
    pub fn new(client: &'a ApiClient<B>) -> Self {
        Self { client }
    }

    async fn directory(&self) -> Result<DirectoryCache, ProviderError> {
        DirectoryCache::load(self.client, &AGENT_DIRECTORY).await
    }

    async fn create_inner(&self, model: &AgentModel) -> Result<AgentModel, ProviderError> {
        let cache = self.directory().await?;
        let wire = encode(model, &cache).into_result()?;
        let request = ApiRequest::post(COLLECTION)
            .json(&wire)?
            .operation("agent.create");
        let created: AgentWire = self.client.send_json(request, RESOURCE).await?;
        if created.uuid.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::MissingField {
                resource: RESOURCE,
                field: "uuid",
            });
        }
        Ok(decode(created, &cache))
    }

    async fn read_inner(&self, model: &mut AgentModel) -> Result<(), ProviderError> {
        let id = require_id(RESOURCE, &model.id)?.to_string();
        let cache = self.directory().await?;
        let request = ApiRequest::get(item_path(COLLECTION, &id)?).operation("agent.read");
        let wire: AgentWire = self.client.send_json(request, RESOURCE).await?;
        *model = decode(wire, &cache);
        Ok(())
    }

    async fn update_inner(&self, model: &mut AgentModel) -> Result<(), ProviderError> {
        let id = require_id(RESOURCE, &model.id)?.to_string();
        let cache = self.directory().await?;
        let wire = encode(model, &cache).into_result()?;
        let request = ApiRequest::put(item_path(COLLECTION, &id)?)
            .json(&wire)?
            .operation("agent.update");
        let mut updated: AgentWire = self.client.send_json(request, RESOURCE).await?;
        if updated.uuid.is_none() {
            updated.uuid = Some(id);
        }
        *model = decode(updated, &cache);
        Ok(())
    }

    async fn delete_inner(&self, model: &AgentModel) -> Result<(), ProviderError> {
        let id = require_id(RESOURCE, &model.id)?;
        let request =
            ApiRequest::delete(item_path(COLLECTION, id)?).operation("agent.delete");
        self.client.send_checked(request).await?;
        Ok(())
    }
}

#[async_trait]
impl<'a, B: HttpBackend> Orchestrator for AgentResource<'a, B> {
    type Model = AgentModel;
    const RESOURCE: &'static str = RESOURCE;

    async fn create(&self, model: &AgentModel) -> Result<AgentModel, ProviderError> {
        info!(resource = RESOURCE, name = %model.name, "Creating resource");
        let created = self
            .create_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Create))?;
        info!(resource = RESOURCE, id = ?created.id, "Created resource");
        Ok(created)
    }

    async fn read(&self, model: &mut AgentModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, id = ?model.id, "Reading resource");
        self.read_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Read))
    }

    async fn update(&self, model: &mut AgentModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, id = ?model.id, "Updating resource");
        self.update_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Update))
    }

    async fn delete(&self, model: &AgentModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, id = ?model.id, "Deleting resource");
        self.delete_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Delete))
    }
}
