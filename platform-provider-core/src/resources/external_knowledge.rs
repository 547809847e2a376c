use async_trait::async_trait;
use tracing::{debug, info};

use super::{failed, require_id, Orchestrator};
use crate::client::{item_path, ApiClient, ApiRequest};
use crate::contract::HttpBackend;
use crate::error::{Action, ProviderError, TransportError};
use crate::model::ExternalKnowledgeModel;
use crate::vendor::{registry, Vendor, VendorRegistry, VendorStrategy};

const RESOURCE: &str = "external knowledge";

const COLLECTION: &str = "/api/v1/external-knowledge";

fn collection(vendor: &str) -> Result<String, TransportError> {
    item_path(COLLECTION, vendor)
}

fn item(vendor: &str, id: &str) -> Result<String, TransportError> {
    item_path(&collection(vendor)?, id)
}

/// Orchestrates external knowledge, delegating every vendor-specific shape
/// to the strategy registered under the model's `vendor` key.
pub struct ExternalKnowledgeResource<'a, B> {
    client: &'a ApiClient<B>,
    registry: &'a VendorRegistry,
}

impl<'a, B: HttpBackend> ExternalKnowledgeResource<'a, B> {
    /// Dispatches through the process-wide registry.
    pub fn new(client: &'a ApiClient<B>) -> Self {
        Self::with_registry(client, registry())
    }

    pub fn with_registry(client: &'a ApiClient<B>, registry: &'a VendorRegistry) -> Self {
        Self { client, registry }
    }

    /// Every external knowledge entry of one vendor.
    pub async fn list(&self, vendor: &str) -> Result<Vec<ExternalKnowledgeModel>, ProviderError> {
        info!(resource = RESOURCE, vendor, "Listing resources");
        self.list_inner(vendor)
            .await
            .map_err(failed(RESOURCE, Action::List))
    }

    async fn list_inner(&self, vendor: &str) -> Result<Vec<ExternalKnowledgeModel>, ProviderError> {
        let strategy = self.registry.lookup(vendor)?;
        let request = ApiRequest::get(collection(strategy.name())?)
            .operation(format!("external_knowledge.{}.list", strategy.name()));
        let mut reader = self.client.send_reader(request).await?;
        strategy.parse_list_response(&mut reader)
    }

    fn strategy_for(&self, model: &ExternalKnowledgeModel) -> Result<&'a Vendor, ProviderError> {
        Ok(self.registry.lookup(&model.vendor)?)
    }

    async fn create_inner(
        &self,
        model: &ExternalKnowledgeModel,
    ) -> Result<ExternalKnowledgeModel, ProviderError> {
        let strategy = self.strategy_for(model)?;
        let config = model.config.to_config_map()?;
        strategy.validate_config(&config)?;
        let payload = strategy.prepare_create_request(&config)?;
        debug!(vendor = strategy.name(), payload = %payload, "Prepared vendor create payload");

        let request = ApiRequest::post(collection(strategy.name())?)
            .json(&payload)?
            .operation(format!("external_knowledge.{}.create", strategy.name()));
        let mut reader = self.client.send_reader(request).await?;
        strategy.parse_create_response(&mut reader)
    }

    async fn read_inner(&self, model: &mut ExternalKnowledgeModel) -> Result<(), ProviderError> {
        let strategy = self.strategy_for(model)?;
        let id = require_id(RESOURCE, &model.id)?;
        let request = ApiRequest::get(item(strategy.name(), id)?)
            .operation(format!("external_knowledge.{}.read", strategy.name()));
        let mut reader = self.client.send_reader(request).await?;
        *model = strategy.parse_read_response(&mut reader)?;
        Ok(())
    }

    async fn update_inner(&self, model: &mut ExternalKnowledgeModel) -> Result<(), ProviderError> {
        let strategy = self.strategy_for(model)?;
        let id = require_id(RESOURCE, &model.id)?.to_string();
        let config = model.config.to_config_map()?;
        strategy.validate_config(&config)?;
        let payload = strategy.prepare_update_request(&config)?;
        debug!(vendor = strategy.name(), payload = %payload, "Prepared vendor update payload");

        let request = ApiRequest::put(item(strategy.name(), &id)?)
            .json(&payload)?
            .operation(format!("external_knowledge.{}.update", strategy.name()));
        let mut reader = self.client.send_reader(request).await?;
        strategy.parse_update_response(&mut reader, model)
    }

    async fn delete_inner(&self, model: &ExternalKnowledgeModel) -> Result<(), ProviderError> {
        let strategy = self.strategy_for(model)?;
        let id = require_id(RESOURCE, &model.id)?;
        let request = ApiRequest::delete(item(strategy.name(), id)?)
            .operation(format!("external_knowledge.{}.delete", strategy.name()));
        let response = self.client.send_raw(request).await?;
        match response.status {
            404 => {
                info!(resource = RESOURCE, id, "Already absent, nothing to delete");
                Ok(())
            }
            status if status >= 400 => Err(TransportError::Status {
                body: response.text(),
                url: response.url,
                status,
            }
            .into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<'a, B: HttpBackend> Orchestrator for ExternalKnowledgeResource<'a, B> {
    type Model = ExternalKnowledgeModel;
    const RESOURCE: &'static str = RESOURCE;

    async fn create(
        &self,
        model: &ExternalKnowledgeModel,
    ) -> Result<ExternalKnowledgeModel, ProviderError> {
        info!(resource = RESOURCE, vendor = %model.vendor, "Creating resource");
        let created = self
            .create_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Create))?;
        info!(resource = RESOURCE, vendor = %created.vendor, id = ?created.id, "Created resource");
        Ok(created)
    }

    async fn read(&self, model: &mut ExternalKnowledgeModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, vendor = %model.vendor, id = ?model.id, "Reading resource");
        self.read_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Read))
    }

    async fn update(&self, model: &mut ExternalKnowledgeModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, vendor = %model.vendor, id = ?model.id, "Updating resource");
        self.update_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Update))
    }

    async fn delete(&self, model: &ExternalKnowledgeModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, vendor = %model.vendor, id = ?model.id, "Deleting resource");
        self.delete_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Delete))
    }
}
