use async_trait::async_trait;
use tracing::info;

use super::{failed, require_id, Orchestrator};
use crate::client::{item_path, ApiClient, ApiRequest};
use crate::codec::knowledge::{decode, encode, KnowledgeWire};
use crate::codec::ListBody;
use crate::contract::HttpBackend;
use crate::directory::DirectoryCache;
use crate::error::{Action, ProviderError};
use crate::model::KnowledgeModel;

const RESOURCE: &str = "knowledge";
const COLLECTION: &str = "/api/v1/knowledge";

pub struct KnowledgeResource<'a, B> {
    client: &'a ApiClient<B>,
}

impl<'a, B: HttpBackend> KnowledgeResource<'a, B> {
    pub fn new(client: &'a ApiClient<B>) -> Self {
        Self { client }
    }

    async fn fetch_by_id(&self, id: &str) -> Result<KnowledgeWire, ProviderError> {
        let request = ApiRequest::get(item_path(COLLECTION, id)?).operation("knowledge.read");
        self.client.send_json(request, RESOURCE).await
    }

    // No lookup-by-name endpoint exists, so scan the collection.
    async fn fetch_by_name(&self, name: &str) -> Result<KnowledgeWire, ProviderError> {
        let request = ApiRequest::get(COLLECTION).operation("knowledge.list");
        let entries: ListBody<KnowledgeWire> = self
            .client
            .send_json(request, "knowledge list")
            .await?;
        entries
            .into_vec()
            .into_iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ProviderError::NotFound {
                resource: RESOURCE,
                key: name.to_string(),
            })
    }

    async fn create_inner(&self, model: &KnowledgeModel) -> Result<KnowledgeModel, ProviderError> {
        let cache = DirectoryCache::snapshot(self.client).await?;
        let wire = encode(model, &cache).into_result()?;

        let request = self.client.legacy_scope(
            ApiRequest::post(COLLECTION)
                .json(&wire)?
                .operation("knowledge.create"),
        );
        let created: KnowledgeWire = self.client.send_json(request, RESOURCE).await?;
        if created.uuid.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::MissingField {
                resource: RESOURCE,
                field: "uuid",
            });
        }
        Ok(decode(created, &cache))
    }

    async fn read_inner(&self, model: &mut KnowledgeModel) -> Result<(), ProviderError> {
        let cache = DirectoryCache::snapshot(self.client).await?;
        let wire = match model.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self.fetch_by_id(id).await?,
            None => self.fetch_by_name(&model.name).await?,
        };
        *model = decode(wire, &cache);
        Ok(())
    }

    async fn update_inner(&self, model: &mut KnowledgeModel) -> Result<(), ProviderError> {
        let id = require_id(RESOURCE, &model.id)?.to_string();
        let cache = DirectoryCache::snapshot(self.client).await?;
        let wire = encode(model, &cache).into_result()?;

        let request = ApiRequest::put(item_path(COLLECTION, &id)?)
            .json(&wire)?
            .operation("knowledge.update");
        let mut updated: KnowledgeWire = self.client.send_json(request, RESOURCE).await?;
        if updated.uuid.is_none() {
            updated.uuid = Some(id);
        }
        *model = decode(updated, &cache);
        Ok(())
    }

    async fn delete_inner(&self, model: &KnowledgeModel) -> Result<(), ProviderError> {
        let id = require_id(RESOURCE, &model.id)?;
        let request =
            ApiRequest::delete(item_path(COLLECTION, id)?).operation("knowledge.delete");
        self.client.send_checked(request).await?;
        Ok(())
    }
}

#[async_trait]
impl<'a, B: HttpBackend> Orchestrator for KnowledgeResource<'a, B> {
    type Model = KnowledgeModel;
    const RESOURCE: &'static str = RESOURCE;

    async fn create(&self, model: &KnowledgeModel) -> Result<KnowledgeModel, ProviderError> {
        info!(resource = RESOURCE, name = %model.name, "Creating resource");
        let created = self
            .create_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Create))?;
        info!(resource = RESOURCE, id = ?created.id, "Created resource");
        Ok(created)
    }

    async fn read(&self, model: &mut KnowledgeModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, id = ?model.id, name = %model.name, "Reading resource");
        self.read_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Read))
    }

    async fn update(&self, model: &mut KnowledgeModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, id = ?model.id, "Updating resource");
        self.update_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Update))
    }

    async fn delete(&self, model: &KnowledgeModel) -> Result<(), ProviderError> {
        info!(resource = RESOURCE, id = ?model.id, "Deleting resource");
        self.delete_inner(model)
            .await
            .map_err(failed(RESOURCE, Action::Delete))
    }
}
