//! Entry point the host process holds on to.
//!
//! A [`Provider`] owns one authenticated [`ApiClient`] and hands out
//! orchestrators that borrow it, one per lifecycle call.

use platform_provider_core::client::ApiClient;
use platform_provider_core::contract::HttpBackend;
use platform_provider_core::resources::{
    AgentResource, ExternalKnowledgeResource, KnowledgeResource, RunnerResource,
};
use platform_provider_core::vendor::VendorRegistry;
use platform_provider_core::{ProviderConfig, ProviderError};
use tracing::info;

use crate::backend::ReqwestBackend;

pub struct Provider<B = ReqwestBackend> {
    client: ApiClient<B>,
}

impl Provider<ReqwestBackend> {
    /// Builds the production backend and the client from a loaded configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let backend = ReqwestBackend::new()?;
        Self::with_backend(backend, config)
    }
}

impl<B: HttpBackend> Provider<B> {
    pub fn with_backend(backend: B, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = ApiClient::new(backend, config)?;
        info!(base_url = %client.base_url(), "Provider configured");
        Ok(Self { client })
    }

    pub fn client(&self) -> &ApiClient<B> {
        &self.client
    }

    pub fn knowledge(&self) -> KnowledgeResource<'_, B> {
        KnowledgeResource::new(&self.client)
    }

    pub fn external_knowledge(&self) -> ExternalKnowledgeResource<'_, B> {
        ExternalKnowledgeResource::new(&self.client)
    }

    /// External knowledge dispatching through a caller-built registry.
    pub fn external_knowledge_with<'a>(
        &'a self,
        registry: &'a VendorRegistry,
    ) -> ExternalKnowledgeResource<'a, B> {
        ExternalKnowledgeResource::with_registry(&self.client, registry)
    }

    pub fn agents(&self) -> AgentResource<'_, B> {
        AgentResource::new(&self.client)
    }

    pub fn runners(&self) -> RunnerResource<'_, B> {
        RunnerResource::new(&self.client)
    }
}
