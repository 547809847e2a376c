//! Directory Cache: a per-operation snapshot of reference entities.
//!
//! Declarative models refer to users, groups, agents and friends by the
//! name a human would type; the wire wants stable identifiers. A
//! [`DirectoryCache`] is fetched at the start of an operation, used for every
//! lookup in that operation, and dropped at the end. It is never shared
//! between operations.
//!
//! Resolution tries identifiers first, then exact (case-sensitive) display
//! names. The first match wins; an ambiguous display name only logs a warning.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{ApiClient, ApiRequest};
use crate::codec::ListBody;
use crate::contract::HttpBackend;
use crate::error::{AggregateError, ProviderError, ResolutionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Group,
    Agent,
    Runner,
    Secret,
    Integration,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::User,
        EntityKind::Group,
        EntityKind::Agent,
        EntityKind::Runner,
        EntityKind::Secret,
        EntityKind::Integration,
    ];

    /// List endpoint the entities are fetched from.
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::User => "/api/v2/users",
            EntityKind::Group => "/api/v1/manage/groups",
            EntityKind::Agent => "/api/v1/agents",
            EntityKind::Runner => "/api/v3/runners",
            EntityKind::Secret => "/api/v2/secrets",
            EntityKind::Integration => "/api/v2/integrations",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::User => "user",
            EntityKind::Group => "group",
            EntityKind::Agent => "agent",
            EntityKind::Runner => "runner",
            EntityKind::Secret => "secret",
            EntityKind::Integration => "integration",
        };
        f.write_str(s)
    }
}

/// Anything that can be looked up by identifier or display name.
pub trait DirectoryEntry {
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub uuid: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl DirectoryEntry for UserEntry {
    fn id(&self) -> &str {
        &self.uuid
    }

    fn display_name(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub uuid: String,
    pub name: String,
}

impl DirectoryEntry for GroupEntry {
    fn id(&self) -> &str {
        &self.uuid
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub uuid: String,
    pub name: String,
}

impl DirectoryEntry for AgentEntry {
    fn id(&self) -> &str {
        &self.uuid
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// Runners, secrets and integrations are keyed by name on the wire.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerEntry {
    pub name: String,
}

impl DirectoryEntry for RunnerEntry {
    fn id(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretEntry {
    pub name: String,
}

impl DirectoryEntry for SecretEntry {
    fn id(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEntry {
    pub name: String,
    #[serde(default)]
    pub integration_type: Option<String>,
}

impl DirectoryEntry for IntegrationEntry {
    fn id(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Aggregate snapshot of reference entities. Kinds that were not loaded stay empty.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCache {
    pub users: Vec<UserEntry>,
    pub groups: Vec<GroupEntry>,
    pub agents: Vec<AgentEntry>,
    pub runners: Vec<RunnerEntry>,
    pub secrets: Vec<SecretEntry>,
    pub integrations: Vec<IntegrationEntry>,
}

impl DirectoryCache {
    /// Users, groups and agents: everything the knowledge codec needs.
    pub async fn snapshot<B: HttpBackend>(client: &ApiClient<B>) -> Result<Self, ProviderError> {
        Self::load(
            client,
            &[EntityKind::User, EntityKind::Group, EntityKind::Agent],
        )
        .await
    }

    /// Fetches the requested kinds one after the other.
    pub async fn load<B: HttpBackend>(
        client: &ApiClient<B>,
        kinds: &[EntityKind],
    ) -> Result<Self, ProviderError> {
        let mut cache = DirectoryCache::default();
        for kind in kinds {
            match kind {
                EntityKind::User => cache.users = fetch(client, *kind).await?,
                EntityKind::Group => cache.groups = fetch(client, *kind).await?,
                EntityKind::Agent => cache.agents = fetch(client, *kind).await?,
                EntityKind::Runner => cache.runners = fetch(client, *kind).await?,
                EntityKind::Secret => cache.secrets = fetch(client, *kind).await?,
                EntityKind::Integration => cache.integrations = fetch(client, *kind).await?,
            }
        }
        info!(
            users = cache.users.len(),
            groups = cache.groups.len(),
            agents = cache.agents.len(),
            runners = cache.runners.len(),
            secrets = cache.secrets.len(),
            integrations = cache.integrations.len(),
            "Directory snapshot loaded"
        );
        Ok(cache)
    }

    fn entries(&self, kind: EntityKind) -> Vec<(&str, &str)> {
        fn pairs<E: DirectoryEntry>(items: &[E]) -> Vec<(&str, &str)> {
            items.iter().map(|e| (e.id(), e.display_name())).collect()
        }
        match kind {
            EntityKind::User => pairs(&self.users),
            EntityKind::Group => pairs(&self.groups),
            EntityKind::Agent => pairs(&self.agents),
            EntityKind::Runner => pairs(&self.runners),
            EntityKind::Secret => pairs(&self.secrets),
            EntityKind::Integration => pairs(&self.integrations),
        }
    }

    /// Resolves an identifier or display name to an identifier. A blank
    /// token never resolves.
    pub fn resolve(&self, kind: EntityKind, token: &str) -> Result<String, ResolutionError> {
        let missing = || ResolutionError {
            kind,
            token: token.to_string(),
        };
        if token.trim().is_empty() {
            return Err(missing());
        }
        let entries = self.entries(kind);
        if let Some((id, _)) = entries.iter().find(|(id, _)| *id == token) {
            return Ok((*id).to_string());
        }

        let mut by_name = entries.iter().filter(|(_, name)| *name == token);
        match by_name.next() {
            Some((id, _)) => {
                if by_name.next().is_some() {
                    warn!(
                        %kind,
                        name = token,
                        chosen = *id,
                        "Ambiguous display name, using first match"
                    );
                }
                Ok((*id).to_string())
            }
            None => Err(missing()),
        }
    }

    /// Display name for an identifier, if the snapshot still knows it.
    pub fn name_of(&self, kind: EntityKind, id: &str) -> Option<&str> {
        self.entries(kind)
            .into_iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, name)| name)
    }

    /// Maps identifiers back to display names, silently dropping stale ones.
    pub fn names_of(&self, kind: EntityKind, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.name_of(kind, id).map(str::to_string))
            .collect()
    }
}

async fn fetch<B: HttpBackend, T: DeserializeOwned>(
    client: &ApiClient<B>,
    kind: EntityKind,
) -> Result<Vec<T>, ProviderError> {
    let request = ApiRequest::get(kind.path()).operation(format!("directory.{kind}"));
    let body: ListBody<T> = client
        .send_json(request, &format!("{kind} directory"))
        .await?;
    Ok(body.into_vec())
}

/// Resolves many references against one snapshot, collecting every failure.
pub struct Resolver<'a> {
    cache: &'a DirectoryCache,
    errors: AggregateError,
}

impl<'a> Resolver<'a> {
    pub fn new(cache: &'a DirectoryCache) -> Self {
        Self {
            cache,
            errors: AggregateError::default(),
        }
    }

    pub fn resolve(&mut self, kind: EntityKind, token: &str) -> Option<String> {
        match self.cache.resolve(kind, token) {
            Ok(id) => Some(id),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    /// Resolves every token, keeping the successes in order.
    pub fn resolve_all(&mut self, kind: EntityKind, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .filter_map(|token| self.resolve(kind, token))
            .collect()
    }

    /// Checks that a name-keyed entity exists and keeps the caller's token.
    pub fn require(&mut self, kind: EntityKind, token: &str) -> bool {
        self.resolve(kind, token).is_some()
    }

    pub fn finish(self) -> AggregateError {
        self.errors
    }
}
