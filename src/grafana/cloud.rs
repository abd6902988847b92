//! Grafana Cloud fleet: organisation-level resources and stack discovery.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::generate::catalog::{Catalog, Lister, ListerData, ResourceDescriptor};
use crate::generate::error::ListerError;
use crate::grafana::Client;

/// One Grafana Cloud stack
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stack {
    pub slug: String,
    pub url: String,
}

impl Stack {
    /// Environment label for the stack's pass, e.g. `stack-prod`
    pub fn label(&self) -> String {
        format!("stack-{}", self.slug)
    }
}

/// Finds the stacks a cloud configuration targets
#[async_trait]
pub trait StackDiscovery: Send + Sync {
    async fn list_stacks(&self, cancel: &CancellationToken) -> Result<Vec<Stack>, ListerError>;
}

#[derive(Debug, Deserialize)]
struct InstancesPage {
    items: Vec<Stack>,
}

async fn fetch_stacks(client: &Client, org: &str) -> Result<Vec<Stack>, ListerError> {
    let page: InstancesPage = client
        .get_json("/api/instances", &[("org", org.to_string())])
        .await?;

    let mut stacks = page.items;
    stacks.sort_by(|a, b| a.slug.cmp(&b.slug));
    stacks.dedup_by(|a, b| a.slug == b.slug);
    Ok(stacks)
}

/// Stack discovery through the grafana.com instances API
pub struct GrafanaComStacks {
    client: Client,
    org: String,
}

impl GrafanaComStacks {
    pub fn new(client: Client, org: impl Into<String>) -> Self {
        Self {
            client,
            org: org.into(),
        }
    }
}

#[async_trait]
impl StackDiscovery for GrafanaComStacks {
    async fn list_stacks(&self, cancel: &CancellationToken) -> Result<Vec<Stack>, ListerError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err("stack discovery was cancelled".into()),
            stacks = fetch_stacks(&self.client, &self.org) => stacks,
        }
    }
}

/// Lists the stacks of the organisation named in the lister data
pub struct StackLister;

#[async_trait]
impl Lister for StackLister {
    async fn list_ids(
        &self,
        _cancel: &CancellationToken,
        client: &Client,
        data: &ListerData,
    ) -> Result<Vec<String>, ListerError> {
        let org = data
            .cloud_org
            .as_deref()
            .ok_or("cloud organisation is required to list stacks")?;

        let stacks = fetch_stacks(client, org).await?;
        Ok(stacks.into_iter().map(|s| s.slug).collect())
    }
}

/// Every organisation-level resource type of Grafana Cloud
pub fn cloud_catalog() -> Catalog {
    Catalog::new(vec![
        ResourceDescriptor::new("grafana_cloud_stack", StackLister),
        // Access policies are regional and tokens are never readable back
        ResourceDescriptor::without_lister("grafana_cloud_access_policy"),
        ResourceDescriptor::without_lister("grafana_cloud_access_policy_token"),
    ])
}
