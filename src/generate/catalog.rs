use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::generate::error::ListerError;
use crate::grafana::Client;

/// Environment-specific arguments handed to every lister of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListerData {
    /// Label of the environment being enumerated (empty for a direct Grafana instance)
    pub environment: String,
    /// Grafana Cloud organisation slug, set for cloud passes
    pub cloud_org: Option<String>,
}

impl ListerData {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            cloud_org: None,
        }
    }

    pub fn with_cloud_org(mut self, org: impl Into<String>) -> Self {
        self.cloud_org = Some(org.into());
        self
    }
}

/// Enumerates the remote identifiers of one resource type
#[async_trait]
pub trait Lister: Send + Sync {
    /// List every identifier of the resource type
    ///
    /// Implementations should return promptly once `cancel` fires.
    async fn list_ids(
        &self,
        cancel: &CancellationToken,
        client: &Client,
        data: &ListerData,
    ) -> Result<Vec<String>, ListerError>;
}

/// One supported Terraform resource type
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub name: String,
    pub lister: Option<Arc<dyn Lister>>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, lister: impl Lister + 'static) -> Self {
        Self {
            name: name.into(),
            lister: Some(Arc::new(lister)),
        }
    }

    /// A resource type that cannot be enumerated
    pub fn without_lister(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lister: None,
        }
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.name)
            .field("has_lister", &self.lister.is_some())
            .finish()
    }
}

/// Immutable, name-ordered table of supported resource types
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    descriptors: Vec<ResourceDescriptor>,
}

impl Catalog {
    /// Build a catalog; descriptors are ordered by name
    pub fn new(mut descriptors: Vec<ResourceDescriptor>) -> Self {
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// A new catalog holding only the descriptors accepted by `keep`
    pub fn retain<F>(&self, mut keep: F) -> Catalog
    where
        F: FnMut(&ResourceDescriptor) -> bool,
    {
        Catalog {
            descriptors: self
                .descriptors
                .iter()
                .filter(|d| keep(d))
                .cloned()
                .collect(),
        }
    }
}
