//! Concurrent listing of every resource type in a catalog.
//!
//! One task is spawned per descriptor. Tasks never cancel each other: a
//! failing lister is recorded and the others run to completion, so the join
//! barrier always sees the full picture before deciding the pass failed.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::generate::catalog::{Catalog, ListerData, ResourceDescriptor};
use crate::generate::error::{GenerateError, GenerateResult};
use crate::grafana::Client;

/// Outcome of listing one resource type
#[derive(Debug)]
pub struct EnumerationResult {
    pub descriptor: ResourceDescriptor,
    pub identifiers: GenerateResult<Vec<String>>,
}

/// Identifiers of one resource type after a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedResource {
    pub resource_type: String,
    pub identifiers: Vec<String>,
}

/// Run every lister of `catalog` concurrently and wait for all of them
///
/// Results come back ordered by descriptor name regardless of completion
/// order. Descriptors without a lister yield an empty identifier list.
pub async fn enumerate(
    catalog: &Catalog,
    cancel: &CancellationToken,
    client: &Client,
    data: &ListerData,
) -> Vec<EnumerationResult> {
    let mut handles = Vec::with_capacity(catalog.len());

    for descriptor in catalog.descriptors() {
        let descriptor = descriptor.clone();
        let cancel = cancel.clone();
        let client = client.clone();
        let data = data.clone();

        handles.push(tokio::spawn(async move {
            let identifiers = list_one(&descriptor, &cancel, &client, &data).await;
            EnumerationResult {
                descriptor,
                identifiers,
            }
        }));
    }

    let joined = join_all(handles).await;

    let mut results: Vec<EnumerationResult> = joined
        .into_iter()
        .zip(catalog.descriptors())
        .map(|(joined, descriptor)| {
            joined.unwrap_or_else(|e| EnumerationResult {
                descriptor: descriptor.clone(),
                identifiers: Err(GenerateError::ListerFailure {
                    resource: descriptor.name.clone(),
                    source: format!("lister task panicked: {}", e).into(),
                }),
            })
        })
        .collect();

    results.sort_by(|a, b| a.descriptor.name.cmp(&b.descriptor.name));
    results
}

async fn list_one(
    descriptor: &ResourceDescriptor,
    cancel: &CancellationToken,
    client: &Client,
    data: &ListerData,
) -> GenerateResult<Vec<String>> {
    let Some(lister) = &descriptor.lister else {
        tracing::debug!(resource = %descriptor.name, "skipping resource type without a lister");
        return Ok(Vec::new());
    };

    tracing::info!(resource = %descriptor.name, environment = %data.environment, "generating resources");

    let identifiers = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(GenerateError::Cancelled {
                resource: descriptor.name.clone(),
            });
        }
        listed = lister.list_ids(cancel, client, data) => listed,
    };

    match identifiers {
        Ok(ids) => {
            tracing::info!(resource = %descriptor.name, count = ids.len(), "finished listing resources");
            Ok(ids)
        }
        Err(source) => {
            tracing::warn!(resource = %descriptor.name, error = %source, "lister failed");
            Err(GenerateError::ListerFailure {
                resource: descriptor.name.clone(),
                source,
            })
        }
    }
}

/// Turn a pass's results into identifiers, or the first failure in catalog order
///
/// A pass is all-or-nothing: one failure discards every other result.
pub fn collect_results(mut results: Vec<EnumerationResult>) -> GenerateResult<Vec<ListedResource>> {
    results.sort_by(|a, b| a.descriptor.name.cmp(&b.descriptor.name));

    let mut listed = Vec::with_capacity(results.len());
    for result in results {
        let identifiers = result.identifiers?;
        listed.push(ListedResource {
            resource_type: result.descriptor.name,
            identifiers,
        });
    }

    Ok(listed)
}
