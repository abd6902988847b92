//! Resource types of a single Grafana instance and how to list them.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

use crate::generate::catalog::{Catalog, Lister, ListerData, ResourceDescriptor};
use crate::generate::error::ListerError;
use crate::grafana::Client;

/// How an endpoint splits its results into pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Everything comes back in one response
    None,
    /// `<size_param>=<size>&<page_param>=<n>` starting at page 1
    Page {
        size_param: &'static str,
        page_param: &'static str,
        size: usize,
    },
}

impl Pagination {
    /// Whether another page should be requested after one that returned
    /// `batch_len` items, `new_ids` of them not seen before
    ///
    /// A full page of already known ids means the server ignored the page
    /// parameter, so listing stops there.
    pub fn has_more(&self, batch_len: usize, new_ids: usize) -> bool {
        match self {
            Pagination::None => false,
            Pagination::Page { size, .. } => batch_len >= *size && new_ids > 0,
        }
    }
}

/// Lists identifiers from a JSON collection endpoint
///
/// `items` is a JSON pointer to the array inside the response (empty for a
/// top-level array) and `id_field` the member holding the identifier.
/// Identifiers come back sorted and de-duplicated.
#[derive(Debug, Clone)]
pub struct EndpointLister {
    path: &'static str,
    query: &'static [(&'static str, &'static str)],
    items: &'static str,
    id_field: &'static str,
    pagination: Pagination,
}

impl EndpointLister {
    pub const fn new(path: &'static str, items: &'static str, id_field: &'static str) -> Self {
        Self {
            path,
            query: &[],
            items,
            id_field,
            pagination: Pagination::None,
        }
    }

    pub const fn with_query(mut self, query: &'static [(&'static str, &'static str)]) -> Self {
        self.query = query;
        self
    }

    pub const fn paginated(
        mut self,
        size_param: &'static str,
        page_param: &'static str,
        size: usize,
    ) -> Self {
        self.pagination = Pagination::Page {
            size_param,
            page_param,
            size,
        };
        self
    }
}

#[async_trait]
impl Lister for EndpointLister {
    async fn list_ids(
        &self,
        cancel: &CancellationToken,
        client: &Client,
        _data: &ListerData,
    ) -> Result<Vec<String>, ListerError> {
        let mut ids = BTreeSet::new();
        let mut page = 1usize;

        loop {
            if cancel.is_cancelled() {
                return Err(format!("listing {} was cancelled", self.path).into());
            }

            let mut query: Vec<(&str, String)> = self
                .query
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect();
            if let Pagination::Page {
                size_param,
                page_param,
                size,
            } = self.pagination
            {
                query.push((size_param, size.to_string()));
                query.push((page_param, page.to_string()));
            }

            let response: Value = client.get_json(self.path, &query).await?;
            let batch = extract_ids(&response, self.items, self.id_field)?;
            let batch_len = batch.len();
            let known = ids.len();
            ids.extend(batch);

            if !self.pagination.has_more(batch_len, ids.len() - known) {
                break;
            }
            page += 1;
        }

        Ok(ids.into_iter().collect())
    }
}

/// Pull `id_field` out of every element of the array at `items`
pub fn extract_ids(response: &Value, items: &str, id_field: &str) -> Result<Vec<String>, ListerError> {
    let array = response
        .pointer(items)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("response has no array at {:?}", items))?;

    array
        .iter()
        .map(|item| match item.get(id_field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(format!("item without a {:?} field: {}", id_field, item).into()),
        })
        .collect()
}

const FOLDERS: EndpointLister =
    EndpointLister::new("/api/folders", "", "uid").paginated("limit", "page", 1000);
const DASHBOARDS: EndpointLister = EndpointLister::new("/api/search", "", "uid")
    .with_query(&[("type", "dash-db")])
    .paginated("limit", "page", 5000);
const DATA_SOURCES: EndpointLister = EndpointLister::new("/api/datasources", "", "uid");
const TEAMS: EndpointLister =
    EndpointLister::new("/api/teams/search", "/teams", "id").paginated("perpage", "page", 1000);
const SERVICE_ACCOUNTS: EndpointLister =
    EndpointLister::new("/api/serviceaccounts/search", "/serviceAccounts", "id")
        .paginated("perpage", "page", 1000);
const LIBRARY_PANELS: EndpointLister =
    EndpointLister::new("/api/library-elements", "/result/elements", "uid")
        .with_query(&[("kind", "1")])
        .paginated("perPage", "page", 100);
const PLAYLISTS: EndpointLister = EndpointLister::new("/api/playlists", "", "uid");
const CONTACT_POINTS: EndpointLister =
    EndpointLister::new("/api/v1/provisioning/contact-points", "", "name");
const MESSAGE_TEMPLATES: EndpointLister =
    EndpointLister::new("/api/v1/provisioning/templates", "", "name");

/// Every resource type of a Grafana instance
pub fn grafana_catalog() -> Catalog {
    Catalog::new(vec![
        ResourceDescriptor::new("grafana_folder", FOLDERS),
        ResourceDescriptor::new("grafana_dashboard", DASHBOARDS),
        ResourceDescriptor::new("grafana_data_source", DATA_SOURCES),
        ResourceDescriptor::new("grafana_team", TEAMS),
        ResourceDescriptor::new("grafana_service_account", SERVICE_ACCOUNTS),
        ResourceDescriptor::new("grafana_library_panel", LIBRARY_PANELS),
        ResourceDescriptor::new("grafana_playlist", PLAYLISTS),
        ResourceDescriptor::new("grafana_contact_point", CONTACT_POINTS),
        ResourceDescriptor::new("grafana_message_template", MESSAGE_TEMPLATES),
        // Permission-style resources hang off their parent and have no listing endpoint
        ResourceDescriptor::without_lister("grafana_folder_permission"),
        ResourceDescriptor::without_lister("grafana_dashboard_permission"),
        ResourceDescriptor::without_lister("grafana_data_source_permission"),
        ResourceDescriptor::without_lister("grafana_notification_policy"),
    ])
}
