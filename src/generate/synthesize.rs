use lazy_static::lazy_static;
use regex::Regex;

use crate::generate::enumerate::ListedResource;
use crate::generate::filter::ResourceFilter;

/// Provider alias of the cloud pass; its resources are not name-prefixed
pub const DEFAULT_ENVIRONMENT_ALIAS: &str = "cloud";

/// Provider name every import block is bound to
pub const PROVIDER_NAME: &str = "grafana";

lazy_static! {
    static ref DISALLOWED_NAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
}

/// Declaration that a configuration address corresponds to an existing remote object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    pub resource_type: String,
    pub local_name: String,
    /// The identifier exactly as the remote system returned it
    pub remote_id: String,
    pub provider_alias: Option<String>,
}

impl ImportDirective {
    /// Target address, e.g. `grafana_folder.my_folder`
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.local_name)
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_name(id: &str) -> String {
    DISALLOWED_NAME_CHARS.replace_all(id, "_").into_owned()
}

/// Local name for a remote identifier in the environment behind `provider_alias`
///
/// Resource names must start with a letter or `_`, so a name that would
/// start with anything else (numeric team ids, for one) gets a leading `_`.
pub fn local_name(id: &str, provider_alias: Option<&str>) -> String {
    let name = sanitize_name(id);
    let name = match provider_alias {
        Some(alias) if !alias.is_empty() && alias != DEFAULT_ENVIRONMENT_ALIAS => {
            format!("{}_{}", sanitize_name(&alias.replace('-', "_")), name)
        }
        _ => name,
    };

    if name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name
    } else {
        format!("_{}", name)
    }
}

/// Build one import directive per listed identifier that passes `filter`
///
/// Identifiers rejected by the filter are dropped silently.
pub fn synthesize(
    listed: &[ListedResource],
    filter: &ResourceFilter,
    provider_alias: Option<&str>,
) -> Vec<ImportDirective> {
    let provider_alias = provider_alias.filter(|alias| !alias.is_empty());
    let mut directives = Vec::new();

    for resource in listed {
        for id in &resource.identifiers {
            let local_name = local_name(id, provider_alias);
            if !filter.matches_any_pattern(&resource.resource_type, &local_name) {
                tracing::debug!(
                    resource = %resource.resource_type,
                    name = %local_name,
                    "excluded by filter"
                );
                continue;
            }

            let directive = ImportDirective {
                resource_type: resource.resource_type.clone(),
                local_name,
                remote_id: id.clone(),
                provider_alias: provider_alias.map(str::to_string),
            };
            tracing::trace!(address = %directive.address(), id = %id, "import directive");
            directives.push(directive);
        }
    }

    directives
}
