//! Inclusion filters of the form `<type>.<name>`.
//!
//! Both halves are shell-style globs (`*`, `?`, `[...]`). The type half
//! selects which resource types get enumerated at all; the whole pattern is
//! then matched against `<type>.<local name>` for each discovered resource.
//! `**` is only accepted on its own, so `grafana_**.x` is malformed.

use glob::Pattern;

use crate::generate::catalog::Catalog;
use crate::generate::error::{GenerateError, GenerateResult};

#[derive(Debug, Clone)]
struct IncludePattern {
    type_glob: Pattern,
    full_glob: Pattern,
}

/// Compiled inclusion filter. An empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    patterns: Vec<IncludePattern>,
}

impl ResourceFilter {
    /// Compile the user supplied patterns, rejecting malformed ones up front
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> GenerateResult<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| compile(raw.as_ref()))
            .collect::<GenerateResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any pattern's type half matches `resource_type`
    pub fn matches_type(&self, resource_type: &str) -> bool {
        self.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.type_glob.matches(resource_type))
    }

    /// Whether any pattern matches `<resource_type>.<local_name>`
    pub fn matches_any_pattern(&self, resource_type: &str, local_name: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        let address = format!("{}.{}", resource_type, local_name);
        self.patterns.iter().any(|p| p.full_glob.matches(&address))
    }
}

fn compile(raw: &str) -> GenerateResult<IncludePattern> {
    let malformed = |reason: String| GenerateError::MalformedPattern {
        pattern: raw.to_string(),
        reason,
    };

    let Some((type_part, _)) = raw.split_once('.') else {
        return Err(malformed("not in the format <type>.<name>".to_string()));
    };

    let type_glob = Pattern::new(type_part).map_err(|e| malformed(e.to_string()))?;
    let full_glob = Pattern::new(raw).map_err(|e| malformed(e.to_string()))?;

    Ok(IncludePattern {
        type_glob,
        full_glob,
    })
}

/// Narrow the catalog to the resource types selected by `filter`
///
/// With an empty filter the catalog is returned unchanged.
pub fn filter_resources(catalog: &Catalog, filter: &ResourceFilter) -> Catalog {
    if filter.is_empty() {
        return catalog.clone();
    }

    catalog.retain(|descriptor| filter.matches_type(&descriptor.name))
}
