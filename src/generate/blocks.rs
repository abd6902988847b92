//! Reading, writing and canonically ordering HCL files through the
//! injectable filesystem.

use hcl::expr::{Traversal, Variable};
use hcl::{Block, Body, Expression, Identifier, Structure};
use std::cmp::Ordering;
use std::path::Path;

use crate::generate::error::{GenerateError, GenerateResult};
use crate::generate::synthesize::{ImportDirective, PROVIDER_NAME};
use crate::traits::FileSystem;

/// `<root>.<attribute>` reference such as `grafana_folder.my_folder`
///
/// Both parts are used verbatim; callers pass names that are already valid
/// identifiers.
pub fn traversal(root: &str, attribute: &str) -> Expression {
    Traversal::builder(Variable::unchecked(root.to_string()))
        .attr(Identifier::unchecked(attribute.to_string()))
        .build()
        .into()
}

/// `import { to = ..., id = "...", provider = grafana.<alias> }`
pub fn import_block(directive: &ImportDirective) -> Block {
    let mut builder = Block::builder("import")
        .add_attribute((
            "to",
            traversal(&directive.resource_type, &directive.local_name),
        ))
        .add_attribute(("id", directive.remote_id.as_str()));

    if let Some(alias) = &directive.provider_alias {
        builder = builder.add_attribute(("provider", traversal(PROVIDER_NAME, alias)));
    }

    builder.build()
}

/// Parse an HCL file
pub fn read_body(fs: &dyn FileSystem, path: &Path) -> GenerateResult<Body> {
    let contents = fs.read_to_string(path)?;
    hcl::parse(&contents).map_err(|source| GenerateError::Hcl {
        path: path.to_path_buf(),
        source,
    })
}

/// Render `body` and write it to `path`, replacing any previous contents
pub fn write_body(fs: &dyn FileSystem, path: &Path, body: &Body) -> GenerateResult<()> {
    let rendered = hcl::to_string(body).map_err(|source| GenerateError::Hcl {
        path: path.to_path_buf(),
        source,
    })?;
    fs.write(path, &rendered)?;
    tracing::debug!(path = %path.display(), "wrote HCL file");
    Ok(())
}

/// Append `blocks` to the HCL file at `path`, creating it when missing
///
/// Whatever the file already holds is parsed and kept ahead of the new blocks.
pub fn append_blocks(fs: &dyn FileSystem, path: &Path, blocks: Vec<Block>) -> GenerateResult<()> {
    let mut structures: Vec<Structure> = if fs.exists(path) {
        read_body(fs, path)?.into_iter().collect()
    } else {
        Vec::new()
    };
    structures.extend(blocks.into_iter().map(Structure::Block));

    write_body(fs, path, &structures.into_iter().collect())
}

/// Put the top-level structures of `body` into canonical order
///
/// Attributes keep their relative order and come first. Blocks are ordered
/// by identifier, then first label, then second label; blocks that tie on
/// all three are ordered by their rendered text.
pub fn sort_body(body: Body) -> Body {
    let (attributes, blocks): (Vec<Structure>, Vec<Structure>) = body
        .into_iter()
        .partition(|structure| matches!(structure, Structure::Attribute(_)));

    let mut keyed: Vec<(BlockKey, Structure)> = blocks
        .into_iter()
        .map(|structure| (BlockKey::of(&structure), structure))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    attributes
        .into_iter()
        .chain(keyed.into_iter().map(|(_, structure)| structure))
        .collect()
}

/// Parse the file at `path`, sort it canonically and write it back
pub fn sort_file(fs: &dyn FileSystem, path: &Path) -> GenerateResult<()> {
    let body = read_body(fs, path)?;
    write_body(fs, path, &sort_body(body))
}

#[derive(Debug, PartialEq, Eq)]
struct BlockKey {
    identifier: String,
    labels: [String; 2],
    rendered: String,
}

impl BlockKey {
    fn of(structure: &Structure) -> Self {
        match structure {
            Structure::Block(block) => {
                let label = |i: usize| {
                    block
                        .labels()
                        .get(i)
                        .map(|l| l.as_str().to_string())
                        .unwrap_or_default()
                };
                Self {
                    identifier: block.identifier().to_string(),
                    labels: [label(0), label(1)],
                    rendered: hcl::to_string(block).unwrap_or_default(),
                }
            }
            Structure::Attribute(attribute) => Self {
                identifier: String::new(),
                labels: [attribute.key().to_string(), String::new()],
                rendered: String::new(),
            },
        }
    }
}

impl Ord for BlockKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identifier
            .cmp(&other.identifier)
            .then_with(|| self.labels.cmp(&other.labels))
            .then_with(|| self.rendered.cmp(&other.rendered))
    }
}

impl PartialOrd for BlockKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFileSystem;
    use hcl::expr::TraversalOperator;

    fn directive(alias: Option<&str>) -> ImportDirective {
        ImportDirective {
            resource_type: "grafana_folder".to_string(),
            local_name: "my_weird_id".to_string(),
            remote_id: "my/weird id".to_string(),
            provider_alias: alias.map(str::to_string),
        }
    }

    #[test]
    fn test_import_block_without_provider() {
        let rendered = hcl::to_string(&import_block(&directive(None))).unwrap();
        assert!(rendered.contains("grafana_folder.my_weird_id"));
        assert!(!rendered.contains("\"grafana_folder.my_weird_id\""));
        assert!(rendered.contains("\"my/weird id\""));
        assert!(!rendered.contains("provider"));
    }

    #[test]
    fn test_import_block_with_provider_alias() {
        let rendered = hcl::to_string(&import_block(&directive(Some("stack-prod")))).unwrap();
        assert!(rendered.contains("provider"));
        assert!(rendered.contains("grafana.stack-prod"));
    }

    fn attribute_expr(block: &Block, key: &str) -> Expression {
        block
            .body()
            .attributes()
            .find(|a| a.key() == key)
            .map(|a| a.expr().clone())
            .unwrap_or_else(|| panic!("no {} attribute", key))
    }

    #[test]
    fn test_import_targets_reparse_as_attribute_access() {
        let directive = ImportDirective {
            resource_type: "grafana_team".to_string(),
            local_name: "_1".to_string(),
            remote_id: "1".to_string(),
            provider_alias: Some("stack-prod".to_string()),
        };
        let rendered = hcl::to_string(&import_block(&directive)).unwrap();

        let body = hcl::parse(&rendered).unwrap();
        let block = body.blocks().next().unwrap();

        match attribute_expr(block, "to") {
            Expression::Traversal(traversal) => {
                assert_eq!(traversal.expr, Expression::Variable(Variable::unchecked("grafana_team")));
                assert_eq!(
                    traversal.operators,
                    vec![TraversalOperator::GetAttr(Identifier::unchecked("_1"))]
                );
            }
            other => panic!("unexpected expression: {other:?}"),
        }

        match attribute_expr(block, "provider") {
            Expression::Traversal(traversal) => {
                assert_eq!(
                    traversal.operators,
                    vec![TraversalOperator::GetAttr(Identifier::unchecked("stack-prod"))]
                );
            }
            other => panic!("unexpected expression: {other:?}"),
        }

        match attribute_expr(block, "id") {
            Expression::String(id) => assert_eq!(id, "1"),
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn test_sort_body_orders_by_type_then_name() {
        let body = hcl::parse(
            r#"
resource "grafana_folder" "b" {
  title = "B"
}
resource "grafana_dashboard" "z" {
  config_json = "{}"
}
resource "grafana_folder" "a" {
  title = "A"
}
"#,
        )
        .unwrap();

        let sorted = hcl::to_string(&sort_body(body)).unwrap();
        let dashboard = sorted.find("\"grafana_dashboard\" \"z\"").unwrap();
        let folder_a = sorted.find("\"grafana_folder\" \"a\"").unwrap();
        let folder_b = sorted.find("\"grafana_folder\" \"b\"").unwrap();
        assert!(dashboard < folder_a);
        assert!(folder_a < folder_b);
    }

    #[test]
    fn test_sort_body_breaks_ties_on_rendered_text() {
        let first = hcl::parse("resource \"t\" \"n\" {\n  v = 2\n}\nresource \"t\" \"n\" {\n  v = 1\n}\n").unwrap();
        let second = hcl::parse("resource \"t\" \"n\" {\n  v = 1\n}\nresource \"t\" \"n\" {\n  v = 2\n}\n").unwrap();

        assert_eq!(
            hcl::to_string(&sort_body(first)).unwrap(),
            hcl::to_string(&sort_body(second)).unwrap()
        );
    }

    #[test]
    fn test_sort_body_keeps_attributes_first() {
        let body = hcl::parse("resource \"t\" \"a\" {}\nlocal_value = 1\n").unwrap();
        let sorted = hcl::to_string(&sort_body(body)).unwrap();
        assert!(sorted.starts_with("local_value = 1"));
    }

    #[test]
    fn test_append_blocks_keeps_existing_blocks() {
        let fs = MockFileSystem::new();
        let path = Path::new("/out/imports.tf");

        append_blocks(&fs, path, vec![import_block(&directive(None))]).unwrap();
        append_blocks(
            &fs,
            path,
            vec![Block::builder("provider").add_label("grafana").build()],
        )
        .unwrap();

        let contents = fs.get_file_contents(path).unwrap();
        let import = contents.find("import {").unwrap();
        let provider = contents.find("provider \"grafana\"").unwrap();
        assert!(import < provider);
    }

    #[test]
    fn test_read_body_reports_path_on_syntax_error() {
        let fs = MockFileSystem::new();
        let path = Path::new("/out/resources.tf");
        fs.write(path, "resource \"t\" {").unwrap();

        match read_body(&fs, path).unwrap_err() {
            GenerateError::Hcl { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sort_file_is_idempotent() {
        let fs = MockFileSystem::new();
        let path = Path::new("/out/resources.tf");
        fs.write(
            path,
            "resource \"b\" \"x\" {\n  id = \"1\"\n}\nresource \"a\" \"y\" {\n  id = \"2\"\n}\n",
        )
        .unwrap();

        sort_file(&fs, path).unwrap();
        let once = fs.get_file_contents(path).unwrap();
        sort_file(&fs, path).unwrap();
        assert_eq!(fs.get_file_contents(path).unwrap(), once);
        assert!(once.find("\"a\" \"y\"").unwrap() < once.find("\"b\" \"x\"").unwrap());
    }
}
