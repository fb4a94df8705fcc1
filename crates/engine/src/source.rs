use crate::error::{GenError, Result};
use crate::types::{Declaration, DeclarationKind};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// A parsed Go source file
pub struct SourceFile {
    path: PathBuf,
    text: String,
    tree: Tree,
}

impl SourceFile {
    /// Read and parse a file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, text)
    }

    /// Parse in-memory source text
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| GenError::tree_sitter(format!("Failed to set language: {e}")))?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| GenError::tree_sitter("Failed to parse source code"))?;

        if tree.root_node().has_error() {
            log::debug!("source contains syntax errors; continuing with partial tree");
        }

        Ok(Self {
            path: path.into(),
            text,
            tree,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Number of lines, not counting the empty remainder after a final newline
    pub fn line_count(&self) -> usize {
        let lines = self.text.split('\n').count();
        if self.text.ends_with('\n') {
            lines - 1
        } else {
            lines
        }
    }

    /// Package name from the package clause
    pub fn namespace(&self) -> Option<&str> {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .children(&mut cursor)
            .find(|n| n.kind() == "package_clause")?;

        let mut inner = clause.walk();
        let ident = clause
            .named_children(&mut inner)
            .find(|n| n.kind() == "package_identifier")?;
        Some(self.node_text(ident))
    }

    pub(crate) fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.start_byte()..node.end_byte()]
    }

    /// Every `type_spec` at the top level, including those inside grouped declarations
    pub(crate) fn type_specs(&self) -> Vec<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        let mut specs = Vec::new();

        for child in root.children(&mut cursor) {
            if child.kind() == "type_declaration" {
                let mut inner = child.walk();
                specs.extend(
                    child
                        .named_children(&mut inner)
                        .filter(|n| n.kind() == "type_spec"),
                );
            }
        }

        specs
    }

    /// Type spec declaring `name`
    pub(crate) fn find_type_spec(&self, name: &str) -> Option<Node<'_>> {
        self.type_specs().into_iter().find(|spec| {
            spec.child_by_field_name("name")
                .is_some_and(|n| self.node_text(n) == name)
        })
    }

    /// Build a declaration from a `type_spec` naming an interface or struct
    pub(crate) fn declaration(&self, spec: Node<'_>) -> Option<Declaration> {
        let name = spec.child_by_field_name("name")?;
        let ty = spec.child_by_field_name("type")?;
        let kind = match ty.kind() {
            "interface_type" => DeclarationKind::Contract,
            "struct_type" => DeclarationKind::Record,
            _ => return None,
        };

        Some(Declaration {
            kind,
            name: self.node_text(name).to_string(),
            start_byte: spec.start_byte(),
            end_byte: spec.end_byte(),
            start_line: spec.start_position().row + 1,
            type_parameters: self.type_parameters(spec),
        })
    }

    fn type_parameters(&self, spec: Node<'_>) -> Vec<String> {
        let Some(list) = spec.child_by_field_name("type_parameters") else {
            return Vec::new();
        };

        let mut names = Vec::new();
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            let mut inner = param.walk();
            names.extend(
                param
                    .children_by_field_name("name", &mut inner)
                    .map(|n| self.node_text(n).to_string()),
            );
        }
        names
    }

    /// Type spec node for a previously located declaration
    pub(crate) fn spec_for(&self, decl: &Declaration) -> Option<Node<'_>> {
        self.type_specs()
            .into_iter()
            .find(|spec| spec.start_byte() == decl.start_byte)
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("bytes", &self.text.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_and_line_count() {
        let src = SourceFile::parse("a.go", "package example\n\ntype A struct{}\n").unwrap();
        assert_eq!(src.namespace(), Some("example"));
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn test_grouped_type_specs_are_visible() {
        let code = "package p\n\ntype (\n\tA interface{}\n\tB struct{}\n)\n";
        let src = SourceFile::parse("a.go", code).unwrap();
        let names: Vec<_> = src
            .type_specs()
            .into_iter()
            .filter_map(|s| src.declaration(s))
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_type_parameters_collected() {
        let code = "package p\n\ntype Store[K comparable, V any] interface {\n\tGet(K) V\n}\n";
        let src = SourceFile::parse("a.go", code).unwrap();
        let spec = src.find_type_spec("Store").unwrap();
        let decl = src.declaration(spec).unwrap();
        assert_eq!(decl.type_parameters, vec!["K", "V"]);
        assert!(decl.is_contract());
    }

    #[test]
    fn test_alias_is_not_a_declaration() {
        let src = SourceFile::parse("a.go", "package p\n\ntype ID int64\n").unwrap();
        let spec = src.find_type_spec("ID").unwrap();
        assert!(src.declaration(spec).is_none());
    }
}
