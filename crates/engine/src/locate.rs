//! Maps a directive line to the declaration it annotates.

use crate::error::{GenError, Result};
use crate::source::SourceFile;
use crate::types::{Declaration, SourcePointer};
use tree_sitter::Node;

/// Locate the first top-level declaration starting at or after `line` (1-indexed).
///
/// Comment nodes between the directive and the declaration are skipped. A
/// grouped `type ( ... )` declaration resolves to its first spec after the line.
pub fn locate(source: &SourceFile, line: usize) -> Result<Declaration> {
    let lines = source.line_count();
    if line == 0 || line > lines {
        return Err(GenError::LineOutOfRange { line, lines });
    }

    let target_row = line - 1;
    let root = source.root();
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        if child.end_position().row < target_row {
            continue;
        }

        match child.kind() {
            "comment" => continue,
            "type_declaration" => {
                let spec = first_spec_from(child, target_row).ok_or_else(|| {
                    GenError::not_found(format!("no type spec after line {line}"))
                })?;
                return source.declaration(spec).ok_or_else(|| {
                    let name = spec
                        .child_by_field_name("name")
                        .map(|n| source.node_text(n))
                        .unwrap_or_default();
                    GenError::not_found(format!("{name} is neither an interface nor a struct"))
                });
            }
            other => {
                if child.start_position().row < target_row {
                    continue;
                }
                return Err(GenError::not_found(format!(
                    "line {line} is followed by {other}, expected a type declaration"
                )));
            }
        }
    }

    Err(GenError::not_found(format!(
        "no declaration after line {line} in {}",
        source.path().display()
    )))
}

/// Load the file a directive points into and locate the declaration it annotates
pub fn resolve(pointer: &SourcePointer) -> Result<(SourceFile, Declaration)> {
    let source = SourceFile::load(&pointer.path)?;
    let decl = locate(&source, pointer.line)?;
    Ok((source, decl))
}

/// Locate a top-level interface or struct by name
pub fn find_by_name(source: &SourceFile, name: &str) -> Option<Declaration> {
    source
        .find_type_spec(name)
        .and_then(|spec| source.declaration(spec))
}

fn first_spec_from(decl: Node<'_>, target_row: usize) -> Option<Node<'_>> {
    let mut cursor = decl.walk();
    let found = decl
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "type_spec")
        .find(|n| n.start_position().row >= target_row);
    found
}
