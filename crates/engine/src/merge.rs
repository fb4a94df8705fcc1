use crate::destination::{BlockKey, BlockKind, DestinationFile, FileBlock};
use crate::skeleton::GeneratedUnit;
use crate::types::ImportSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for a single merge
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions<'a> {
    /// Overwrite blocks that already exist
    pub replace: bool,
    /// Comments containing this text are owned by the generator
    pub marker: &'a str,
    /// Namespace used when the destination lacks a package clause
    pub namespace: &'a str,
}

/// What a merge did to the destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub inserted: Vec<String>,
    pub replaced: Vec<String>,
    pub kept: Vec<String>,
    pub imports_added: Vec<String>,
    pub namespace_synthesized: bool,
}

impl MergeReport {
    /// Nothing was added or overwritten
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty()
            && self.replaced.is_empty()
            && self.imports_added.is_empty()
            && !self.namespace_synthesized
    }
}

/// Upsert generated units and imports into a parsed destination.
///
/// Existing declarations are kept unless `replace` is set; a replaced
/// block's comment is only swapped when it carries the marker. Units with no
/// counterpart are appended before the final newline.
pub fn merge(
    existing: DestinationFile,
    units: Vec<GeneratedUnit>,
    imports: &[ImportSpec],
    options: MergeOptions<'_>,
) -> (DestinationFile, MergeReport) {
    let mut report = MergeReport::default();
    let DestinationFile { path, mut blocks } = existing;

    let mut pending: Vec<Option<GeneratedUnit>> = Vec::with_capacity(units.len());
    let mut index: HashMap<BlockKey, usize> = HashMap::new();
    for unit in units {
        let key = unit.key();
        if index.contains_key(&key) {
            log::debug!("dropping duplicate unit {}", describe(&key));
            continue;
        }
        index.insert(key, pending.len());
        pending.push(Some(unit));
    }

    for block in &mut blocks {
        let Some(key) = block.key() else {
            continue;
        };
        let Some(unit) = index.get(&key).and_then(|&i| pending[i].take()) else {
            continue;
        };

        if !options.replace {
            report.kept.push(describe(&key));
            continue;
        }

        block.text = unit.text;
        let owned = block
            .comment
            .as_deref()
            .is_some_and(|c| c.contains(options.marker));
        if owned {
            block.comment = unit.comment;
        }
        report.replaced.push(describe(&key));
    }

    if !blocks.iter().any(|b| b.kind == BlockKind::Namespace) {
        let mut head = vec![FileBlock::namespace(options.namespace)];
        if !blocks.first().is_some_and(is_blank) {
            head.push(FileBlock::other(""));
        }
        blocks.splice(0..0, head);
        report.namespace_synthesized = true;
    }

    let present: Vec<String> = blocks.iter().flat_map(FileBlock::import_paths).collect();
    for import in imports {
        if present.contains(&import.path) || report.imports_added.contains(&import.path) {
            continue;
        }
        insert_import(&mut blocks, import);
        report.imports_added.push(import.path.clone());
    }

    let mut remaining: Vec<GeneratedUnit> = pending.into_iter().flatten().collect();
    remaining.sort_by_key(|u| u.kind.insertion_rank());

    let sentinel = blocks.last().is_some_and(is_blank).then(|| blocks.len() - 1);
    let mut tail = Vec::new();
    let mut previous_blank = match sentinel {
        Some(i) => i > 0 && is_blank(&blocks[i - 1]),
        None => blocks.last().is_some_and(is_blank),
    };
    for unit in remaining {
        if !previous_blank {
            tail.push(FileBlock::other(""));
        }
        report.inserted.push(describe(&unit.key()));
        tail.push(FileBlock {
            kind: unit.kind.block_kind(),
            name: unit.name,
            receiver: unit.receiver,
            comment: unit.comment,
            text: unit.text,
            line: 0,
        });
        previous_blank = false;
    }

    match sentinel {
        Some(i) => {
            blocks.splice(i..i, tail);
        }
        None => {
            blocks.extend(tail);
            if !report.is_noop() && !blocks.last().is_some_and(is_blank) {
                blocks.push(FileBlock::other(""));
            }
        }
    }

    log::debug!(
        "merge: {} inserted, {} replaced, {} kept, {} imports added",
        report.inserted.len(),
        report.replaced.len(),
        report.kept.len(),
        report.imports_added.len()
    );

    (DestinationFile { path, blocks }, report)
}

fn is_blank(block: &FileBlock) -> bool {
    block.kind == BlockKind::Other && block.comment.is_none() && block.text.trim().is_empty()
}

/// Place an import after the last import block, or after the package clause
fn insert_import(blocks: &mut Vec<FileBlock>, import: &ImportSpec) {
    let block = FileBlock::import(&import.spec());
    if let Some(last) = blocks.iter().rposition(|b| b.kind == BlockKind::Import) {
        blocks.insert(last + 1, block);
        return;
    }

    let anchor = blocks
        .iter()
        .position(|b| b.kind == BlockKind::Namespace)
        .map_or(0, |i| i + 1);
    blocks.splice(anchor..anchor, [FileBlock::other(""), block]);
}

fn describe(key: &BlockKey) -> String {
    match &key.receiver {
        Some(receiver) => format!("{} {receiver}.{}", key.kind.as_str(), key.name),
        None => format!("{} {}", key.kind.as_str(), key.name),
    }
}
