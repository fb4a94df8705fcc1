//! Line-oriented model of the file generated code is merged into.
//!
//! The file is cut into [`FileBlock`]s at column-0 keywords. Blocks that open
//! brackets are extended with a depth counter that ignores brackets inside
//! strings, runes and comments. Joining every block's lines with `\n`
//! reproduces the input byte for byte.

use crate::error::{GenError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static FUNC_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func\s*(?:\((?P<recv>[^)]*)\))?\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)")
        .expect("invalid func header regex")
});

static TYPE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^type\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)").expect("invalid type header regex")
});

/// Kind of a destination block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Namespace,
    Import,
    TypeDecl,
    Method,
    Function,
    Other,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Namespace => "namespace",
            BlockKind::Import => "import",
            BlockKind::TypeDecl => "type",
            BlockKind::Method => "method",
            BlockKind::Function => "function",
            BlockKind::Other => "other",
        }
    }
}

/// Identity of a declaration block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockKey {
    pub kind: BlockKind,
    pub name: String,
    /// Receiver type without pointer sigil or type arguments
    pub receiver: Option<String>,
}

/// A contiguous run of destination lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    pub kind: BlockKind,
    pub name: String,
    pub receiver: Option<String>,

    /// Comment lines directly above the block
    pub comment: Option<String>,

    /// Block text without trailing newline
    pub text: String,

    /// Start line (1-indexed), 0 for synthesized blocks
    pub line: usize,
}

impl FileBlock {
    #[must_use]
    pub fn other(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Other,
            name: String::new(),
            receiver: None,
            comment: None,
            text: text.into(),
            line: 0,
        }
    }

    #[must_use]
    pub fn namespace(namespace: &str) -> Self {
        Self {
            kind: BlockKind::Namespace,
            name: namespace.to_string(),
            receiver: None,
            comment: None,
            text: format!("package {namespace}"),
            line: 0,
        }
    }

    #[must_use]
    pub fn import(spec: &str) -> Self {
        Self {
            kind: BlockKind::Import,
            name: String::new(),
            receiver: None,
            comment: None,
            text: format!("import {spec}"),
            line: 0,
        }
    }

    /// Identity for declaration blocks; `None` for everything else
    pub fn key(&self) -> Option<BlockKey> {
        match self.kind {
            BlockKind::TypeDecl | BlockKind::Method | BlockKind::Function if !self.name.is_empty() => {
                Some(BlockKey {
                    kind: self.kind,
                    name: self.name.clone(),
                    receiver: self.receiver.clone(),
                })
            }
            _ => None,
        }
    }

    /// Import paths declared by an import block
    pub fn import_paths(&self) -> Vec<String> {
        if self.kind != BlockKind::Import {
            return Vec::new();
        }

        let mut paths = Vec::new();
        for line in self.text.lines() {
            let line = line.split("//").next().unwrap_or_default();
            if let (Some(start), Some(end)) = (line.find('"'), line.rfind('"')) {
                if end > start {
                    paths.push(line[start + 1..end].to_string());
                }
            }
        }
        paths
    }

    fn line_count(&self) -> usize {
        self.comment.as_deref().map_or(0, |c| c.split('\n').count()) + self.text.split('\n').count()
    }
}

/// Parsed destination file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationFile {
    pub path: Option<PathBuf>,
    pub blocks: Vec<FileBlock>,
}

impl DestinationFile {
    /// Parse a file on disk; a missing file yields a lone namespace block
    pub fn parse(path: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut file = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist; starting from package {namespace}", path.display());
                Self {
                    path: None,
                    blocks: vec![FileBlock::namespace(namespace)],
                }
            }
            Err(err) => return Err(err.into()),
        };
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    /// Parse destination text
    pub fn parse_str(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.split('\n').collect();
        let blocks = BlockParser::new(&lines).run()?;
        Ok(Self { path: None, blocks })
    }

    /// Package name from the namespace block
    pub fn namespace(&self) -> Option<&str> {
        self.blocks
            .iter()
            .find(|b| b.kind == BlockKind::Namespace)
            .map(|b| b.name.as_str())
    }

    /// All import paths in declaration order
    pub fn imports(&self) -> Vec<String> {
        self.blocks.iter().flat_map(FileBlock::import_paths).collect()
    }

    /// Total number of lines the file renders to
    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(FileBlock::line_count).sum()
    }
}

/// Bracket depth tracker that skips literals and comments across lines
#[derive(Debug, Default)]
struct DepthScanner {
    depth: i64,
    seen_brace: bool,
    in_block_comment: bool,
    in_raw_string: bool,
}

impl DepthScanner {
    fn feed(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if self.in_block_comment {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    self.in_block_comment = false;
                    i += 1;
                }
                i += 1;
                continue;
            }
            if self.in_raw_string {
                if b == b'`' {
                    self.in_raw_string = false;
                }
                i += 1;
                continue;
            }

            match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => return,
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    self.in_block_comment = true;
                    i += 1;
                }
                b'"' | b'\'' => i = skip_quoted(bytes, i),
                b'`' => self.in_raw_string = true,
                b'{' => {
                    self.depth += 1;
                    self.seen_brace = true;
                }
                b'(' | b'[' => self.depth += 1,
                b'}' | b')' | b']' => self.depth -= 1,
                _ => {}
            }
            i += 1;
        }
    }

    fn balanced(&self) -> bool {
        self.depth <= 0 && !self.in_block_comment && !self.in_raw_string
    }
}

/// Index of the closing quote of the literal opened at `start`
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

struct BlockParser<'a> {
    lines: &'a [&'a str],
    pos: usize,
    pending_comment: Vec<&'a str>,
    comment_start: usize,
    blocks: Vec<FileBlock>,
}

impl<'a> BlockParser<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            pos: 0,
            pending_comment: Vec::new(),
            comment_start: 0,
            blocks: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<FileBlock>> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let trimmed = line.trim_start();

            if trimmed.starts_with("//") {
                self.push_comment(self.pos, self.pos + 1);
                continue;
            }
            if trimmed.starts_with("/*") {
                let end = self.block_comment_end(self.pos)?;
                self.push_comment(self.pos, end);
                continue;
            }

            let start = self.pos;
            let (kind, name, receiver) = classify(line);
            let end = match kind {
                BlockKind::TypeDecl | BlockKind::Import => self.extend(start, false, kind)?,
                BlockKind::Method | BlockKind::Function => self.extend(start, true, kind)?,
                _ => start + 1,
            };
            self.emit(kind, name, receiver, start, end);
        }

        if !self.pending_comment.is_empty() {
            let text = self.pending_comment.join("\n");
            let line = self.comment_start + 1;
            self.pending_comment.clear();
            self.blocks.push(FileBlock {
                line,
                ..FileBlock::other(text)
            });
        }

        Ok(self.blocks)
    }

    fn push_comment(&mut self, start: usize, end: usize) {
        if self.pending_comment.is_empty() {
            self.comment_start = start;
        }
        self.pending_comment.extend_from_slice(&self.lines[start..end]);
        self.pos = end;
    }

    /// Exclusive end line of a `/* ... */` comment starting at `start`
    fn block_comment_end(&self, start: usize) -> Result<usize> {
        let first = self.lines[start];
        let open = first.find("/*").unwrap_or(0);
        if first[open + 2..].contains("*/") {
            return Ok(start + 1);
        }
        for (offset, line) in self.lines[start + 1..].iter().enumerate() {
            if line.contains("*/") {
                return Ok(start + offset + 2);
            }
        }
        Err(GenError::parse(start + 1, "unterminated block comment"))
    }

    /// Exclusive end line of a bracketed block starting at `start`
    fn extend(&self, start: usize, needs_body: bool, kind: BlockKind) -> Result<usize> {
        let mut scanner = DepthScanner::default();
        for (offset, line) in self.lines[start..].iter().enumerate() {
            scanner.feed(line);
            let done = if needs_body {
                scanner.balanced() && (scanner.seen_brace || self.ends_header(start + offset))
            } else {
                scanner.balanced()
            };
            if done {
                return Ok(start + offset + 1);
            }
        }
        Err(GenError::parse(
            start + 1,
            format!("unterminated {} block", kind.as_str()),
        ))
    }

    /// A balanced `func` header with no body (assembly-backed) ends at `line`
    /// when the next line starts fresh at column 0
    fn ends_header(&self, line: usize) -> bool {
        match self.lines.get(line + 1) {
            None => true,
            Some(next) => next.trim().is_empty() || !next.starts_with(char::is_whitespace),
        }
    }

    fn emit(&mut self, kind: BlockKind, name: String, receiver: Option<String>, start: usize, end: usize) {
        let comment = if self.pending_comment.is_empty() {
            None
        } else {
            Some(self.pending_comment.join("\n"))
        };
        let line = if comment.is_some() {
            self.comment_start + 1
        } else {
            start + 1
        };
        self.pending_comment.clear();

        self.blocks.push(FileBlock {
            kind,
            name,
            receiver,
            comment,
            text: self.lines[start..end].join("\n"),
            line,
        });
        self.pos = end;
    }
}

/// Kind, name and receiver type of the block a line opens
fn classify(line: &str) -> (BlockKind, String, Option<String>) {
    if let Some(rest) = keyword(line, "package") {
        let name = rest.split_whitespace().next().unwrap_or_default();
        return (BlockKind::Namespace, name.to_string(), None);
    }
    if keyword(line, "import").is_some() {
        return (BlockKind::Import, String::new(), None);
    }
    if keyword(line, "type").is_some() {
        let name = TYPE_HEADER
            .captures(line)
            .and_then(|c| c.name("name"))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        return (BlockKind::TypeDecl, name, None);
    }
    if keyword(line, "func").is_some() {
        if let Some(caps) = FUNC_HEADER.captures(line) {
            let name = caps.name("name").map(|m| m.as_str().to_string()).unwrap_or_default();
            return match caps.name("recv") {
                Some(recv) => (BlockKind::Method, name, Some(receiver_type(recv.as_str()))),
                None => (BlockKind::Function, name, None),
            };
        }
    }
    (BlockKind::Other, String::new(), None)
}

/// Remainder of `line` after a column-0 keyword followed by a separator
fn keyword<'l>(line: &'l str, word: &str) -> Option<&'l str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c == '(' || c == '"' => Some(rest),
        _ => None,
    }
}

/// `s *Service[K, V]` names the receiver type `Service`
fn receiver_type(group: &str) -> String {
    let head = group.split('[').next().unwrap_or(group);
    let last = head.split_whitespace().last().unwrap_or_default();
    last.trim_start_matches('*').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use pretty_assertions::assert_eq;

    const FILE: &str = r#"package usecase

import (
	"context"
	"fmt"
)

// exampleUsecase implements the contract.
type exampleUsecase struct {
	repo Repository
}

type ID int64

func NewExampleUsecase() *exampleUsecase {
	return &exampleUsecase{}
}

/*
Get loads a record.
*/
func (u *exampleUsecase) Get(ctx context.Context) (string, error) {
	s := "}"
	r := '{'
	raw := `
}`
	// }
	return fmt.Sprint(s, r, raw), nil
}
"#;

    #[test]
    fn parses_blocks_with_identity() {
        let file = DestinationFile::parse_str(FILE).unwrap();
        let kinds: Vec<_> = file.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Namespace,
                BlockKind::Other,
                BlockKind::Import,
                BlockKind::Other,
                BlockKind::TypeDecl,
                BlockKind::Other,
                BlockKind::TypeDecl,
                BlockKind::Other,
                BlockKind::Function,
                BlockKind::Other,
                BlockKind::Method,
                BlockKind::Other,
            ]
        );

        let method = &file.blocks[10];
        assert_eq!(method.name, "Get");
        assert_eq!(method.receiver.as_deref(), Some("exampleUsecase"));
        assert_eq!(method.comment.as_deref(), Some("/*\nGet loads a record.\n*/"));
        assert_eq!(method.line, 19);
        assert!(method.text.ends_with("return fmt.Sprint(s, r, raw), nil\n}"));

        let doc = &file.blocks[4];
        assert_eq!(doc.name, "exampleUsecase");
        assert_eq!(doc.comment.as_deref(), Some("// exampleUsecase implements the contract."));
        assert_eq!(file.blocks[6].text, "type ID int64");
    }

    #[test]
    fn round_trip_is_exact() {
        let file = DestinationFile::parse_str(FILE).unwrap();
        assert_eq!(render(&file), FILE);
        assert_eq!(file.line_count(), FILE.split('\n').count());
    }

    #[test]
    fn round_trip_keeps_crlf_and_missing_final_newline() {
        let text = "package p\r\n\r\nfunc a() {\r\n}\r\n// tail";
        let file = DestinationFile::parse_str(text).unwrap();
        assert_eq!(render(&file), text);
        assert_eq!(file.blocks.last().map(|b| b.text.as_str()), Some("// tail"));
    }

    #[test]
    fn imports_are_listed() {
        let file = DestinationFile::parse_str(FILE).unwrap();
        assert_eq!(file.imports(), vec!["context", "fmt"]);
        assert_eq!(file.namespace(), Some("usecase"));

        let single = DestinationFile::parse_str("package p\n\nimport alias \"a/b\"\n").unwrap();
        assert_eq!(single.imports(), vec!["a/b"]);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let text = "package p\n\nfunc (s *S) Broken() {\n\tif x {\n}\n";
        let err = DestinationFile::parse_str(text).unwrap_err();
        match err {
            GenError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn multi_line_signature_extends_to_body() {
        let text = "package p\n\nfunc (s S[T]) Do(\n\tv interface{},\n) error {\n\treturn nil\n}\n";
        let file = DestinationFile::parse_str(text).unwrap();
        let method = &file.blocks[2];
        assert_eq!(method.kind, BlockKind::Method);
        assert_eq!(method.receiver.as_deref(), Some("S"));
        assert_eq!(method.text.lines().count(), 5);
    }

    #[test]
    fn generic_receiver_identity_drops_type_arguments() {
        let text = "package p\n\nfunc (s *Store[K, V]) Get() {\n}\n\nfunc (p Pair[A, B]) Swap() {\n}\n";
        let file = DestinationFile::parse_str(text).unwrap();
        let get = file.blocks[2].key().unwrap();
        assert_eq!(get.receiver.as_deref(), Some("Store"));
        assert_eq!(get.name, "Get");
        assert_eq!(file.blocks[4].receiver.as_deref(), Some("Pair"));
    }

    #[test]
    fn bodyless_func_does_not_swallow_next_declaration() {
        let text = "package p\n\nfunc archLoad(addr *uint32) uint32\nfunc archStore(addr *uint32, v uint32)\n\nfunc (s *S) M() {\n}\n";
        let file = DestinationFile::parse_str(text).unwrap();
        let names: Vec<_> = file
            .blocks
            .iter()
            .filter_map(FileBlock::key)
            .map(|k| k.name)
            .collect();
        assert_eq!(names, vec!["archLoad", "archStore", "M"]);
        assert_eq!(file.blocks[2].text, "func archLoad(addr *uint32) uint32");
        assert_eq!(render(&file), text);
    }

    #[test]
    fn missing_file_yields_namespace_block() {
        let dir = tempfile::tempdir().unwrap();
        let file = DestinationFile::parse(dir.path().join("nope.go"), "usecase").unwrap();
        assert_eq!(file.blocks, vec![FileBlock::namespace("usecase")]);
        assert_eq!(render(&file), "package usecase");
    }

    #[test]
    fn receiver_type_strips_sigils() {
        assert_eq!(receiver_type("s *Service[K, V]"), "Service");
        assert_eq!(receiver_type("*Service"), "Service");
        assert_eq!(receiver_type("Pair[A, B]"), "Pair");
        assert_eq!(receiver_type("r repo"), "repo");
    }
}
