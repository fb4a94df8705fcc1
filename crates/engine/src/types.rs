use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// File and 1-based line of a generation directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePointer {
    pub path: PathBuf,
    pub line: usize,
}

impl SourcePointer {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

/// Kind of a located declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// Method-set declaration (`interface`)
    Contract,
    /// Field declaration (`struct`)
    Record,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Contract => "contract",
            DeclarationKind::Record => "record",
        }
    }
}

/// A top-level type declaration found in the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,

    /// Byte range of the type spec
    pub start_byte: usize,
    pub end_byte: usize,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// Names bound by the declaration's type parameter list
    pub type_parameters: Vec<String>,
}

impl Declaration {
    #[must_use]
    pub const fn is_contract(&self) -> bool {
        matches!(self.kind, DeclarationKind::Contract)
    }
}

/// One method of a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,

    /// Parenthesized parameter list, qualified when requested
    pub parameters: String,

    /// Result type or parenthesized result list; empty when the method returns nothing
    pub results: String,

    /// The method element exactly as written in the source
    pub source_text: String,
}

impl MethodSignature {
    /// `Name(params) results` as it appears after `func (recv)`
    #[must_use]
    pub fn signature(&self) -> String {
        if self.results.is_empty() {
            format!("{}{}", self.name, self.parameters)
        } else {
            format!("{}{} {}", self.name, self.parameters, self.results)
        }
    }
}

/// Flattened method set of a contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractShape {
    pub name: String,

    /// Direct methods first, then embedded ones in depth-first pre-order
    pub methods: Vec<MethodSignature>,

    /// Embedded contracts that were expanded, in expansion order
    pub embeds: Vec<String>,

    /// At least one type token was rewritten to a namespace-qualified form
    pub requires_import: bool,
}

impl ContractShape {
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }
}

/// A member declaration of a record as it will be copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructMember {
    /// `Name Type` or, for embeds, `Type`; without the tag
    pub text: String,
    pub tag: Option<String>,
}

/// A field reachable on a record after embed flattening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_text: String,
    pub tag: Option<String>,

    /// Embedded record this field was promoted from
    pub promoted_from: Option<String>,
}

/// Field list of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordShape {
    pub name: String,
    pub members: Vec<StructMember>,
    pub fields: Vec<FieldDescriptor>,

    /// Field names that occur more than once in `fields`
    pub collisions: Vec<String>,
    pub requires_import: bool,
}

impl RecordShape {
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Possibly namespace-qualified type name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl TypeRef {
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// An import the destination file must carry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
}

impl ImportSpec {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Quoted spec as written inside an import declaration
    #[must_use]
    pub fn spec(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{alias} \"{}\"", self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}
