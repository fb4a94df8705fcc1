//! # stubgen engine
//!
//! Directive-driven Go code generation with in-place, idempotent merging.
//!
//! ## Philosophy
//!
//! The engine never owns the destination file. It:
//! - Reads the declaration a `//go:generate` directive points at
//! - Derives implementation stubs (interfaces) or transforms (structs)
//! - Upserts them into the destination without touching hand-written code
//!
//! ## Architecture
//!
//! ```text
//! Source file + directive line
//!     │
//!     ├──> Tree-sitter parsing (Go grammar)
//!     │
//!     ├──> Position resolver → Declaration
//!     │
//!     ├──> Contract extractor (interfaces, embeds flattened)
//!     │    or record transformer (structs, fields flattened)
//!     │
//!     ├──> SkeletonRequest[] → BodyRenderer → GeneratedUnit[]
//!     │
//!     └──> Destination parser → merge/upsert → render (+ Formatter)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use stubgen_engine::{
//!     locate, render, BodyRenderer, DestinationFile, Generator, GeneratorConfig,
//!     SkeletonRequest, SourceFile, TypeRef,
//! };
//!
//! struct Stubs;
//!
//! impl BodyRenderer for Stubs {
//!     fn render(&self, request: &SkeletonRequest) -> String {
//!         match request {
//!             SkeletonRequest::TypeSkeleton { name, .. } => format!("type {name} struct{{}}"),
//!             SkeletonRequest::MethodStub { receiver, method } => {
//!                 format!("func (r *{receiver}) {} {{\n}}", method.signature())
//!             }
//!             _ => String::new(),
//!         }
//!     }
//!
//!     fn comment(&self, marker: &str, origin: &TypeRef, _replace: bool) -> String {
//!         format!("// {marker}. Source: {origin}")
//!     }
//! }
//!
//! let code = "package widgets\n\n//go:generate stubgen\ntype Widget interface {\n\tOpen()\n}\n";
//! let source = SourceFile::parse("widget.go", code).unwrap();
//! let decl = locate(&source, 3).unwrap();
//!
//! let generator = Generator::new(GeneratorConfig::for_namespace("widgets"), &Stubs).unwrap();
//! let generation = generator.generate(&source, &decl).unwrap();
//! let (merged, report) = generator.merge_into(generation, DestinationFile::default());
//!
//! assert_eq!(report.inserted.len(), 2);
//! assert!(render(&merged).contains("func (r *widget) Open() {"));
//! ```

mod config;
mod contract;
mod destination;
mod error;
mod generator;
mod locate;
mod merge;
mod qualify;
mod record;
mod render;
mod skeleton;
mod source;
mod types;

pub use config::{EmbedPolicy, GeneratorConfig, TimeConversion, DEFAULT_MARKER};
pub use contract::{extract, ExtractOptions};
pub use destination::{BlockKey, BlockKind, DestinationFile, FileBlock};
pub use error::{GenError, Result};
pub use generator::{lower_first, pascal, upper_first, Generation, Generator};
pub use locate::{find_by_name, locate, resolve};
pub use merge::{merge, MergeOptions, MergeReport};
pub use qualify::{Qualified, Qualifier};
pub use record::{shape, RecordOptions};
pub use render::{render, render_with, Formatter};
pub use skeleton::{BodyRenderer, GeneratedUnit, SkeletonRequest, UnitKind};
pub use source::SourceFile;
pub use types::{
    ContractShape, Declaration, DeclarationKind, FieldDescriptor, ImportSpec, MethodSignature,
    RecordShape, SourcePointer, StructMember, TypeRef,
};
