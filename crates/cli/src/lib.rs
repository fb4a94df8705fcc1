//! `stubgen` command line front end.
//!
//! Resolves the `go generate` directive site, drives the engine with Go
//! templates, formats the result with `gofmt` and writes it atomically.

pub mod flags;
pub mod gofmt;
pub mod modpath;
pub mod pipeline;
pub mod report;
pub mod templates;
pub mod writer;

pub use pipeline::{run, Invocation, Outcome};
