use crate::modpath;
use crate::templates::GoTemplates;
use crate::writer::write_if_changed;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use stubgen_engine::{
    find_by_name, render, render_with, resolve, Declaration, DestinationFile, Formatter, Generator,
    GeneratorConfig, ImportSpec, MergeReport, SourceFile, SourcePointer,
};

/// Everything one `stubgen` run needs
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Source file holding the directive
    pub source: PathBuf,
    /// Directive line; ignored when `lookup` is set
    pub line: Option<usize>,
    /// Declaration name to use instead of the directive line
    pub lookup: Option<String>,
    /// Package name reported by `go generate`, used for the import alias
    pub source_package: Option<String>,
    /// Destination file, relative to the source file's directory
    pub destination: PathBuf,
    pub config: GeneratorConfig,
    /// Explicit imports for transform namespaces
    pub imports: Vec<(String, ImportSpec)>,
    pub dry_run: bool,
}

/// Result of a run
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub destination: PathBuf,
    pub declaration: String,
    pub written: bool,
    pub report: MergeReport,
    #[serde(skip)]
    pub rendered: String,
}

/// Locate, generate, merge and write
pub fn run(invocation: &Invocation, formatter: Option<&dyn Formatter>) -> Result<Outcome> {
    let (source, decl) = resolve_declaration(invocation)?;
    log::info!(
        "{}:{} -> {} {}",
        invocation.source.display(),
        decl.start_line,
        decl.kind.as_str(),
        decl.name
    );

    let source_dir = parent_dir(&invocation.source);
    let destination = source_dir.join(&invocation.destination);

    let renderer = GoTemplates;
    let mut generator = Generator::new(invocation.config.clone(), &renderer)?;
    if let Some(import) = source_import(&source, invocation, &source_dir)? {
        let ns = source.namespace().unwrap_or_default().to_string();
        generator = generator.with_import(ns, import);
    }
    for (ns, import) in &invocation.imports {
        generator = generator.with_import(ns.clone(), import.clone());
    }

    let generation = generator.generate(&source, &decl)?;
    let existing = DestinationFile::parse(&destination, &invocation.config.namespace)
        .with_context(|| format!("parse destination {}", destination.display()))?;
    let (merged, report) = generator.merge_into(generation, existing);

    if report.is_noop() {
        log::info!("{} is up to date", destination.display());
        return Ok(Outcome {
            destination,
            declaration: decl.name,
            written: false,
            report,
            rendered: render(&merged),
        });
    }

    let rendered = render_with(&merged, formatter);
    let written = if invocation.dry_run {
        false
    } else {
        write_if_changed(&destination, &rendered)?
    };

    Ok(Outcome {
        destination,
        declaration: decl.name,
        written,
        report,
        rendered,
    })
}

fn resolve_declaration(invocation: &Invocation) -> Result<(SourceFile, Declaration)> {
    if let Some(name) = &invocation.lookup {
        let source = SourceFile::load(&invocation.source)
            .with_context(|| format!("load source {}", invocation.source.display()))?;
        let decl = find_by_name(&source, name).with_context(|| {
            format!("no interface or struct named {name} in {}", source.path().display())
        })?;
        return Ok((source, decl));
    }

    let Some(line) = invocation.line else {
        bail!("no directive line given; pass --line or run under go generate (GOLINE)");
    };
    let pointer = SourcePointer::new(&invocation.source, line);
    resolve(&pointer).with_context(|| format!("resolve {}:{line}", invocation.source.display()))
}

/// Import for the source package when generating into another package
fn source_import(
    source: &SourceFile,
    invocation: &Invocation,
    source_dir: &Path,
) -> Result<Option<ImportSpec>> {
    let Some(source_ns) = source.namespace() else {
        return Ok(None);
    };
    if source_ns == invocation.config.namespace {
        return Ok(None);
    }

    if let Some(reported) = &invocation.source_package {
        if reported != source_ns {
            log::warn!("GOPACKAGE={reported} disagrees with package clause {source_ns}");
        }
    }

    let import = modpath::import_for(source_dir, source_ns)?;
    if import.is_none() {
        log::warn!(
            "no go.mod above {}; package {source_ns} will not be imported",
            source_dir.display()
        );
    }
    Ok(import)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
