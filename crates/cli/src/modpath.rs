//! Go module path resolution (`go.mod` lookup).

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use stubgen_engine::ImportSpec;

static MODULE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*module\s+"?([^\s"]+)"?"#).expect("invalid module regex")
});

/// Root directory and module path of the enclosing Go module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub root: PathBuf,
    pub path: String,
}

/// Walk up from `dir` to the nearest `go.mod`
pub fn find_module(dir: &Path) -> Result<Option<Module>> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("resolve {}", dir.display()))?;

    for ancestor in dir.ancestors() {
        let manifest = ancestor.join("go.mod");
        if !manifest.is_file() {
            continue;
        }

        let text = fs::read_to_string(&manifest)
            .with_context(|| format!("read {}", manifest.display()))?;
        let path = MODULE_LINE
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .with_context(|| format!("no module directive in {}", manifest.display()))?;

        return Ok(Some(Module {
            root: ancestor.to_path_buf(),
            path,
        }));
    }

    Ok(None)
}

/// Import spec for the package in `dir`, aliased when the package name differs
/// from the last path element
pub fn import_for(dir: &Path, package: &str) -> Result<Option<ImportSpec>> {
    let Some(module) = find_module(dir)? else {
        return Ok(None);
    };

    let dir = dir.canonicalize()?;
    let relative = dir.strip_prefix(&module.root).unwrap_or(Path::new(""));
    let mut path = module.path.clone();
    for part in relative.components() {
        path.push('/');
        path.push_str(&part.as_os_str().to_string_lossy());
    }

    let last = path.rsplit('/').next().unwrap_or(path.as_str());
    let spec = ImportSpec::new(path.clone());
    Ok(Some(if last == package {
        spec
    } else {
        spec.with_alias(package)
    }))
}
