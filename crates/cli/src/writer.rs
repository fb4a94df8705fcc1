use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `contents`; returns `false` when the file
/// already holds exactly that text
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    match fs::read_to_string(path) {
        Ok(existing) if existing == contents => return Ok(false),
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_new_file_and_parents() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("usecase/example.go");
        assert!(write_if_changed(&path, "package usecase\n").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "package usecase\n");
    }

    #[test]
    fn unchanged_content_is_not_rewritten() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a.go");
        fs::write(&path, "package a\n").unwrap();
        assert!(!write_if_changed(&path, "package a\n").unwrap());
        assert!(write_if_changed(&path, "package b\n").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "package b\n");
        // no stray temporaries left behind
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }
}
