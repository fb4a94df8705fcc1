use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use stubgen_engine::Formatter;

/// Pipes rendered source through `gofmt`
#[derive(Debug, Clone)]
pub struct Gofmt {
    binary: PathBuf,
}

impl Default for Gofmt {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gofmt"),
        }
    }
}

impl Gofmt {
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Formatter for Gofmt {
    fn format(&self, text: &str) -> Result<String, String> {
        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("spawn {}: {e}", self.binary.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| format!("write to {}: {e}", self.binary.display()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| format!("wait for {}: {e}", self.binary.display()))?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }

        String::from_utf8(output.stdout).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_an_error() {
        let gofmt = Gofmt::with_binary("/nonexistent/stubgen-gofmt");
        let err = gofmt.format("package p\n").unwrap_err();
        assert!(err.contains("spawn"), "{err}");
    }
}
