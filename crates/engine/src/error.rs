use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenError>;

/// Errors that can occur while locating, extracting or merging declarations
#[derive(Error, Debug)]
pub enum GenError {
    /// The directive does not point at a recognizable declaration
    #[error("target declaration not found: {0}")]
    NotFound(String),

    /// The directive line lies outside the source file
    #[error("line {line} is out of range (file has {lines} lines)")]
    LineOutOfRange { line: usize, lines: usize },

    /// Embedded contracts reference each other in a loop
    #[error("cyclic embed: {}", chain.join(" -> "))]
    CyclicEmbed { chain: Vec<String> },

    /// An embedded contract could not be resolved in the source file
    #[error("unresolved embed: {name}")]
    UnresolvedEmbed { name: String },

    /// Flattened record fields share a name
    #[error("field collision in {record}: {}", fields.join(", "))]
    FieldCollision { record: String, fields: Vec<String> },

    /// Destination file has unbalanced delimiters
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GenError {
    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a destination parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_embed_lists_chain() {
        let err = GenError::CyclicEmbed {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic embed: A -> B -> A");
    }

    #[test]
    fn parse_error_carries_line() {
        let err = GenError::parse(12, "unterminated block");
        assert_eq!(err.to_string(), "parse error at line 12: unterminated block");
    }
}
