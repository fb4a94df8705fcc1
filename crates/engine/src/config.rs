use serde::{Deserialize, Serialize};

/// Marker placed in the leading comment of every generated declaration
pub const DEFAULT_MARKER: &str = "Code generated by stubgen";

/// Configuration for a single generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Namespace (package) of the destination file
    pub namespace: String,

    /// Name of the generated type; derived from the source declaration when unset
    pub type_name: Option<String>,

    /// Overwrite declarations that already exist in the destination
    pub replace: bool,

    /// Flatten embedded contracts declared in the same file
    pub follow_embeds: bool,

    /// What to do with embeds that cannot be resolved
    pub embed_policy: EmbedPolicy,

    /// Emit a `New<Type>` constructor
    pub constructor: bool,

    /// Keep struct tags when copying a record
    pub keep_tags: bool,

    /// Retype time fields when copying a record
    pub time_conversion: TimeConversion,

    /// Treat duplicate flattened field names as an error
    pub strict_fields: bool,

    /// Namespaces to generate `To<Ns>` transforms for
    pub to: Vec<String>,

    /// Namespaces to generate `New<Type>From<Ns>` functions for
    pub from: Vec<String>,

    /// Attach the generation marker comment to generated units
    pub emit_comments: bool,

    /// Text identifying comments owned by the generator
    pub marker: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            type_name: None,
            replace: false,
            follow_embeds: true,
            embed_policy: EmbedPolicy::Lenient,
            constructor: false,
            keep_tags: false,
            time_conversion: TimeConversion::None,
            strict_fields: false,
            to: Vec::new(),
            from: Vec::new(),
            emit_comments: true,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Config targeting the given destination namespace with defaults elsewhere
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !is_identifier(&self.namespace) {
            return Err(format!(
                "namespace ({:?}) must be a valid identifier",
                self.namespace
            ));
        }

        if let Some(name) = &self.type_name {
            if !is_identifier(name) {
                return Err(format!("type_name ({name:?}) must be a valid identifier"));
            }
        }

        for ns in self.to.iter().chain(&self.from) {
            if !is_identifier(ns) {
                return Err(format!("transform namespace ({ns:?}) must be a valid identifier"));
            }
        }

        if self.marker.trim().is_empty() {
            return Err("marker must not be empty".to_string());
        }

        Ok(())
    }
}

/// Policy for embeds that do not resolve to a declaration in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedPolicy {
    /// Skip with a warning
    #[default]
    Lenient,
    /// Fail the run
    Strict,
}

/// Retyping applied to fields named `*Time` when a record is copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeConversion {
    #[default]
    None,
    /// `string` becomes `int64`
    Unix,
    /// `int64` becomes `string`
    Timestamp,
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_requires_namespace() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_err());
        assert!(GeneratorConfig::for_namespace("usecase").validate().is_ok());
    }

    #[test]
    fn test_namespace_preset_defaults() {
        let config = GeneratorConfig::for_namespace("repo");
        assert!(!config.replace);
        assert!(config.follow_embeds);
        assert_eq!(config.embed_policy, EmbedPolicy::Lenient);
    }

    #[test]
    fn test_invalid_type_name() {
        let config = GeneratorConfig {
            type_name: Some("bad name".into()),
            ..GeneratorConfig::for_namespace("usecase")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_transform_namespace() {
        let config = GeneratorConfig {
            to: vec!["entity".into(), "9lives".into()],
            ..GeneratorConfig::for_namespace("payload")
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("9lives"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"namespace":"usecase","embed_policy":"strict"}"#).unwrap();
        assert_eq!(config.embed_policy, EmbedPolicy::Strict);
        assert_eq!(config.marker, DEFAULT_MARKER);
        assert!(config.emit_comments);
    }
}
