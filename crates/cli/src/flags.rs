use clap::ValueEnum;
use stubgen_engine::{ImportSpec, TimeConversion};

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum TimeFlag {
    #[default]
    Keep,
    Unix,
    Timestamp,
}

impl TimeFlag {
    pub const fn as_domain(self) -> TimeConversion {
        match self {
            TimeFlag::Keep => TimeConversion::None,
            TimeFlag::Unix => TimeConversion::Unix,
            TimeFlag::Timestamp => TimeConversion::Timestamp,
        }
    }
}

/// `--to`/`--from` value: `ns` or `ns=import/path`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceArg {
    pub namespace: String,
    pub import: Option<ImportSpec>,
}

impl NamespaceArg {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (namespace, import) = match raw.split_once('=') {
            Some((ns, path)) => (ns.trim(), Some(path.trim())),
            None => (raw.trim(), None),
        };
        if namespace.is_empty() {
            return Err(format!("empty package name in {raw:?}"));
        }

        let import = match import {
            None => None,
            Some("") => return Err(format!("empty import path in {raw:?}")),
            Some(path) => {
                let last = path.rsplit('/').next().unwrap_or(path);
                let spec = ImportSpec::new(path);
                Some(if last == namespace {
                    spec
                } else {
                    spec.with_alias(namespace)
                })
            }
        };

        Ok(Self {
            namespace: namespace.to_string(),
            import,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_only() {
        let arg = NamespaceArg::parse("entity").unwrap();
        assert_eq!(arg.namespace, "entity");
        assert!(arg.import.is_none());
    }

    #[test]
    fn import_alias_follows_package_name() {
        let arg = NamespaceArg::parse("entity=github.com/acme/app/domain/entity").unwrap();
        assert_eq!(arg.import, Some(ImportSpec::new("github.com/acme/app/domain/entity")));

        let arg = NamespaceArg::parse("pb=github.com/acme/app/gen/proto").unwrap();
        assert_eq!(
            arg.import,
            Some(ImportSpec::new("github.com/acme/app/gen/proto").with_alias("pb"))
        );
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(NamespaceArg::parse("=x").is_err());
        assert!(NamespaceArg::parse("x=").is_err());
    }
}
