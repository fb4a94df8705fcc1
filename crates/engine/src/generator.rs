use crate::config::GeneratorConfig;
use crate::contract::{self, ExtractOptions};
use crate::destination::DestinationFile;
use crate::error::{GenError, Result};
use crate::merge::{self, MergeOptions, MergeReport};
use crate::record::{self, RecordOptions};
use crate::skeleton::{BodyRenderer, GeneratedUnit, SkeletonRequest};
use crate::source::SourceFile;
use crate::types::{Declaration, DeclarationKind, ImportSpec, TypeRef};
use std::collections::HashMap;

/// Units and imports produced for one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Declaration the units were derived from
    pub origin: TypeRef,
    pub units: Vec<GeneratedUnit>,
    pub imports: Vec<ImportSpec>,
}

/// Drives extraction, skeleton rendering and merging for one configuration
pub struct Generator<'r> {
    config: GeneratorConfig,
    renderer: &'r dyn BodyRenderer,
    imports: HashMap<String, ImportSpec>,
}

impl<'r> Generator<'r> {
    /// Create a generator; fails when the configuration does not validate
    pub fn new(config: GeneratorConfig, renderer: &'r dyn BodyRenderer) -> Result<Self> {
        config.validate().map_err(GenError::invalid_config)?;
        Ok(Self {
            config,
            renderer,
            imports: HashMap::new(),
        })
    }

    /// Register the import that makes `namespace` resolvable from the destination
    #[must_use]
    pub fn with_import(mut self, namespace: impl Into<String>, import: ImportSpec) -> Self {
        self.imports.insert(namespace.into(), import);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the generated units for a located declaration
    pub fn generate(&self, source: &SourceFile, decl: &Declaration) -> Result<Generation> {
        let source_ns = source
            .namespace()
            .unwrap_or(self.config.namespace.as_str())
            .to_string();
        let cross_namespace = source_ns != self.config.namespace;
        let origin = TypeRef::qualified(&source_ns, &decl.name);

        log::debug!(
            "generating from {} {origin} into package {}",
            decl.kind.as_str(),
            self.config.namespace
        );

        let mut needed = Vec::new();
        let requests = match decl.kind {
            DeclarationKind::Contract => {
                self.contract_requests(source, decl, &source_ns, cross_namespace, &mut needed)?
            }
            DeclarationKind::Record => {
                self.record_requests(source, decl, &source_ns, cross_namespace, &mut needed)?
            }
        };

        let comment = self
            .config
            .emit_comments
            .then(|| self.renderer.comment(&self.config.marker, &origin, self.config.replace));
        let units = requests
            .iter()
            .map(|request| GeneratedUnit::from_request(request, self.renderer, comment.clone()))
            .collect();

        let mut imports: Vec<ImportSpec> = Vec::new();
        for ns in needed {
            match self.imports.get(&ns) {
                Some(import) if !imports.contains(import) => imports.push(import.clone()),
                Some(_) => {}
                None => log::warn!("no import path known for package {ns}; add it by hand"),
            }
        }

        Ok(Generation {
            origin,
            units,
            imports,
        })
    }

    /// Merge a generation into a parsed destination
    pub fn merge_into(
        &self,
        generation: Generation,
        destination: DestinationFile,
    ) -> (DestinationFile, MergeReport) {
        merge::merge(
            destination,
            generation.units,
            &generation.imports,
            MergeOptions {
                replace: self.config.replace,
                marker: &self.config.marker,
                namespace: &self.config.namespace,
            },
        )
    }

    fn contract_requests(
        &self,
        source: &SourceFile,
        decl: &Declaration,
        source_ns: &str,
        cross_namespace: bool,
        needed: &mut Vec<String>,
    ) -> Result<Vec<SkeletonRequest>> {
        let shape = contract::extract(
            source,
            decl,
            ExtractOptions {
                follow_embeds: self.config.follow_embeds,
                policy: self.config.embed_policy,
                qualify_with: cross_namespace.then_some(source_ns),
            },
        )?;

        let type_name = self
            .config
            .type_name
            .clone()
            .unwrap_or_else(|| lower_first(&decl.name));

        let mut requests = vec![SkeletonRequest::TypeSkeleton {
            name: type_name.clone(),
            members: Vec::new(),
        }];

        if self.config.constructor {
            let returns = if cross_namespace {
                needed.push(source_ns.to_string());
                TypeRef::qualified(source_ns, &decl.name)
            } else {
                TypeRef::local(&decl.name)
            };
            requests.push(SkeletonRequest::Constructor {
                function: format!("New{}", upper_first(&type_name)),
                type_name: type_name.clone(),
                returns,
            });
        }

        if shape.requires_import {
            needed.push(source_ns.to_string());
        }

        requests.extend(shape.methods.into_iter().map(|method| SkeletonRequest::MethodStub {
            receiver: type_name.clone(),
            method,
        }));
        Ok(requests)
    }

    fn record_requests(
        &self,
        source: &SourceFile,
        decl: &Declaration,
        source_ns: &str,
        cross_namespace: bool,
        needed: &mut Vec<String>,
    ) -> Result<Vec<SkeletonRequest>> {
        let shape = record::shape(
            source,
            decl,
            RecordOptions {
                keep_tags: self.config.keep_tags,
                time_conversion: self.config.time_conversion,
                strict_fields: self.config.strict_fields,
                qualify_with: cross_namespace.then_some(source_ns),
            },
        )?;

        let type_name = self
            .config
            .type_name
            .clone()
            .unwrap_or_else(|| decl.name.clone());
        let mut requests = Vec::new();

        if cross_namespace || type_name != decl.name {
            requests.push(SkeletonRequest::TypeSkeleton {
                name: type_name.clone(),
                members: shape.members.clone(),
            });
            if shape.requires_import {
                needed.push(source_ns.to_string());
            }
        }

        if self.config.constructor {
            requests.push(SkeletonRequest::Constructor {
                function: format!("New{}", upper_first(&type_name)),
                type_name: type_name.clone(),
                returns: TypeRef::local(&type_name),
            });
        }

        for ns in &self.config.to {
            needed.push(ns.clone());
            requests.push(shape.transform(
                &type_name,
                TypeRef::qualified(ns, &decl.name),
                format!("To{}", pascal(ns)),
            ));
        }

        for ns in &self.config.from {
            needed.push(ns.clone());
            requests.push(shape.inverse(
                &type_name,
                TypeRef::qualified(ns, &decl.name),
                format!("New{}From{}", upper_first(&type_name), pascal(ns)),
            ));
        }

        Ok(requests)
    }
}

/// `ExampleUsecase` -> `exampleUsecase`
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `widgetImpl` -> `WidgetImpl`
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `user_profile` -> `UserProfile`
pub fn pascal(s: &str) -> String {
    s.split('_').filter(|p| !p.is_empty()).map(upper_first).collect()
}
