use crate::config::EmbedPolicy;
use crate::error::{GenError, Result};
use crate::qualify::Qualifier;
use crate::source::SourceFile;
use crate::types::{ContractShape, Declaration, DeclarationKind, MethodSignature};
use std::collections::HashSet;
use tree_sitter::Node;

/// Options for contract extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions<'a> {
    /// Expand embedded contracts declared in the same file
    pub follow_embeds: bool,
    pub policy: EmbedPolicy,
    /// Namespace to prefix exported type names with
    pub qualify_with: Option<&'a str>,
}

impl Default for ExtractOptions<'_> {
    fn default() -> Self {
        Self {
            follow_embeds: true,
            policy: EmbedPolicy::Lenient,
            qualify_with: None,
        }
    }
}

/// Extract the flattened method set of a contract declaration
pub fn extract(
    source: &SourceFile,
    decl: &Declaration,
    options: ExtractOptions<'_>,
) -> Result<ContractShape> {
    if decl.kind != DeclarationKind::Contract {
        return Err(GenError::not_found(format!("{} is not an interface", decl.name)));
    }

    let spec = source
        .spec_for(decl)
        .ok_or_else(|| GenError::not_found(decl.name.clone()))?;

    let mut extractor = Extractor {
        source,
        options,
        shape: ContractShape {
            name: decl.name.clone(),
            ..Default::default()
        },
        seen: HashSet::new(),
        expanding: Vec::new(),
    };
    extractor.expand(decl, spec)?;

    log::debug!(
        "extracted {} methods from {} (embeds: {:?})",
        extractor.shape.methods.len(),
        decl.name,
        extractor.shape.embeds
    );
    Ok(extractor.shape)
}

enum Embed<'t> {
    Local(String, Node<'t>),
    External(String),
}

struct Extractor<'s> {
    source: &'s SourceFile,
    options: ExtractOptions<'s>,
    shape: ContractShape,
    seen: HashSet<String>,
    /// Contracts on the current expansion path
    expanding: Vec<String>,
}

impl<'s> Extractor<'s> {
    fn expand(&mut self, decl: &Declaration, spec: Node<'s>) -> Result<()> {
        if self.expanding.contains(&decl.name) {
            let mut chain = self.expanding.clone();
            chain.push(decl.name.clone());
            return Err(GenError::CyclicEmbed { chain });
        }
        self.expanding.push(decl.name.clone());

        let qualifier = self
            .options
            .qualify_with
            .map(|ns| Qualifier::new(ns, &decl.type_parameters));

        let Some(body) = spec.child_by_field_name("type") else {
            return Err(GenError::not_found(decl.name.clone()));
        };

        let mut embeds = Vec::new();
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_elem" | "method_spec" => self.add_method(member, qualifier.as_ref()),
                "type_elem" | "constraint_elem" | "interface_type_name" => {
                    if let Some(embed) = self.classify_embed(member) {
                        embeds.push(embed);
                    }
                }
                _ => {}
            }
        }

        if self.options.follow_embeds {
            for embed in embeds {
                match embed {
                    Embed::Local(name, node) => self.expand_local(&name, node)?,
                    Embed::External(name) => {
                        log::warn!("skipping embed {name} from another package");
                    }
                }
            }
        }

        self.expanding.pop();
        Ok(())
    }

    fn expand_local(&mut self, name: &str, node: Node<'s>) -> Result<()> {
        let source = self.source;
        let resolved = source
            .find_type_spec(name)
            .and_then(|spec| Some((spec, source.declaration(spec)?)))
            .filter(|(_, d)| d.is_contract());

        let Some((spec, decl)) = resolved else {
            return match self.options.policy {
                EmbedPolicy::Strict => Err(GenError::UnresolvedEmbed {
                    name: name.to_string(),
                }),
                EmbedPolicy::Lenient => {
                    log::warn!(
                        "skipping unresolved embed {name} at line {}",
                        node.start_position().row + 1
                    );
                    Ok(())
                }
            };
        };

        if !self.shape.embeds.iter().any(|e| e == name) {
            self.shape.embeds.push(name.to_string());
        }
        self.expand(&decl, spec)
    }

    fn add_method(&mut self, member: Node<'_>, qualifier: Option<&Qualifier<'_>>) {
        let Some(name) = member.child_by_field_name("name") else {
            return;
        };
        let name = self.source.node_text(name).to_string();
        if !self.seen.insert(name.clone()) {
            log::debug!("method {name} already declared; keeping first occurrence");
            return;
        }

        let parameters = self.render(member.child_by_field_name("parameters"), qualifier);
        let results = self.render(member.child_by_field_name("result"), qualifier);

        self.shape.methods.push(MethodSignature {
            name,
            parameters,
            results,
            source_text: self.source.node_text(member).to_string(),
        });
    }

    fn render(&mut self, node: Option<Node<'_>>, qualifier: Option<&Qualifier<'_>>) -> String {
        match (node, qualifier) {
            (None, _) => String::new(),
            (Some(node), Some(q)) => {
                let qualified = q.apply(self.source, node);
                self.shape.requires_import |= qualified.rewritten;
                qualified.text
            }
            (Some(node), None) => self.source.node_text(node).to_string(),
        }
    }

    /// A plain or qualified type name used as an embed; unions and `~T` are ignored
    fn classify_embed(&self, member: Node<'s>) -> Option<Embed<'s>> {
        let mut cursor = member.walk();
        let types: Vec<_> = member.named_children(&mut cursor).collect();
        let ty = match types.as_slice() {
            [] => member,
            [single] => *single,
            _ => return None,
        };

        let source = self.source;
        match ty.kind() {
            "type_identifier" => Some(Embed::Local(source.node_text(ty).to_string(), ty)),
            "qualified_type" => Some(Embed::External(source.node_text(ty).to_string())),
            _ => None,
        }
    }
}
