use crate::source::SourceFile;
use tree_sitter::Node;

/// Rewrites exported, unqualified type names so they resolve from another package.
#[derive(Debug, Clone, Copy)]
pub struct Qualifier<'a> {
    namespace: &'a str,
    type_parameters: &'a [String],
}

/// Text of a node after qualification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualified {
    pub text: String,
    pub rewritten: bool,
}

impl<'a> Qualifier<'a> {
    #[must_use]
    pub const fn new(namespace: &'a str, type_parameters: &'a [String]) -> Self {
        Self {
            namespace,
            type_parameters,
        }
    }

    /// Qualify the text spanned by `node`
    pub(crate) fn apply(&self, source: &SourceFile, node: Node<'_>) -> Qualified {
        let mut spans = Vec::new();
        self.collect(source, node, &mut spans);

        let base = node.start_byte();
        let original = source.node_text(node);
        if spans.is_empty() {
            return Qualified {
                text: original.to_string(),
                rewritten: false,
            };
        }

        let mut text = String::with_capacity(original.len() + spans.len() * (self.namespace.len() + 1));
        let mut last = 0;
        for start in spans {
            let at = start - base;
            text.push_str(&original[last..at]);
            text.push_str(self.namespace);
            text.push('.');
            last = at;
        }
        text.push_str(&original[last..]);

        Qualified {
            text,
            rewritten: true,
        }
    }

    fn collect(&self, source: &SourceFile, node: Node<'_>, spans: &mut Vec<usize>) {
        if node.kind() == "type_identifier" && self.needs_prefix(source, node) {
            spans.push(node.start_byte());
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect(source, child, spans);
        }
    }

    fn needs_prefix(&self, source: &SourceFile, node: Node<'_>) -> bool {
        if node
            .parent()
            .is_some_and(|p| p.kind() == "qualified_type")
        {
            return false;
        }

        let name = source.node_text(node);
        let exported = name.chars().next().is_some_and(char::is_uppercase);
        exported && !self.type_parameters.iter().any(|p| p == name)
    }
}
