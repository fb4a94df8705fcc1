use stubgen_engine::{BodyRenderer, SkeletonRequest, StructMember, TypeRef};

/// Body line placed in every generated method stub
pub const STUB_MARKER: &str = "// TODO: implement me";

/// Renders skeleton requests as Go source
#[derive(Debug, Default, Clone, Copy)]
pub struct GoTemplates;

impl BodyRenderer for GoTemplates {
    fn render(&self, request: &SkeletonRequest) -> String {
        match request {
            SkeletonRequest::TypeSkeleton { name, members } => type_decl(name, members),
            SkeletonRequest::MethodStub { receiver, method } => format!(
                "func ({} *{receiver}) {} {{\n\t{STUB_MARKER}\n\tpanic(\"implement me\")\n}}",
                receiver_var(receiver),
                method.signature()
            ),
            SkeletonRequest::Constructor {
                function,
                type_name,
                returns,
            } => {
                let result = if *returns == TypeRef::local(type_name) {
                    format!("*{returns}")
                } else {
                    returns.to_string()
                };
                format!("func {function}() {result} {{\n\treturn &{type_name}{{}}\n}}")
            }
            SkeletonRequest::Transform {
                receiver,
                method,
                target,
                fields,
            } => format!(
                "func (elem *{receiver}) {method}() *{target} {{\n\treturn &{target}{{\n{}\t}}\n}}",
                assignments(fields)
            ),
            SkeletonRequest::InverseTransform {
                function,
                source,
                result,
                fields,
            } => format!(
                "func {function}(elem *{source}) *{result} {{\n\treturn &{result}{{\n{}\t}}\n}}",
                assignments(fields)
            ),
        }
    }

    fn comment(&self, marker: &str, origin: &TypeRef, replace: bool) -> String {
        let mut comment = format!("// {marker}. Source: {origin}");
        if replace {
            comment.push_str("\n//\n// REPLACE CAUTION: edits to this declaration are overwritten on regeneration.");
        }
        comment
    }
}

fn type_decl(name: &str, members: &[StructMember]) -> String {
    if members.is_empty() {
        return format!("type {name} struct{{}}");
    }

    let mut text = format!("type {name} struct {{\n");
    for member in members {
        text.push('\t');
        text.push_str(&member.text);
        if let Some(tag) = &member.tag {
            text.push(' ');
            text.push_str(tag);
        }
        text.push('\n');
    }
    text.push('}');
    text
}

fn assignments(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("\t\t{f}: elem.{f},\n"))
        .collect()
}

/// Single lowercase letter naming the receiver
fn receiver_var(receiver: &str) -> String {
    receiver
        .chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_else(|| "r".to_string())
}
