use crate::config::TimeConversion;
use crate::error::{GenError, Result};
use crate::qualify::Qualifier;
use crate::skeleton::SkeletonRequest;
use crate::source::SourceFile;
use crate::types::{Declaration, DeclarationKind, FieldDescriptor, RecordShape, StructMember, TypeRef};
use std::collections::HashMap;
use tree_sitter::Node;

/// Options for reading a record
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOptions<'a> {
    /// Keep member tags in the copied members
    pub keep_tags: bool,
    pub time_conversion: TimeConversion,
    /// Duplicate flattened field names become an error
    pub strict_fields: bool,
    pub qualify_with: Option<&'a str>,
}

/// Read the members and flattened field list of a record declaration
pub fn shape(source: &SourceFile, decl: &Declaration, options: RecordOptions<'_>) -> Result<RecordShape> {
    if decl.kind != DeclarationKind::Record {
        return Err(GenError::not_found(format!("{} is not a struct", decl.name)));
    }

    let spec = source
        .spec_for(decl)
        .ok_or_else(|| GenError::not_found(decl.name.clone()))?;

    let qualifier = options
        .qualify_with
        .map(|ns| Qualifier::new(ns, &decl.type_parameters));

    let mut shape = RecordShape {
        name: decl.name.clone(),
        ..Default::default()
    };

    for member in field_declarations(spec) {
        let parsed = Member::read(source, member, qualifier.as_ref(), options.time_conversion);
        shape.requires_import |= parsed.rewritten;
        shape.members.push(StructMember {
            text: parsed.text,
            tag: parsed.tag.filter(|_| options.keep_tags),
        });
    }

    let mut stack = vec![decl.name.clone()];
    shape.fields = flatten(source, spec, options.time_conversion, None, &mut stack)?;
    shape.collisions = collisions(&shape.fields);

    if !shape.collisions.is_empty() {
        if options.strict_fields {
            return Err(GenError::FieldCollision {
                record: decl.name.clone(),
                fields: shape.collisions,
            });
        }
        log::warn!(
            "{} has duplicate flattened fields: {}",
            decl.name,
            shape.collisions.join(", ")
        );
    }

    Ok(shape)
}

impl RecordShape {
    /// Method on `receiver` returning a `*target` built from the receiver's fields
    pub fn transform(&self, receiver: &str, target: TypeRef, method: impl Into<String>) -> SkeletonRequest {
        SkeletonRequest::Transform {
            receiver: receiver.to_string(),
            method: method.into(),
            target,
            fields: self.field_names().into_iter().map(str::to_string).collect(),
        }
    }

    /// Free function building a `*result` from a `source` value
    pub fn inverse(&self, result: &str, source: TypeRef, function: impl Into<String>) -> SkeletonRequest {
        SkeletonRequest::InverseTransform {
            function: function.into(),
            source,
            result: result.to_string(),
            fields: self.field_names().into_iter().map(str::to_string).collect(),
        }
    }
}

/// A member declaration rewritten for the destination
struct Member {
    text: String,
    tag: Option<String>,
    rewritten: bool,
}

impl Member {
    fn read(
        source: &SourceFile,
        node: Node<'_>,
        qualifier: Option<&Qualifier<'_>>,
        conversion: TimeConversion,
    ) -> Self {
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|n| source.node_text(n).to_string())
            .collect();

        let pointer = is_pointer_embed(node);
        let (type_text, rewritten) = match node.child_by_field_name("type") {
            Some(ty) => match qualifier {
                Some(q) => {
                    let qualified = q.apply(source, ty);
                    (qualified.text, qualified.rewritten)
                }
                None => (source.node_text(ty).to_string(), false),
            },
            None => (String::new(), false),
        };
        let type_text = if names.iter().any(|n| is_time_field(n)) {
            convert_time(&type_text, conversion)
        } else {
            type_text
        };

        let text = if names.is_empty() {
            format!("{}{type_text}", if pointer { "*" } else { "" })
        } else {
            format!("{} {type_text}", names.join(", "))
        };

        Self {
            text,
            tag: node
                .child_by_field_name("tag")
                .map(|t| source.node_text(t).to_string()),
            rewritten,
        }
    }
}

fn field_declarations(spec: Node<'_>) -> Vec<Node<'_>> {
    let Some(body) = spec.child_by_field_name("type") else {
        return Vec::new();
    };

    let mut cursor = body.walk();
    let Some(list) = body
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    let mut inner = list.walk();
    let fields = list
        .named_children(&mut inner)
        .filter(|n| n.kind() == "field_declaration")
        .collect();
    fields
}

/// Field names reachable on the record, with local embeds expanded in place
fn flatten(
    source: &SourceFile,
    spec: Node<'_>,
    conversion: TimeConversion,
    promoted_from: Option<&str>,
    stack: &mut Vec<String>,
) -> Result<Vec<FieldDescriptor>> {
    let mut fields = Vec::new();

    for member in field_declarations(spec) {
        let mut cursor = member.walk();
        let names: Vec<_> = member
            .children_by_field_name("name", &mut cursor)
            .map(|n| source.node_text(n).to_string())
            .collect();
        let Some(ty) = member.child_by_field_name("type") else {
            continue;
        };
        let type_text = source.node_text(ty).to_string();
        let tag = member
            .child_by_field_name("tag")
            .map(|t| source.node_text(t).to_string());

        if !names.is_empty() {
            for name in names {
                let type_text = if is_time_field(&name) {
                    convert_time(&type_text, conversion)
                } else {
                    type_text.clone()
                };
                fields.push(FieldDescriptor {
                    name,
                    type_text,
                    tag: tag.clone(),
                    promoted_from: promoted_from.map(str::to_string),
                });
            }
            continue;
        }

        let embedded = innermost_name(source, ty);
        let local = (ty.kind() == "type_identifier" || ty.kind() == "generic_type")
            .then(|| source.find_type_spec(&embedded))
            .flatten()
            .filter(|s| {
                source
                    .declaration(*s)
                    .is_some_and(|d| d.kind == DeclarationKind::Record)
            });

        match local {
            Some(inner) => {
                if stack.contains(&embedded) {
                    let mut chain = stack.clone();
                    chain.push(embedded);
                    return Err(GenError::CyclicEmbed { chain });
                }
                stack.push(embedded.clone());
                fields.extend(flatten(source, inner, conversion, Some(&embedded), stack)?);
                stack.pop();
            }
            None => fields.push(FieldDescriptor {
                name: embedded,
                type_text,
                tag,
                promoted_from: promoted_from.map(str::to_string),
            }),
        }
    }

    Ok(fields)
}

/// `*pkg.Base` and `Base[T]` both name `Base`
fn innermost_name(source: &SourceFile, ty: Node<'_>) -> String {
    let node = match ty.kind() {
        "qualified_type" => ty.child_by_field_name("name").unwrap_or(ty),
        "generic_type" => ty.child_by_field_name("type").unwrap_or(ty),
        _ => ty,
    };
    let text = source.node_text(node);
    text.rsplit('.').next().unwrap_or(text).to_string()
}

fn is_pointer_embed(member: Node<'_>) -> bool {
    let mut cursor = member.walk();
    let pointer = member
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == "*");
    pointer
}

fn is_time_field(name: &str) -> bool {
    name.ends_with("Time") || name.ends_with("time")
}

fn convert_time(type_text: &str, conversion: TimeConversion) -> String {
    match (conversion, type_text) {
        (TimeConversion::Unix, "string") => "int64".to_string(),
        (TimeConversion::Timestamp, "int64") => "string".to_string(),
        _ => type_text.to_string(),
    }
}

fn collisions(fields: &[FieldDescriptor]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for field in fields {
        *counts.entry(field.name.as_str()).or_default() += 1;
    }

    let mut names = Vec::new();
    for field in fields {
        if counts.get(field.name.as_str()).copied().unwrap_or(0) > 1
            && !names.contains(&field.name)
        {
            names.push(field.name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::find_by_name;
    use pretty_assertions::assert_eq;

    const MODELS: &str = r#"package example

type Base struct {
	ID        int64
	CreatedTime string
}

type User struct {
	Base
	Name, Email string `json:"name"`
	Profile     *Profile
	*audit.Stamp
}

type Profile struct {
	Bio string
}

type Loop struct {
	Loop2
}

type Loop2 struct {
	Loop
}

type Clash struct {
	Base
	ID int64
}
"#;

    fn shape_of(name: &str, options: RecordOptions<'_>) -> Result<RecordShape> {
        let src = SourceFile::parse("m.go", MODELS).unwrap();
        let decl = find_by_name(&src, name).unwrap();
        shape(&src, &decl, options)
    }

    #[test]
    fn test_embedded_local_record_is_flattened() {
        let shape = shape_of("User", RecordOptions::default()).unwrap();
        assert_eq!(
            shape.field_names(),
            vec!["ID", "CreatedTime", "Name", "Email", "Profile", "Stamp"]
        );
        assert_eq!(shape.fields[0].promoted_from.as_deref(), Some("Base"));
        assert_eq!(shape.fields[2].tag.as_deref(), Some("`json:\"name\"`"));
        assert!(shape.collisions.is_empty());
    }

    #[test]
    fn test_members_are_copied_without_tags() {
        let shape = shape_of("User", RecordOptions::default()).unwrap();
        let texts: Vec<_> = shape.members.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Base", "Name, Email string", "Profile *Profile", "*audit.Stamp"]);
        assert!(shape.members.iter().all(|m| m.tag.is_none()));
    }

    #[test]
    fn test_keep_tags_and_qualification() {
        let options = RecordOptions {
            keep_tags: true,
            qualify_with: Some("example"),
            ..Default::default()
        };
        let shape = shape_of("User", options).unwrap();
        assert!(shape.requires_import);
        assert_eq!(shape.members[0].text, "example.Base");
        assert_eq!(shape.members[1].tag.as_deref(), Some("`json:\"name\"`"));
        assert_eq!(shape.members[2].text, "Profile *example.Profile");
        assert_eq!(shape.members[3].text, "*audit.Stamp");
    }

    #[test]
    fn test_unix_conversion_retypes_time_fields() {
        let options = RecordOptions {
            time_conversion: TimeConversion::Unix,
            ..Default::default()
        };
        let shape = shape_of("Base", options).unwrap();
        assert_eq!(shape.members[1].text, "CreatedTime int64");
        assert_eq!(shape.fields[1].type_text, "int64");
        assert_eq!(shape.fields[0].type_text, "int64");
    }

    #[test]
    fn test_embed_cycle_is_rejected() {
        let err = shape_of("Loop", RecordOptions::default()).unwrap_err();
        assert!(matches!(err, GenError::CyclicEmbed { .. }), "{err}");
    }

    #[test]
    fn test_collisions_are_reported() {
        let shape = shape_of("Clash", RecordOptions::default()).unwrap();
        assert_eq!(shape.field_names(), vec!["ID", "CreatedTime", "ID"]);
        assert_eq!(shape.collisions, vec!["ID"]);

        let strict = RecordOptions {
            strict_fields: true,
            ..Default::default()
        };
        let err = shape_of("Clash", strict).unwrap_err();
        assert!(matches!(err, GenError::FieldCollision { ref fields, .. } if fields == &["ID"]));
    }

    #[test]
    fn test_transform_lists_fields_in_order() {
        let shape = shape_of("Profile", RecordOptions::default()).unwrap();
        let request = shape.transform("Profile", TypeRef::qualified("entity", "Profile"), "ToEntity");
        assert_eq!(
            request,
            SkeletonRequest::Transform {
                receiver: "Profile".into(),
                method: "ToEntity".into(),
                target: TypeRef::qualified("entity", "Profile"),
                fields: vec!["Bio".into()],
            }
        );
    }

    #[test]
    fn test_contract_is_rejected() {
        let src = SourceFile::parse("c.go", "package p\n\ntype C interface{}\n").unwrap();
        let decl = find_by_name(&src, "C").unwrap();
        assert!(shape(&src, &decl, RecordOptions::default()).is_err());
    }
}
