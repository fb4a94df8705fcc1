//! Structured template data handed to a [`BodyRenderer`].
//!
//! The engine decides *what* to generate; the renderer owns every line of
//! target-language text.

use crate::destination::{BlockKey, BlockKind};
use crate::types::{MethodSignature, StructMember, TypeRef};
use serde::{Deserialize, Serialize};

/// Kind of a generated declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    TypeSkeleton,
    MethodStub,
    ConstructorStub,
    TransformMethod,
    TransformFunction,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::TypeSkeleton => "type",
            UnitKind::MethodStub => "method",
            UnitKind::ConstructorStub => "constructor",
            UnitKind::TransformMethod => "transform",
            UnitKind::TransformFunction => "inverse_transform",
        }
    }

    /// Destination block kind the unit occupies
    pub fn block_kind(self) -> BlockKind {
        match self {
            UnitKind::TypeSkeleton => BlockKind::TypeDecl,
            UnitKind::MethodStub | UnitKind::TransformMethod => BlockKind::Method,
            UnitKind::ConstructorStub | UnitKind::TransformFunction => BlockKind::Function,
        }
    }

    /// Append order for units missing from the destination
    pub(crate) fn insertion_rank(self) -> u8 {
        match self {
            UnitKind::TypeSkeleton => 0,
            UnitKind::ConstructorStub => 1,
            UnitKind::MethodStub | UnitKind::TransformMethod | UnitKind::TransformFunction => 2,
        }
    }
}

/// What to generate, without any target-language text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkeletonRequest {
    /// `type Name struct { members }`
    TypeSkeleton {
        name: String,
        members: Vec<StructMember>,
    },

    /// Method on `*receiver` that is left for the user to implement
    MethodStub {
        receiver: String,
        method: MethodSignature,
    },

    /// `func New<type_name>() returns`
    Constructor {
        function: String,
        type_name: String,
        returns: TypeRef,
    },

    /// Method on `*receiver` building a `target` from same-named fields
    Transform {
        receiver: String,
        method: String,
        target: TypeRef,
        fields: Vec<String>,
    },

    /// Free function building a `result` from a `source` value
    InverseTransform {
        function: String,
        source: TypeRef,
        result: String,
        fields: Vec<String>,
    },
}

impl SkeletonRequest {
    pub fn kind(&self) -> UnitKind {
        match self {
            SkeletonRequest::TypeSkeleton { .. } => UnitKind::TypeSkeleton,
            SkeletonRequest::MethodStub { .. } => UnitKind::MethodStub,
            SkeletonRequest::Constructor { .. } => UnitKind::ConstructorStub,
            SkeletonRequest::Transform { .. } => UnitKind::TransformMethod,
            SkeletonRequest::InverseTransform { .. } => UnitKind::TransformFunction,
        }
    }

    /// Declared name of the generated unit
    pub fn name(&self) -> &str {
        match self {
            SkeletonRequest::TypeSkeleton { name, .. } => name,
            SkeletonRequest::MethodStub { method, .. } => &method.name,
            SkeletonRequest::Constructor { function, .. } => function,
            SkeletonRequest::Transform { method, .. } => method,
            SkeletonRequest::InverseTransform { function, .. } => function,
        }
    }

    pub fn receiver(&self) -> Option<&str> {
        match self {
            SkeletonRequest::MethodStub { receiver, .. }
            | SkeletonRequest::Transform { receiver, .. } => Some(receiver),
            _ => None,
        }
    }
}

/// Turns skeleton requests into target-language text
pub trait BodyRenderer {
    /// Full declaration text for a request
    fn render(&self, request: &SkeletonRequest) -> String;

    /// Leading comment for a generated declaration; must contain `marker`
    fn comment(&self, marker: &str, origin: &TypeRef, replace: bool) -> String;
}

/// A rendered declaration ready to be merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedUnit {
    pub kind: UnitKind,
    pub name: String,
    pub receiver: Option<String>,
    pub comment: Option<String>,
    pub text: String,
}

impl GeneratedUnit {
    /// Render a request with the given renderer
    pub fn from_request(
        request: &SkeletonRequest,
        renderer: &dyn BodyRenderer,
        comment: Option<String>,
    ) -> Self {
        Self {
            kind: request.kind(),
            name: request.name().to_string(),
            receiver: request.receiver().map(str::to_string),
            comment,
            text: renderer.render(request),
        }
    }

    /// Identity used to match the unit against destination blocks
    pub fn key(&self) -> BlockKey {
        BlockKey {
            kind: self.kind.block_kind(),
            name: self.name.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_units_share_block_kind() {
        assert_eq!(UnitKind::MethodStub.block_kind(), BlockKind::Method);
        assert_eq!(UnitKind::TransformMethod.block_kind(), BlockKind::Method);
        assert_eq!(UnitKind::TransformFunction.block_kind(), BlockKind::Function);
    }

    #[test]
    fn test_request_identity() {
        let request = SkeletonRequest::Transform {
            receiver: "User".into(),
            method: "ToEntity".into(),
            target: TypeRef::qualified("entity", "User"),
            fields: vec!["ID".into()],
        };
        assert_eq!(request.kind(), UnitKind::TransformMethod);
        assert_eq!(request.name(), "ToEntity");
        assert_eq!(request.receiver(), Some("User"));
    }
}
