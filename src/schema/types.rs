//! Schema type definitions
//!
//! Supported named types:
//! - Built-in scalars: `String`, `Int`, `Float`, `Boolean`, `ID`
//! - Custom scalars (values pass through unchanged)
//! - Enums
//! - Object types with fields and scalar/enum arguments

use std::collections::BTreeMap;

use serde_json::Value;

use crate::language::{OperationKind, TypeRef};

/// Scalars every schema carries
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// A named type in the schema
#[derive(Debug, Clone, PartialEq)]
pub enum NamedType {
    Scalar(ScalarType),
    Enum(EnumType),
    Object(ObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Scalar(t) => &t.name,
            NamedType::Enum(t) => &t.name,
            NamedType::Object(t) => &t.name,
        }
    }

    /// Kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            NamedType::Scalar(_) => "scalar",
            NamedType::Enum(_) => "enum",
            NamedType::Object(_) => "object",
        }
    }

    /// Leaf types have no subfields
    pub fn is_leaf(&self) -> bool {
        !matches!(self, NamedType::Object(_))
    }

    /// Types usable as argument and variable types
    pub fn is_input(&self) -> bool {
        self.is_leaf()
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            NamedType::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_SCALARS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// An object type; field order is not significant
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: BTreeMap<String, FieldDef>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field registration
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: BTreeMap<String, ArgumentDef>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: BTreeMap::new(),
        }
    }

    pub fn argument(mut self, argument: ArgumentDef) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Non-null without a default must be supplied
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// A complete schema.
///
/// Root operation types default to `Query`, `Mutation` and `Subscription`
/// unless a `schema { ... }` definition names them explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(crate) types: BTreeMap<String, NamedType>,
    pub(crate) query_type: Option<String>,
    pub(crate) mutation_type: Option<String>,
    pub(crate) subscription_type: Option<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

impl Schema {
    /// Built-in scalars only, no root types
    pub(crate) fn builtins() -> Self {
        let types = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), NamedType::Scalar(ScalarType::new(*name))))
            .collect();
        Self {
            types,
            query_type: None,
            mutation_type: None,
            subscription_type: None,
        }
    }

    /// A schema whose `Query` type has no fields yet.
    ///
    /// Does not pass structural validation until fields are added.
    pub fn empty() -> Self {
        Self::builtins().with_type(NamedType::Object(ObjectType::new("Query")))
    }

    /// Register or replace a named type
    pub fn with_type(mut self, ty: NamedType) -> Self {
        self.types.insert(ty.name().to_string(), ty);
        self
    }

    pub fn get_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.get_type(name).and_then(NamedType::as_object)
    }

    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    /// Name of the root type for an operation kind, if configured
    pub fn root_type_name(&self, kind: OperationKind) -> Option<&str> {
        let (explicit, default) = match kind {
            OperationKind::Query => (&self.query_type, "Query"),
            OperationKind::Mutation => (&self.mutation_type, "Mutation"),
            OperationKind::Subscription => (&self.subscription_type, "Subscription"),
        };
        match explicit {
            Some(name) => Some(name.as_str()),
            None if self.types.contains_key(default) => Some(default),
            None => None,
        }
    }

    /// Root object type for an operation kind
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectType> {
        self.root_type_name(kind).and_then(|name| self.object(name))
    }
}
