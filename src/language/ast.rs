//! Syntax trees for executable documents and type-system (SDL) documents.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::Location;

// =============================================================================
// Shared
// =============================================================================

/// A type reference such as `String`, `[Int!]` or `User!`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    /// The innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.base_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Strip one level of non-null wrapping
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// A literal or variable in argument and default-value position
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Enum(String),
    List(Vec<InputValue>),
    Object(Vec<(String, InputValue)>),
    Variable(String),
}

impl InputValue {
    /// Convert to JSON, substituting variables from `variables`.
    /// Unbound variables become null.
    pub fn to_json(&self, variables: &Map<String, Value>) -> Value {
        match self {
            InputValue::Null => Value::Null,
            InputValue::Int(i) => Value::from(*i),
            InputValue::Float(f) => Value::from(*f),
            InputValue::String(s) => Value::String(s.clone()),
            InputValue::Boolean(b) => Value::Bool(*b),
            InputValue::Enum(e) => Value::String(e.clone()),
            InputValue::List(items) => {
                Value::Array(items.iter().map(|v| v.to_json(variables)).collect())
            }
            InputValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json(variables)))
                    .collect(),
            ),
            InputValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    /// Convert a constant value to JSON
    pub fn to_const_json(&self) -> Value {
        self.to_json(&Map::new())
    }

    /// Collect the names of all variables referenced by this value
    pub fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            InputValue::Variable(name) => out.push(name),
            InputValue::List(items) => items.iter().for_each(|v| v.collect_variables(out)),
            InputValue::Object(fields) => fields.iter().for_each(|(_, v)| v.collect_variables(out)),
            _ => {}
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Null => write!(f, "null"),
            InputValue::Int(i) => write!(f, "{}", i),
            InputValue::Float(v) => write!(f, "{}", v),
            InputValue::String(s) => write!(f, "{:?}", s),
            InputValue::Boolean(b) => write!(f, "{}", b),
            InputValue::Enum(e) => write!(f, "{}", e),
            InputValue::Variable(v) => write!(f, "${}", v),
            InputValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            InputValue::Object(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// =============================================================================
// Executable documents
// =============================================================================

/// A parsed query document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub operations: Vec<OperationDefinition>,
}

impl Document {
    /// Select the operation to run.
    ///
    /// With no name the document must contain exactly one operation.
    pub fn operation(&self, name: Option<&str>) -> Result<&OperationDefinition, String> {
        self.operation_index(name).map(|index| &self.operations[index])
    }

    /// Position of the selected operation in `operations`
    pub fn operation_index(&self, name: Option<&str>) -> Result<usize, String> {
        match name {
            Some(name) => self
                .operations
                .iter()
                .position(|op| op.name.as_deref() == Some(name))
                .ok_or_else(|| format!("Unknown operation named \"{}\".", name)),
            None => match self.operations.len() {
                1 => Ok(0),
                0 => Err("Must provide an operation.".to_string()),
                _ => Err("Must provide operation name if query contains multiple operations."
                    .to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub variables: Vec<VariableDefinition>,
    pub selection_set: Vec<Field>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub default_value: Option<InputValue>,
    pub location: Location,
}

/// A field selection
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub selection_set: Vec<Field>,
    pub location: Location,
}

impl Field {
    /// The key this field occupies in the response object
    pub fn response_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

// =============================================================================
// Type-system documents
// =============================================================================

/// A parsed SDL document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeSystemDocument {
    pub definitions: Vec<TypeSystemDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSystemDefinition {
    Schema(SchemaDefinition),
    Object(ObjectTypeDefinition),
    Scalar(ScalarTypeDefinition),
    Enum(EnumTypeDefinition),
}

/// `schema { query: Q mutation: M subscription: S }`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDefinition {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
    pub extend: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub extend: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: TypeRef,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<InputValue>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
    pub extend: bool,
    pub location: Location,
}
