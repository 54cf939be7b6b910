//! Structural schema validation
//!
//! Run once before the gateway accepts requests, and again on every extension
//! of a ready gateway. All issues are collected so a single failure report
//! lists everything that must be fixed.
//!
//! Rules:
//! - The query root type exists and is an object type
//! - Explicit mutation/subscription root types exist and are object types
//! - Object types define at least one field
//! - Enum types define at least one value
//! - Field types reference known types
//! - Argument types are input types, defaults fit their type
//! - Names do not use the reserved `__` prefix

use crate::language::OperationKind;

use super::coercion::coerce_input;
use super::errors::{SchemaError, SchemaResult};
use super::types::{NamedType, ObjectType, Schema};

/// Validates schema structure.
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
    issues: Vec<String>,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            issues: Vec::new(),
        }
    }

    /// Validate and return every issue found
    pub fn issues(mut self) -> Vec<String> {
        self.check_roots();
        let schema = self.schema;
        for ty in schema.types() {
            self.check_name(ty.name());
            match ty {
                NamedType::Object(object) => self.check_object(object),
                NamedType::Enum(enum_type) => {
                    if enum_type.values.is_empty() {
                        self.issues.push(format!(
                            "Enum type {} must define one or more values.",
                            enum_type.name
                        ));
                    }
                }
                NamedType::Scalar(_) => {}
            }
        }
        self.issues
    }

    /// Validate, failing with `QG_SCHEMA_INVALID` on any issue
    pub fn validate(self) -> SchemaResult<()> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::invalid(issues))
        }
    }

    fn check_roots(&mut self) {
        let schema = self.schema;
        let roots = [
            (OperationKind::Query, "Query", schema.query_type.is_some()),
            (OperationKind::Mutation, "Mutation", schema.mutation_type.is_some()),
            (OperationKind::Subscription, "Subscription", schema.subscription_type.is_some()),
        ];

        for (kind, label, explicit) in roots {
            let Some(name) = schema.root_type_name(kind) else {
                if kind == OperationKind::Query {
                    self.issues.push("Query root type must be provided.".into());
                }
                continue;
            };
            match schema.get_type(name) {
                Some(NamedType::Object(_)) => {}
                Some(other) => {
                    let qualifier = if kind == OperationKind::Query { "" } else { " if provided" };
                    self.issues.push(format!(
                        "{} root type must be Object type{}, it cannot be {} type \"{}\".",
                        label,
                        qualifier,
                        other.kind_name(),
                        name
                    ));
                }
                None if explicit => self
                    .issues
                    .push(format!("Unknown {} root type \"{}\".", kind, name)),
                None => {}
            }
        }
    }

    fn check_name(&mut self, name: &str) {
        if name.starts_with("__") {
            self.issues.push(format!(
                "Name \"{}\" must not begin with \"__\", which is reserved by GraphQL introspection.",
                name
            ));
        }
    }

    fn check_object(&mut self, object: &ObjectType) {
        let schema = self.schema;
        if object.fields.is_empty() {
            self.issues.push(format!(
                "Type {} must define one or more fields.",
                object.name
            ));
        }

        for field in object.fields.values() {
            self.check_name(&field.name);
            if schema.get_type(field.ty.base_name()).is_none() {
                self.issues.push(format!(
                    "Unknown type \"{}\" referenced by field \"{}.{}\".",
                    field.ty.base_name(),
                    object.name,
                    field.name
                ));
            }

            for arg in field.arguments.values() {
                self.check_name(&arg.name);
                let coordinate = format!("{}.{}({}:)", object.name, field.name, arg.name);
                match schema.get_type(arg.ty.base_name()) {
                    Some(ty) if ty.is_input() => {
                        if let Some(default) = &arg.default_value {
                            if let Err(reason) = coerce_input(schema, &arg.ty, default) {
                                self.issues.push(format!(
                                    "Default value of {} is invalid: {}",
                                    coordinate, reason
                                ));
                            }
                        }
                    }
                    Some(_) => self.issues.push(format!(
                        "The type of {} must be Input Type but got: {}.",
                        coordinate, arg.ty
                    )),
                    None => self.issues.push(format!(
                        "Unknown type \"{}\" referenced by argument {}.",
                        arg.ty.base_name(),
                        coordinate
                    )),
                }
            }
        }
    }
}

impl Schema {
    /// Validate schema structure
    pub fn validate(&self) -> SchemaResult<()> {
        SchemaValidator::new(self).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;

    fn issues(sdl: &str) -> Vec<String> {
        SchemaValidator::new(&Schema::from_sdl(sdl).unwrap()).issues()
    }

    #[test]
    fn test_valid_schema() {
        assert!(issues("type Query { ping: String hello(name: String = \"x\"): String }").is_empty());
    }

    #[test]
    fn test_empty_query_type_is_invalid() {
        let err = Schema::empty().validate().unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::QgSchemaInvalid);
        assert!(err.is_fatal());
        assert_eq!(err.issues(), ["Type Query must define one or more fields."]);
    }

    #[test]
    fn test_missing_query_root() {
        assert_eq!(issues("type Foo { a: Int }"), ["Query root type must be provided."]);
    }

    #[test]
    fn test_unknown_and_non_input_types() {
        let found = issues("type Query { a: Missing b(u: User): Int } type User { id: ID }");
        assert!(found.contains(&"Unknown type \"Missing\" referenced by field \"Query.a\".".to_string()));
        assert!(found.contains(&"The type of Query.b(u:) must be Input Type but got: User.".to_string()));
    }

    #[test]
    fn test_bad_default_and_reserved_names() {
        let found = issues("type Query { a(n: Int = \"x\"): Int __b: Int }");
        assert!(found.iter().any(|i| i.starts_with("Default value of Query.a(n:) is invalid")));
        assert!(found.iter().any(|i| i.contains("\"__b\" must not begin with \"__\"")));
    }

    #[test]
    fn test_root_must_be_object() {
        let found = issues("schema { query: Query subscription: Color } type Query { a: Int } enum Color { RED }");
        assert_eq!(
            found,
            ["Subscription root type must be Object type if provided, it cannot be enum type \"Color\"."]
        );

        let found = issues("schema { query: Query mutation: Nope } type Query { a: Int }");
        assert_eq!(found, ["Unknown mutation root type \"Nope\"."]);
    }
}
