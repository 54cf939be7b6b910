//! Builds schemas from SDL and applies schema extensions.
//!
//! Definitions are applied before extensions so a document may extend a type
//! it defines itself. Applying a document never mutates its input schema.

use crate::language::{
    parse_schema, EnumTypeDefinition, FieldDefinition, ObjectTypeDefinition, SchemaDefinition,
    TypeSystemDefinition, TypeSystemDocument,
};

use super::errors::{SchemaError, SchemaResult};
use super::types::{ArgumentDef, EnumType, FieldDef, NamedType, ObjectType, ScalarType, Schema};

impl Schema {
    /// Build a schema from SDL text
    pub fn from_sdl(sdl: &str) -> SchemaResult<Self> {
        let document = parse_schema(sdl).map_err(SchemaError::syntax)?;
        Self::from_document(&document)
    }

    /// Build a schema from a parsed SDL document
    pub fn from_document(document: &TypeSystemDocument) -> SchemaResult<Self> {
        Schema::builtins().extend(document)
    }

    /// Return a new schema with `document` applied on top of this one
    pub fn extend(&self, document: &TypeSystemDocument) -> SchemaResult<Self> {
        let mut schema = self.clone();
        let mut explicit_roots = self.query_type.is_some()
            || self.mutation_type.is_some()
            || self.subscription_type.is_some();

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Schema(def) if !def.extend => {
                    if explicit_roots {
                        return Err(SchemaError::invalid_extension(
                            "Must provide only one schema definition.",
                        ));
                    }
                    explicit_roots = true;
                    apply_schema_definition(&mut schema, def)?;
                }
                TypeSystemDefinition::Object(def) if !def.extend => {
                    define_type(&mut schema, NamedType::Object(build_object(def)?))?;
                }
                TypeSystemDefinition::Enum(def) if !def.extend => {
                    define_type(&mut schema, NamedType::Enum(build_enum(def)?))?;
                }
                TypeSystemDefinition::Scalar(def) => {
                    let mut scalar = ScalarType::new(&def.name);
                    scalar.description = def.description.clone();
                    define_type(&mut schema, NamedType::Scalar(scalar))?;
                }
                _ => {}
            }
        }

        for definition in &document.definitions {
            match definition {
                TypeSystemDefinition::Schema(def) if def.extend => {
                    apply_schema_definition(&mut schema, def)?;
                }
                TypeSystemDefinition::Object(def) if def.extend => {
                    extend_object(&mut schema, def)?;
                }
                TypeSystemDefinition::Enum(def) if def.extend => {
                    extend_enum(&mut schema, def)?;
                }
                _ => {}
            }
        }

        Ok(schema)
    }
}

fn define_type(schema: &mut Schema, ty: NamedType) -> SchemaResult<()> {
    if schema.types.contains_key(ty.name()) {
        return Err(SchemaError::invalid_extension(format!(
            "Type \"{}\" already exists in the schema. It cannot also be defined in this type definition.",
            ty.name()
        )));
    }
    schema.types.insert(ty.name().to_string(), ty);
    Ok(())
}

fn apply_schema_definition(schema: &mut Schema, def: &SchemaDefinition) -> SchemaResult<()> {
    let slots = [
        ("query", &def.query, &mut schema.query_type),
        ("mutation", &def.mutation, &mut schema.mutation_type),
        ("subscription", &def.subscription, &mut schema.subscription_type),
    ];
    for (operation, requested, slot) in slots {
        if let Some(name) = requested {
            if slot.is_some() {
                return Err(SchemaError::invalid_extension(format!(
                    "Type for {} already defined in the schema. It cannot be redefined.",
                    operation
                )));
            }
            *slot = Some(name.clone());
        }
    }
    Ok(())
}

fn build_field(type_name: &str, def: &FieldDefinition) -> SchemaResult<FieldDef> {
    let mut field = FieldDef::new(&def.name, def.ty.clone());
    field.description = def.description.clone();
    for arg in &def.arguments {
        if field.arguments.contains_key(&arg.name) {
            return Err(SchemaError::invalid_extension(format!(
                "Argument \"{}.{}({}:)\" can only be defined once.",
                type_name, def.name, arg.name
            )));
        }
        let mut argument = ArgumentDef::new(&arg.name, arg.ty.clone());
        argument.default_value = arg.default_value.as_ref().map(|v| v.to_const_json());
        field = field.argument(argument);
    }
    Ok(field)
}

fn build_object(def: &ObjectTypeDefinition) -> SchemaResult<ObjectType> {
    let mut object = ObjectType::new(&def.name);
    object.description = def.description.clone();
    for field in &def.fields {
        if object.fields.contains_key(&field.name) {
            return Err(SchemaError::invalid_extension(format!(
                "Field \"{}.{}\" can only be defined once.",
                def.name, field.name
            )));
        }
        object = object.field(build_field(&def.name, field)?);
    }
    Ok(object)
}

fn build_enum(def: &EnumTypeDefinition) -> SchemaResult<EnumType> {
    let mut values: Vec<String> = Vec::new();
    for value in &def.values {
        if values.contains(value) {
            return Err(SchemaError::invalid_extension(format!(
                "Enum value \"{}.{}\" can only be defined once.",
                def.name, value
            )));
        }
        values.push(value.clone());
    }
    let mut enum_type = EnumType::new(&def.name, values);
    enum_type.description = def.description.clone();
    Ok(enum_type)
}

fn extend_object(schema: &mut Schema, def: &ObjectTypeDefinition) -> SchemaResult<()> {
    let object = match schema.types.get_mut(&def.name) {
        Some(NamedType::Object(object)) => object,
        Some(_) => {
            return Err(SchemaError::invalid_extension(format!(
                "Cannot extend non-object type \"{}\".",
                def.name
            )))
        }
        None => {
            return Err(SchemaError::invalid_extension(format!(
                "Cannot extend type \"{}\" because it is not defined.",
                def.name
            )))
        }
    };

    for field in &def.fields {
        if object.fields.contains_key(&field.name) {
            return Err(SchemaError::invalid_extension(format!(
                "Field \"{}.{}\" already exists in the schema. It cannot also be defined in this type extension.",
                def.name, field.name
            )));
        }
        let built = build_field(&def.name, field)?;
        object.fields.insert(built.name.clone(), built);
    }
    Ok(())
}

fn extend_enum(schema: &mut Schema, def: &EnumTypeDefinition) -> SchemaResult<()> {
    let enum_type = match schema.types.get_mut(&def.name) {
        Some(NamedType::Enum(enum_type)) => enum_type,
        Some(_) => {
            return Err(SchemaError::invalid_extension(format!(
                "Cannot extend non-enum type \"{}\".",
                def.name
            )))
        }
        None => {
            return Err(SchemaError::invalid_extension(format!(
                "Cannot extend type \"{}\" because it is not defined.",
                def.name
            )))
        }
    };

    for value in &def.values {
        if enum_type.has_value(value) {
            return Err(SchemaError::invalid_extension(format!(
                "Enum value \"{}.{}\" already exists in the schema. It cannot also be defined in this type extension.",
                def.name, value
            )));
        }
        enum_type.values.push(value.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{OperationKind, TypeRef};
    use crate::schema::SchemaErrorCode;

    #[test]
    fn test_build_from_sdl() {
        let schema = Schema::from_sdl(
            r#"
            type Query { user(id: ID!, active: Boolean = true): User }
            type User { id: ID! name: String }
            enum Role { ADMIN USER }
            scalar Date
            "#,
        )
        .unwrap();

        let query = schema.root_type(OperationKind::Query).unwrap();
        let user = query.get_field("user").unwrap();
        assert_eq!(user.ty, TypeRef::named("User"));
        assert!(user.arguments["id"].is_required());
        assert_eq!(user.arguments["active"].default_value, Some(serde_json::json!(true)));
        assert!(matches!(schema.get_type("Role"), Some(NamedType::Enum(_))));
        assert!(matches!(schema.get_type("Date"), Some(NamedType::Scalar(_))));
    }

    #[test]
    fn test_extend_adds_fields_without_mutating_original() {
        let base = Schema::empty();
        let doc = parse_schema("extend type Query { ping: String }").unwrap();
        let extended = base.extend(&doc).unwrap();

        assert!(base.root_type(OperationKind::Query).unwrap().fields.is_empty());
        assert!(extended
            .root_type(OperationKind::Query)
            .unwrap()
            .get_field("ping")
            .is_some());
    }

    #[test]
    fn test_extension_in_same_document() {
        let schema = Schema::from_sdl(
            "type Query { a: Int } extend type Query { b: Int } enum E { X } extend enum E { Y }",
        )
        .unwrap();
        assert_eq!(schema.object("Query").unwrap().fields.len(), 2);
        match schema.get_type("E") {
            Some(NamedType::Enum(e)) => assert_eq!(e.values, vec!["X", "Y"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schema_definition_sets_roots() {
        let schema = Schema::from_sdl(
            "schema { query: Root subscription: Events } type Root { a: Int } type Events { e: Int }",
        )
        .unwrap();
        assert_eq!(schema.root_type_name(OperationKind::Query), Some("Root"));
        assert_eq!(schema.root_type_name(OperationKind::Subscription), Some("Events"));
    }

    #[test]
    fn test_extension_conflicts() {
        let base = Schema::from_sdl("type Query { a: Int }").unwrap();

        let dup_field = parse_schema("extend type Query { a: String }").unwrap();
        let err = base.extend(&dup_field).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::QgSchemaExtensionInvalid);
        assert!(err.message().contains("Field \"Query.a\" already exists"));

        let unknown = parse_schema("extend type Missing { a: Int }").unwrap();
        assert!(base
            .extend(&unknown)
            .unwrap_err()
            .message()
            .contains("Cannot extend type \"Missing\" because it is not defined."));

        let redefine = parse_schema("type Query { b: Int }").unwrap();
        assert!(base.extend(&redefine).is_err());

        let not_object = parse_schema("extend type String { a: Int }").unwrap();
        assert!(base
            .extend(&not_object)
            .unwrap_err()
            .message()
            .contains("Cannot extend non-object type"));
    }

    #[test]
    fn test_syntax_error_in_sdl() {
        let err = Schema::from_sdl("type Query {").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::QgSchemaSyntax);
        assert!(err.message().starts_with("Syntax Error"));
    }
}
