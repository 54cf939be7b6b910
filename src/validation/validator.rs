//! Document validation rules
//!
//! Operations:
//! - Operation names are unique and an anonymous operation stands alone
//! - The schema defines the operation's root type
//! - Subscriptions select exactly one root field
//!
//! Fields:
//! - Fields exist on their parent type
//! - Leaf fields have no selection, object fields must have one
//! - Fields sharing a response name select the same schema field
//!
//! Arguments:
//! - Arguments are known and unique, required ones are present
//! - Literal values fit the argument type
//!
//! Variables:
//! - Definitions are unique, of input type, with a valid default
//! - Every usage is defined and every definition is used
//! - Variable types fit every position they are used in

use std::collections::{HashMap, HashSet};

use crate::error::{Location, QueryError};
use crate::language::{Document, Field, InputValue, OperationDefinition, OperationKind, TypeRef};
use crate::schema::{check_literal, NamedType, ObjectType, Schema};

/// Meta field available on every object type
pub const TYPENAME_FIELD: &str = "__typename";

/// Validate `document` against `schema`
pub fn validate(schema: &Schema, document: &Document) -> Vec<QueryError> {
    DocumentValidator::new(schema).validate(document)
}

/// A variable reference found while walking an operation
struct VariableUsage<'d> {
    name: &'d str,
    expected: TypeRef,
    has_location_default: bool,
    location: Location,
}

/// Collects validation errors for one document.
pub struct DocumentValidator<'a> {
    schema: &'a Schema,
    errors: Vec<QueryError>,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            errors: Vec::new(),
        }
    }

    /// Run every rule and return the errors in document order
    pub fn validate(mut self, document: &Document) -> Vec<QueryError> {
        self.check_operation_names(document);
        for operation in &document.operations {
            self.check_operation(operation);
        }
        self.errors
    }

    fn report(&mut self, message: impl Into<String>, locations: &[Location]) {
        let error = locations
            .iter()
            .fold(QueryError::validation(message), |error, location| error.at(*location));
        self.errors.push(error);
    }

    // =========================================================================
    // Operations
    // =========================================================================

    fn check_operation_names(&mut self, document: &Document) {
        let mut seen: HashMap<&str, Location> = HashMap::new();
        for operation in &document.operations {
            match &operation.name {
                Some(name) => {
                    if let Some(first) = seen.get(name.as_str()).copied() {
                        self.report(
                            format!("There can be only one operation named \"{}\".", name),
                            &[first, operation.location],
                        );
                    } else {
                        seen.insert(name.as_str(), operation.location);
                    }
                }
                None if document.operations.len() > 1 => self.report(
                    "This anonymous operation must be the only defined operation.",
                    &[operation.location],
                ),
                None => {}
            }
        }
    }

    fn check_operation(&mut self, operation: &OperationDefinition) {
        let schema = self.schema;
        let Some(root) = schema.root_type(operation.kind) else {
            let message = match operation.kind {
                OperationKind::Query => "Schema does not define the required query root type.".to_string(),
                kind => format!("Schema is not configured for {}s.", kind),
            };
            self.report(message, &[operation.location]);
            return;
        };

        if operation.kind == OperationKind::Subscription && operation.selection_set.len() != 1 {
            let message = match &operation.name {
                Some(name) => format!("Subscription \"{}\" must select only one top level field.", name),
                None => "Anonymous Subscription must select only one top level field.".to_string(),
            };
            let mut locations: Vec<Location> = operation
                .selection_set
                .iter()
                .skip(1)
                .map(|field| field.location)
                .collect();
            if locations.is_empty() {
                locations.push(operation.location);
            }
            self.report(message, &locations);
        }

        self.check_variable_definitions(operation);

        let mut usages = Vec::new();
        self.check_selection_set(root, &operation.selection_set, &mut usages);
        self.check_variable_usages(operation, &usages);
    }

    // =========================================================================
    // Variables
    // =========================================================================

    fn check_variable_definitions(&mut self, operation: &OperationDefinition) {
        let schema = self.schema;
        let mut seen = HashSet::new();
        for definition in &operation.variables {
            if !seen.insert(definition.name.as_str()) {
                self.report(
                    format!("There can be only one variable named \"${}\".", definition.name),
                    &[definition.location],
                );
            }

            let is_input = schema
                .get_type(definition.ty.base_name())
                .is_some_and(NamedType::is_input);
            if !is_input {
                self.report(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        definition.name, definition.ty
                    ),
                    &[definition.location],
                );
                continue;
            }

            if let Some(default) = &definition.default_value {
                if let Err(reason) = check_literal(schema, &definition.ty, default) {
                    self.report(
                        format!(
                            "Variable \"${}\" has invalid default value: {}",
                            definition.name, reason
                        ),
                        &[definition.location],
                    );
                }
            }
        }
    }

    fn check_variable_usages(&mut self, operation: &OperationDefinition, usages: &[VariableUsage<'_>]) {
        let in_operation = |verb: &str| match &operation.name {
            Some(name) => format!(" {} operation \"{}\"", verb, name),
            None => String::new(),
        };

        for usage in usages {
            let Some(definition) = operation.variables.iter().find(|v| v.name == usage.name) else {
                self.report(
                    format!("Variable \"${}\" is not defined{}.", usage.name, in_operation("by")),
                    &[usage.location, operation.location],
                );
                continue;
            };

            let has_default = definition
                .default_value
                .as_ref()
                .is_some_and(|v| !matches!(v, InputValue::Null));
            if !is_allowed_usage(&definition.ty, has_default, &usage.expected, usage.has_location_default) {
                self.report(
                    format!(
                        "Variable \"${}\" of type \"{}\" used in position expecting type \"{}\".",
                        usage.name, definition.ty, usage.expected
                    ),
                    &[definition.location, usage.location],
                );
            }
        }

        for definition in &operation.variables {
            if !usages.iter().any(|usage| usage.name == definition.name) {
                self.report(
                    format!(
                        "Variable \"${}\" is never used{}.",
                        definition.name,
                        in_operation("in")
                    ),
                    &[definition.location],
                );
            }
        }
    }

    // =========================================================================
    // Fields and arguments
    // =========================================================================

    fn check_selection_set<'d>(
        &mut self,
        parent: &ObjectType,
        selection_set: &'d [Field],
        usages: &mut Vec<VariableUsage<'d>>,
    ) {
        let schema = self.schema;
        let mut by_response_name: HashMap<&str, &Field> = HashMap::new();

        for field in selection_set {
            if let Some(previous) = by_response_name.get(field.response_name()).copied() {
                if previous.name != field.name {
                    self.report(
                        format!(
                            "Fields \"{}\" conflict because \"{}\" and \"{}\" are different fields. Use different aliases on the fields to fetch both if this was intentional.",
                            field.response_name(),
                            previous.name,
                            field.name
                        ),
                        &[previous.location, field.location],
                    );
                } else if previous.arguments != field.arguments {
                    self.report(
                        format!(
                            "Fields \"{}\" conflict because they have differing arguments. Use different aliases on the fields to fetch both if this was intentional.",
                            field.response_name()
                        ),
                        &[previous.location, field.location],
                    );
                }
            } else {
                by_response_name.insert(field.response_name(), field);
            }

            if field.name == TYPENAME_FIELD {
                if !field.selection_set.is_empty() {
                    self.report(
                        format!(
                            "Field \"{}\" must not have a selection since type \"String!\" has no subfields.",
                            field.name
                        ),
                        &[field.location],
                    );
                }
                continue;
            }

            let Some(definition) = parent.get_field(&field.name) else {
                self.report(
                    format!(
                        "Cannot query field \"{}\" on type \"{}\".",
                        field.name, parent.name
                    ),
                    &[field.location],
                );
                continue;
            };

            for (index, (name, value)) in field.arguments.iter().enumerate() {
                if field.arguments[..index].iter().any(|(other, _)| other == name) {
                    self.report(
                        format!("There can be only one argument named \"{}\".", name),
                        &[field.location],
                    );
                    continue;
                }
                let Some(argument) = definition.arguments.get(name) else {
                    self.report(
                        format!(
                            "Unknown argument \"{}\" on field \"{}.{}\".",
                            name, parent.name, field.name
                        ),
                        &[field.location],
                    );
                    continue;
                };
                if let Err(reason) = check_literal(schema, &argument.ty, value) {
                    self.report(reason, &[field.location]);
                }
                collect_usages(
                    value,
                    &argument.ty,
                    argument.default_value.is_some(),
                    field.location,
                    usages,
                );
            }

            for argument in definition.arguments.values() {
                let supplied = field.argument(&argument.name);
                if argument.is_required() && supplied.is_none() {
                    self.report(
                        format!(
                            "Field \"{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                            field.name, argument.name, argument.ty
                        ),
                        &[field.location],
                    );
                }
            }

            match schema.get_type(definition.ty.base_name()) {
                Some(NamedType::Object(object)) => {
                    if field.selection_set.is_empty() {
                        self.report(
                            format!(
                                "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                                field.name, definition.ty, field.name
                            ),
                            &[field.location],
                        );
                    } else {
                        self.check_selection_set(object, &field.selection_set, usages);
                    }
                }
                Some(_) if !field.selection_set.is_empty() => self.report(
                    format!(
                        "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                        field.name, definition.ty
                    ),
                    &[field.location],
                ),
                _ => {}
            }
        }
    }
}

/// Record every variable inside `value` with the type its position expects
fn collect_usages<'d>(
    value: &'d InputValue,
    expected: &TypeRef,
    has_location_default: bool,
    location: Location,
    usages: &mut Vec<VariableUsage<'d>>,
) {
    match value {
        InputValue::Variable(name) => usages.push(VariableUsage {
            name,
            expected: expected.clone(),
            has_location_default,
            location,
        }),
        InputValue::List(items) => {
            let item_type = match expected.nullable() {
                TypeRef::List(inner) => inner.as_ref(),
                other => other,
            };
            for item in items {
                collect_usages(item, item_type, false, location, usages);
            }
        }
        InputValue::Object(fields) => {
            for (_, item) in fields {
                collect_usages(item, expected, false, location, usages);
            }
        }
        _ => {}
    }
}

/// A nullable variable may fill a non-null position when either side has a
/// default value.
fn is_allowed_usage(
    variable_type: &TypeRef,
    variable_has_default: bool,
    location_type: &TypeRef,
    location_has_default: bool,
) -> bool {
    if let TypeRef::NonNull(inner) = location_type {
        if !variable_type.is_non_null() {
            if variable_has_default || location_has_default {
                return is_subtype(variable_type, inner);
            }
            return false;
        }
    }
    is_subtype(variable_type, location_type)
}

fn is_subtype(sub: &TypeRef, sup: &TypeRef) -> bool {
    match (sub, sup) {
        (TypeRef::NonNull(a), TypeRef::NonNull(b)) => is_subtype(a, b),
        (_, TypeRef::NonNull(_)) => false,
        (TypeRef::NonNull(a), b) => is_subtype(a, b),
        (TypeRef::List(a), TypeRef::List(b)) => is_subtype(a, b),
        (TypeRef::List(_), _) | (_, TypeRef::List(_)) => false,
        (TypeRef::Named(a), TypeRef::Named(b)) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parse_query;

    const SDL: &str = r#"
        type Query {
            ping: String
            user(id: ID!): User
            users(limit: Int = 10, role: Role): [User!]!
        }
        type User { id: ID! name: String friends(first: Int): [User] }
        type Mutation { rename(id: ID!, name: String!): User }
        type Subscription { tick: Int message(room: String!): String }
        enum Role { ADMIN MEMBER }
    "#;

    fn messages(query: &str) -> Vec<String> {
        let schema = Schema::from_sdl(SDL).unwrap();
        let document = parse_query(query).unwrap();
        validate(&schema, &document)
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_valid_documents() {
        assert!(messages("{ ping }").is_empty());
        assert!(messages("query Q($id: ID!) { user(id: $id) { id name friends(first: 2) { id } } }").is_empty());
        assert!(messages("{ users(role: ADMIN) { id __typename } }").is_empty());
        assert!(messages("mutation { rename(id: 1, name: \"x\") { id } }").is_empty());
        assert!(messages("subscription { message(room: \"a\") }").is_empty());
        assert!(messages("query A { ping } query B { ping }").is_empty());
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(
            messages("{ nope }"),
            ["Cannot query field \"nope\" on type \"Query\"."]
        );
        assert_eq!(
            messages("{ user(id: 1) { email } }"),
            ["Cannot query field \"email\" on type \"User\"."]
        );
    }

    #[test]
    fn test_leaf_and_composite_selections() {
        assert_eq!(
            messages("{ ping { x } }"),
            ["Field \"ping\" must not have a selection since type \"String\" has no subfields."]
        );
        assert_eq!(
            messages("{ user(id: 1) }"),
            ["Field \"user\" of type \"User\" must have a selection of subfields. Did you mean \"user { ... }\"?"]
        );
    }

    #[test]
    fn test_arguments() {
        assert_eq!(
            messages("{ user { id } }"),
            ["Field \"user\" argument \"id\" of type \"ID!\" is required, but it was not provided."]
        );
        assert_eq!(
            messages("{ ping(x: 1) }"),
            ["Unknown argument \"x\" on field \"Query.ping\"."]
        );
        assert_eq!(
            messages("{ users(limit: \"ten\") { id } }"),
            ["Expected value of type \"Int\", found \"ten\"."]
        );
        assert_eq!(
            messages("{ users(role: OWNER) { id } }"),
            ["Value \"OWNER\" does not exist in \"Role\" enum."]
        );
        assert_eq!(
            messages("{ users(limit: 1, limit: 2) { id } }"),
            ["There can be only one argument named \"limit\"."]
        );
    }

    #[test]
    fn test_operation_rules() {
        assert_eq!(
            messages("query A { ping } query A { ping }"),
            ["There can be only one operation named \"A\"."]
        );
        assert_eq!(
            messages("{ ping } query B { ping }"),
            ["This anonymous operation must be the only defined operation."]
        );
        assert_eq!(
            messages("subscription S { tick message(room: \"a\") }"),
            ["Subscription \"S\" must select only one top level field."]
        );

        let schema = Schema::from_sdl("type Query { ping: String }").unwrap();
        let document = parse_query("mutation { ping }").unwrap();
        let errors = validate(&schema, &document);
        assert_eq!(errors[0].message, "Schema is not configured for mutations.");
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            messages("query Q { user(id: $id) { id } }"),
            ["Variable \"$id\" is not defined by operation \"Q\"."]
        );
        assert_eq!(
            messages("query Q($unused: Int) { ping }"),
            ["Variable \"$unused\" is never used in operation \"Q\"."]
        );
        assert_eq!(
            messages("query ($a: Int, $a: Int) { users(limit: $a) { id } }"),
            ["There can be only one variable named \"$a\"."]
        );
        assert_eq!(
            messages("query ($u: User) { ping }")[0],
            "Variable \"$u\" cannot be non-input type \"User\"."
        );
        assert_eq!(
            messages("query ($id: ID) { user(id: $id) { id } }"),
            ["Variable \"$id\" of type \"ID\" used in position expecting type \"ID!\"."]
        );
        assert!(messages("query ($id: ID = 1) { user(id: $id) { id } }").is_empty());
        assert!(messages("query ($n: Int!) { users(limit: $n) { id } }").is_empty());
    }

    #[test]
    fn test_field_conflicts() {
        assert_eq!(
            messages("{ a: ping a: users { id } }"),
            ["Fields \"a\" conflict because \"ping\" and \"users\" are different fields. Use different aliases on the fields to fetch both if this was intentional."]
        );
        assert!(messages("{ ping ping }").is_empty());
    }

    #[test]
    fn test_errors_carry_locations() {
        let schema = Schema::from_sdl(SDL).unwrap();
        let document = parse_query("{\n  nope\n}").unwrap();
        let errors = validate(&schema, &document);
        assert_eq!(errors[0].locations, vec![Location::new(2, 3)]);
    }
}
