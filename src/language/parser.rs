//! Recursive-descent parsers for query documents and SDL documents.
//!
//! Fragments, directives, interfaces, unions and input object types are not
//! part of the supported language; they surface as syntax errors.

use crate::error::{Location, QueryError};

use super::ast::{
    Document, EnumTypeDefinition, Field, FieldDefinition, InputValue, InputValueDefinition,
    ObjectTypeDefinition, OperationDefinition, OperationKind, ScalarTypeDefinition,
    SchemaDefinition, TypeRef, TypeSystemDefinition, TypeSystemDocument, VariableDefinition,
};
use super::lexer::{tokenize, Token};

/// Deepest nesting of selection sets, list/object values and type references
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse an executable (query) document.
pub fn parse_query(source: &str) -> Result<Document, QueryError> {
    let mut parser = Parser::new(source)?;
    let mut operations = Vec::new();
    loop {
        operations.push(parser.parse_operation()?);
        if parser.peek() == &Token::Eof {
            break;
        }
    }
    Ok(Document { operations })
}

/// Parse a type-system (SDL) document.
pub fn parse_schema(source: &str) -> Result<TypeSystemDocument, QueryError> {
    let mut parser = Parser::new(source)?;
    let mut definitions = Vec::new();
    loop {
        definitions.push(parser.parse_type_system_definition()?);
        if parser.peek() == &Token::Eof {
            break;
        }
    }
    Ok(TypeSystemDocument { definitions })
}

struct Parser {
    tokens: Vec<(Token, Location)>,
    idx: usize,
    depth: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, QueryError> {
        Ok(Self {
            tokens: tokenize(source)?,
            idx: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.idx].0
    }

    fn location(&self) -> Location {
        self.tokens[self.idx].1
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.idx].0.clone();
        if token != Token::Eof {
            self.idx += 1;
        }
        token
    }

    fn unexpected(&self) -> QueryError {
        QueryError::syntax(format!("Unexpected {}.", self.peek()), self.location())
    }

    fn expected(&self, what: &str) -> QueryError {
        QueryError::syntax(
            format!("Expected {}, found {}.", what, self.peek()),
            self.location(),
        )
    }

    fn skip(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), QueryError> {
        if self.skip(&token) {
            Ok(())
        } else {
            Err(self.expected(&token.to_string()))
        }
    }

    fn descend(&mut self) -> Result<(), QueryError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(QueryError::syntax(
                format!("Document exceeds the maximum nesting depth of {}.", MAX_NESTING_DEPTH),
                self.location(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Name(name) if name == keyword)
    }

    fn expect_name(&mut self) -> Result<String, QueryError> {
        if let Token::Name(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.expected("Name"))
        }
    }

    // =========================================================================
    // Executable definitions
    // =========================================================================

    fn parse_operation(&mut self) -> Result<OperationDefinition, QueryError> {
        let location = self.location();

        if self.peek() == &Token::BraceL {
            return Ok(OperationDefinition {
                kind: OperationKind::Query,
                name: None,
                variables: Vec::new(),
                selection_set: self.parse_selection_set()?,
                location,
            });
        }

        let kind = match self.peek() {
            Token::Name(name) if name == "query" => OperationKind::Query,
            Token::Name(name) if name == "mutation" => OperationKind::Mutation,
            Token::Name(name) if name == "subscription" => OperationKind::Subscription,
            _ => return Err(self.unexpected()),
        };
        self.advance();

        let name = match self.peek() {
            Token::Name(_) => Some(self.expect_name()?),
            _ => None,
        };
        let variables = self.parse_variable_definitions()?;
        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            kind,
            name,
            variables,
            selection_set,
            location,
        })
    }

    fn parse_variable_definitions(&mut self) -> Result<Vec<VariableDefinition>, QueryError> {
        let mut definitions = Vec::new();
        if !self.skip(&Token::ParenL) {
            return Ok(definitions);
        }
        loop {
            let location = self.location();
            self.expect(Token::Dollar)?;
            let name = self.expect_name()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type_ref()?;
            let default_value = if self.skip(&Token::Equals) {
                Some(self.parse_value(true)?)
            } else {
                None
            };
            definitions.push(VariableDefinition {
                name,
                ty,
                default_value,
                location,
            });
            if self.skip(&Token::ParenR) {
                return Ok(definitions);
            }
        }
    }

    fn parse_selection_set(&mut self) -> Result<Vec<Field>, QueryError> {
        self.expect(Token::BraceL)?;
        self.descend()?;
        let mut fields = Vec::new();
        loop {
            fields.push(self.parse_field()?);
            if self.skip(&Token::BraceR) {
                self.ascend();
                return Ok(fields);
            }
        }
    }

    fn parse_field(&mut self) -> Result<Field, QueryError> {
        let location = self.location();
        let first = self.expect_name()?;
        let (alias, name) = if self.skip(&Token::Colon) {
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };

        let arguments = self.parse_arguments()?;
        let selection_set = if self.peek() == &Token::BraceL {
            self.parse_selection_set()?
        } else {
            Vec::new()
        };

        Ok(Field {
            alias,
            name,
            arguments,
            selection_set,
            location,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<(String, InputValue)>, QueryError> {
        let mut arguments = Vec::new();
        if !self.skip(&Token::ParenL) {
            return Ok(arguments);
        }
        loop {
            let name = self.expect_name()?;
            self.expect(Token::Colon)?;
            arguments.push((name, self.parse_value(false)?));
            if self.skip(&Token::ParenR) {
                return Ok(arguments);
            }
        }
    }

    fn parse_value(&mut self, constant: bool) -> Result<InputValue, QueryError> {
        let location = self.location();
        let value = match self.peek().clone() {
            Token::Dollar if !constant => {
                self.advance();
                InputValue::Variable(self.expect_name()?)
            }
            Token::Int(text) => {
                self.advance();
                match text.parse::<i64>() {
                    Ok(i) => InputValue::Int(i),
                    Err(_) => InputValue::Float(text.parse::<f64>().unwrap_or(f64::INFINITY)),
                }
            }
            Token::Float(text) => {
                self.advance();
                let parsed = text.parse::<f64>().map_err(|_| {
                    QueryError::syntax(format!("Invalid number \"{}\".", text), location)
                })?;
                InputValue::Float(parsed)
            }
            Token::String(s) | Token::BlockString(s) => {
                self.advance();
                InputValue::String(s)
            }
            Token::Name(name) => {
                self.advance();
                match name.as_str() {
                    "true" => InputValue::Boolean(true),
                    "false" => InputValue::Boolean(false),
                    "null" => InputValue::Null,
                    _ => InputValue::Enum(name),
                }
            }
            Token::BracketL => {
                self.advance();
                self.descend()?;
                let mut items = Vec::new();
                while !self.skip(&Token::BracketR) {
                    items.push(self.parse_value(constant)?);
                }
                self.ascend();
                InputValue::List(items)
            }
            Token::BraceL => {
                self.advance();
                self.descend()?;
                let mut fields = Vec::new();
                while !self.skip(&Token::BraceR) {
                    let name = self.expect_name()?;
                    self.expect(Token::Colon)?;
                    fields.push((name, self.parse_value(constant)?));
                }
                self.ascend();
                InputValue::Object(fields)
            }
            _ => return Err(self.unexpected()),
        };
        Ok(value)
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, QueryError> {
        let ty = if self.skip(&Token::BracketL) {
            self.descend()?;
            let inner = self.parse_type_ref()?;
            self.expect(Token::BracketR)?;
            self.ascend();
            TypeRef::list(inner)
        } else {
            TypeRef::Named(self.expect_name()?)
        };
        Ok(if self.skip(&Token::Bang) {
            TypeRef::non_null(ty)
        } else {
            ty
        })
    }

    // =========================================================================
    // Type-system definitions
    // =========================================================================

    fn parse_description(&mut self) -> Option<String> {
        let description = match self.peek() {
            Token::String(s) | Token::BlockString(s) => s.clone(),
            _ => return None,
        };
        self.advance();
        Some(description)
    }

    fn parse_type_system_definition(&mut self) -> Result<TypeSystemDefinition, QueryError> {
        let description = self.parse_description();
        let location = self.location();

        let extend = self.peek_keyword("extend");
        if extend {
            self.advance();
        }

        let keyword = match self.peek() {
            Token::Name(name) => name.clone(),
            _ => return Err(self.unexpected()),
        };

        match keyword.as_str() {
            "schema" => {
                self.advance();
                Ok(TypeSystemDefinition::Schema(
                    self.parse_schema_definition(extend, location)?,
                ))
            }
            "type" => {
                self.advance();
                let name = self.expect_name()?;
                let fields = self.parse_fields_definition()?;
                Ok(TypeSystemDefinition::Object(ObjectTypeDefinition {
                    name,
                    description,
                    fields,
                    extend,
                    location,
                }))
            }
            "scalar" if !extend => {
                self.advance();
                let name = self.expect_name()?;
                Ok(TypeSystemDefinition::Scalar(ScalarTypeDefinition {
                    name,
                    description,
                    location,
                }))
            }
            "enum" => {
                self.advance();
                let name = self.expect_name()?;
                let values = self.parse_enum_values()?;
                Ok(TypeSystemDefinition::Enum(EnumTypeDefinition {
                    name,
                    description,
                    values,
                    extend,
                    location,
                }))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_schema_definition(
        &mut self,
        extend: bool,
        location: Location,
    ) -> Result<SchemaDefinition, QueryError> {
        let mut definition = SchemaDefinition {
            extend,
            location,
            ..SchemaDefinition::default()
        };
        self.expect(Token::BraceL)?;
        loop {
            let operation = self.expect_name()?;
            self.expect(Token::Colon)?;
            let type_name = Some(self.expect_name()?);
            match operation.as_str() {
                "query" => definition.query = type_name,
                "mutation" => definition.mutation = type_name,
                "subscription" => definition.subscription = type_name,
                other => {
                    return Err(QueryError::syntax(
                        format!("Unexpected operation type \"{}\".", other),
                        location,
                    ))
                }
            }
            if self.skip(&Token::BraceR) {
                return Ok(definition);
            }
        }
    }

    fn parse_fields_definition(&mut self) -> Result<Vec<FieldDefinition>, QueryError> {
        let mut fields = Vec::new();
        if !self.skip(&Token::BraceL) {
            return Ok(fields);
        }
        loop {
            let description = self.parse_description();
            let location = self.location();
            let name = self.expect_name()?;
            let arguments = self.parse_argument_definitions()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type_ref()?;
            fields.push(FieldDefinition {
                name,
                description,
                arguments,
                ty,
                location,
            });
            if self.skip(&Token::BraceR) {
                return Ok(fields);
            }
        }
    }

    fn parse_argument_definitions(&mut self) -> Result<Vec<InputValueDefinition>, QueryError> {
        let mut arguments = Vec::new();
        if !self.skip(&Token::ParenL) {
            return Ok(arguments);
        }
        loop {
            let description = self.parse_description();
            let location = self.location();
            let name = self.expect_name()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type_ref()?;
            let default_value = if self.skip(&Token::Equals) {
                Some(self.parse_value(true)?)
            } else {
                None
            };
            arguments.push(InputValueDefinition {
                name,
                description,
                ty,
                default_value,
                location,
            });
            if self.skip(&Token::ParenR) {
                return Ok(arguments);
            }
        }
    }

    fn parse_enum_values(&mut self) -> Result<Vec<String>, QueryError> {
        let mut values = Vec::new();
        if !self.skip(&Token::BraceL) {
            return Ok(values);
        }
        loop {
            self.parse_description();
            let location = self.location();
            let value = self.expect_name()?;
            if matches!(value.as_str(), "true" | "false" | "null") {
                return Err(QueryError::syntax(
                    format!("Name \"{}\" is reserved and cannot be used for an enum value.", value),
                    location,
                ));
            }
            values.push(value);
            if self.skip(&Token::BraceR) {
                return Ok(values);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand_query() {
        let doc = parse_query("{ ping }").unwrap();
        assert_eq!(doc.operations.len(), 1);
        let op = &doc.operations[0];
        assert_eq!(op.kind, OperationKind::Query);
        assert!(op.name.is_none());
        assert_eq!(op.selection_set[0].name, "ping");
    }

    #[test]
    fn test_parse_named_operation_with_variables() {
        let doc = parse_query(
            "query GetUser($id: ID!, $limit: Int = 10) { me: user(id: $id) { name posts(limit: $limit) { title } } }",
        )
        .unwrap();
        let op = &doc.operations[0];
        assert_eq!(op.name.as_deref(), Some("GetUser"));
        assert_eq!(op.variables.len(), 2);
        assert_eq!(op.variables[0].ty.to_string(), "ID!");
        assert_eq!(op.variables[1].default_value, Some(InputValue::Int(10)));

        let user = &op.selection_set[0];
        assert_eq!(user.response_name(), "me");
        assert_eq!(user.name, "user");
        assert_eq!(user.argument("id"), Some(&InputValue::Variable("id".into())));
        assert_eq!(user.selection_set[1].selection_set[0].name, "title");
    }

    #[test]
    fn test_parse_values() {
        let doc = parse_query(r#"{ f(a: [1, 2.5, "s", true, null, RED], b: {x: 1}) }"#).unwrap();
        let field = &doc.operations[0].selection_set[0];
        assert_eq!(
            field.argument("a"),
            Some(&InputValue::List(vec![
                InputValue::Int(1),
                InputValue::Float(2.5),
                InputValue::String("s".into()),
                InputValue::Boolean(true),
                InputValue::Null,
                InputValue::Enum("RED".into()),
            ]))
        );
        assert_eq!(
            field.argument("b"),
            Some(&InputValue::Object(vec![("x".into(), InputValue::Int(1))]))
        );
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_query("{ ping").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.message, "Syntax Error: Expected Name, found <EOF>.");

        let err = parse_query("{}").unwrap_err();
        assert_eq!(err.message, "Syntax Error: Expected Name, found \"}\".");
        assert_eq!(err.locations, vec![Location::new(1, 2)]);

        assert!(parse_query("{ ...Frag }").is_err());
        assert!(parse_query("{ a @skip(if: true) }").is_err());
        assert!(parse_query("fragment F on Query { a }").is_err());
        assert!(parse_query("").is_err());
    }

    #[test]
    fn test_nesting_depth_limit() {
        let at_limit = format!(
            "{}{}",
            "{ a ".repeat(MAX_NESTING_DEPTH),
            "}".repeat(MAX_NESTING_DEPTH)
        );
        assert!(parse_query(&at_limit).is_ok());

        let too_deep = format!(
            "{}{}",
            "{ a ".repeat(MAX_NESTING_DEPTH + 1),
            "}".repeat(MAX_NESTING_DEPTH + 1)
        );
        let err = parse_query(&too_deep).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.message.contains("maximum nesting depth"));

        let deep_list = format!(
            "{{ f(x: {}1{}) }}",
            "[".repeat(MAX_NESTING_DEPTH + 1),
            "]".repeat(MAX_NESTING_DEPTH + 1)
        );
        assert!(parse_query(&deep_list).unwrap_err().is_syntax());

        let deep_type = format!(
            "query Q($v: {}Int{}) {{ a }}",
            "[".repeat(MAX_NESTING_DEPTH + 1),
            "]".repeat(MAX_NESTING_DEPTH + 1)
        );
        assert!(parse_query(&deep_type).unwrap_err().is_syntax());
    }

    #[test]
    fn test_variables_rejected_in_defaults() {
        assert!(parse_query("query ($a: Int = $b) { f }").is_err());
    }

    #[test]
    fn test_parse_schema_document() {
        let doc = parse_schema(
            r#"
            """The root"""
            type Query {
              "greeting"
              hello(name: String = "world"): String!
              list: [Int!]
            }
            extend type Query { ping: String }
            scalar Date
            enum Color { RED GREEN }
            schema { query: Query }
            "#,
        )
        .unwrap();

        assert_eq!(doc.definitions.len(), 5);
        match &doc.definitions[0] {
            TypeSystemDefinition::Object(obj) => {
                assert_eq!(obj.name, "Query");
                assert_eq!(obj.description.as_deref(), Some("The root"));
                assert!(!obj.extend);
                assert_eq!(obj.fields[0].ty.to_string(), "String!");
                assert_eq!(
                    obj.fields[0].arguments[0].default_value,
                    Some(InputValue::String("world".into()))
                );
            }
            other => panic!("unexpected definition {:?}", other),
        }
        assert!(matches!(&doc.definitions[1], TypeSystemDefinition::Object(o) if o.extend));
        assert!(matches!(&doc.definitions[3], TypeSystemDefinition::Enum(e) if e.values == ["RED", "GREEN"]));
        assert!(matches!(&doc.definitions[4], TypeSystemDefinition::Schema(s) if s.query.as_deref() == Some("Query")));
    }

    #[test]
    fn test_unsupported_type_system_definitions() {
        assert!(parse_schema("interface Node { id: ID }").is_err());
        assert!(parse_schema("input Filter { a: Int }").is_err());
        assert!(parse_schema("enum Bad { true }").is_err());
    }
}
