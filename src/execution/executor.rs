//! Operation execution
//!
//! Executes a validated document:
//! - Queries resolve their root fields concurrently
//! - Mutations resolve their root fields serially, in document order
//! - Subscriptions return a stream; each event payload becomes the root
//!   value the selection set runs against
//!
//! Root fields are bound to resolvers; every field below the root is read
//! from its parent value by name. A null in a non-null position propagates
//! to the nearest nullable parent, or nulls `data` entirely.

use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::StreamExt;
use serde_json::{Map, Value};

use crate::error::{PathSegment, QueryError};
use crate::language::{Document, Field, OperationDefinition, OperationKind, TypeRef};
use crate::realtime::{PubSub, SubscriptionContext};
use crate::schema::{serialize_leaf, FieldDef, NamedType, ObjectType, Schema};
use crate::validation::TYPENAME_FIELD;

use super::context::RequestContext;
use super::resolvers::{Resolver, ResolverParams, Resolvers};
use super::response::{QueryOutcome, Response, ResponseStream};
use super::variables::{coerce_arguments, coerce_variables};

/// Everything needed to execute one validated document
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub schema: Arc<Schema>,
    pub document: Arc<Document>,
    pub resolvers: Arc<Resolvers>,
    pub context: RequestContext,
    pub variables: Map<String, Value>,
    pub operation_name: Option<String>,
}

impl ExecutionRequest {
    /// Request with an empty context and no variables
    pub fn new(
        schema: Arc<Schema>,
        document: Arc<Document>,
        resolvers: Arc<Resolvers>,
        pubsub: Arc<PubSub>,
    ) -> Self {
        Self {
            schema,
            document,
            resolvers,
            context: RequestContext::new(Map::new(), pubsub),
            variables: Map::new(),
            operation_name: None,
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, operation_name: Option<String>) -> Self {
        self.operation_name = operation_name;
        self
    }
}

/// Execute a validated document
pub async fn execute(request: ExecutionRequest) -> QueryOutcome {
    let ExecutionRequest {
        schema,
        document,
        resolvers,
        context,
        variables,
        operation_name,
    } = request;

    let index = match document.operation_index(operation_name.as_deref()) {
        Ok(index) => index,
        Err(message) => return Response::from_error(QueryError::request(message)).into(),
    };

    let (kind, variables) = {
        let definition = &document.operations[index];
        match coerce_variables(&schema, definition, &variables) {
            Ok(coerced) => (definition.kind, coerced),
            Err(errors) => return Response::from_errors(errors).into(),
        }
    };

    let operation = Operation {
        schema,
        document,
        index,
        resolvers,
        variables,
        context,
    };

    match kind {
        OperationKind::Query => operation.execute_query().await.into(),
        OperationKind::Mutation => operation.execute_mutation().await.into(),
        OperationKind::Subscription => operation.subscribe().await,
    }
}

// =============================================================================
// Operation
// =============================================================================

/// A selected operation with coerced variables
struct Operation {
    schema: Arc<Schema>,
    document: Arc<Document>,
    index: usize,
    resolvers: Arc<Resolvers>,
    variables: Map<String, Value>,
    context: RequestContext,
}

/// A completion failure.
///
/// `Error` has not been reported yet; `Bubble` was reported below and only
/// needs the nearest nullable position to absorb it.
enum Failure {
    Error(String),
    Bubble,
}

type Completed = Result<Value, Failure>;

/// Fields sharing a response name, in document order
type FieldGroup<'a> = (&'a str, Vec<&'a Field>);

fn collect_fields<'a>(selection: impl IntoIterator<Item = &'a Field>) -> Vec<FieldGroup<'a>> {
    let mut groups: Vec<FieldGroup<'a>> = Vec::new();
    for field in selection {
        let name = field.response_name();
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, fields)) => fields.push(field),
            None => groups.push((name, vec![field])),
        }
    }
    groups
}

impl Operation {
    fn definition(&self) -> &OperationDefinition {
        &self.document.operations[self.index]
    }

    fn root_type(&self) -> Result<&ObjectType, QueryError> {
        let kind = self.definition().kind;
        self.schema.root_type(kind).ok_or_else(|| {
            QueryError::request(format!("Schema is not configured to execute {} operation.", kind))
                .at(self.definition().location)
        })
    }

    async fn execute_query(&self) -> Response {
        let root = match self.root_type() {
            Ok(root) => root,
            Err(err) => return Response::from_error(err),
        };
        let groups = collect_fields(&self.definition().selection_set);
        let results = join_all(
            groups
                .iter()
                .map(|(name, fields)| self.execute_root_field(root, name, fields)),
        )
        .await;
        assemble(&groups, results)
    }

    async fn execute_mutation(&self) -> Response {
        let root = match self.root_type() {
            Ok(root) => root,
            Err(err) => return Response::from_error(err),
        };
        let groups = collect_fields(&self.definition().selection_set);
        let mut results = Vec::with_capacity(groups.len());
        for (name, fields) in &groups {
            let result = self.execute_root_field(root, name, fields).await;
            let bubbled = result.0.is_err();
            results.push(result);
            if bubbled {
                break;
            }
        }
        assemble(&groups, results)
    }

    /// Resolve and complete one root field; returns its value and the errors
    /// raised at or below it
    async fn execute_root_field(
        &self,
        root: &ObjectType,
        response_name: &str,
        fields: &[&Field],
    ) -> (Completed, Vec<QueryError>) {
        let mut errors = Vec::new();
        let field = fields[0];
        if field.name == TYPENAME_FIELD {
            return (Ok(Value::String(root.name.clone())), errors);
        }
        let Some(definition) = root.get_field(&field.name) else {
            return (Ok(Value::Null), errors);
        };

        let mut path = vec![PathSegment::from(response_name)];
        let result = match self.resolve(definition, field).await {
            Ok(value) => self.complete_value(&definition.ty, &root.name, fields, value, &mut path, &mut errors),
            Err(message) => Err(Failure::Error(message)),
        };
        let settled = settle(&definition.ty, result, field, &path, &mut errors);
        (settled, errors)
    }

    async fn resolve(&self, definition: &FieldDef, field: &Field) -> Result<Value, String> {
        let args = coerce_arguments(&self.schema, definition, field, &self.variables)?;
        match self.resolvers.get(&field.name) {
            Some(Resolver::Field(resolve)) => {
                let params = ResolverParams {
                    field_name: field.name.clone(),
                    args,
                    context: self.context.clone(),
                };
                resolve(params).await.map_err(|err| err.message().to_string())
            }
            Some(Resolver::Value(value)) => Ok(value.clone()),
            Some(Resolver::Subscription(_)) | None => Ok(Value::Null),
        }
    }

    /// Complete `value` as `ty` for the field group `fields` of `parent`
    fn complete_value(
        &self,
        ty: &TypeRef,
        parent: &str,
        fields: &[&Field],
        value: Value,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<QueryError>,
    ) -> Completed {
        let field = fields[0];
        match ty {
            TypeRef::NonNull(inner) => {
                match self.complete_value(inner, parent, fields, value, path, errors)? {
                    Value::Null => Err(Failure::Error(format!(
                        "Cannot return null for non-nullable field {}.{}.",
                        parent, field.name
                    ))),
                    completed => Ok(completed),
                }
            }
            _ if value.is_null() => Ok(Value::Null),
            TypeRef::List(inner) => {
                let Value::Array(items) = value else {
                    return Err(Failure::Error(format!(
                        "Expected Iterable, but did not find one for field \"{}.{}\".",
                        parent, field.name
                    )));
                };
                let mut completed = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    let result = self.complete_value(inner, parent, fields, item, path, errors);
                    let settled = settle(inner, result, field, path, errors);
                    path.pop();
                    completed.push(settled?);
                }
                Ok(Value::Array(completed))
            }
            TypeRef::Named(name) => match self.schema.get_type(name) {
                Some(NamedType::Object(object)) => {
                    if !value.is_object() {
                        return Err(Failure::Error(format!(
                            "Expected value of type \"{}\" but got: {}.",
                            object.name, value
                        )));
                    }
                    let selection = fields.iter().copied().flat_map(|field| field.selection_set.iter());
                    self.execute_object(object, selection, &value, path, errors)
                }
                Some(leaf) => serialize_leaf(leaf, &value).map_err(Failure::Error),
                None => Err(Failure::Error(format!("Unknown type \"{}\".", name))),
            },
        }
    }

    /// Execute a selection set against `source`, reading each field by name
    fn execute_object<'a>(
        &self,
        object: &ObjectType,
        selection: impl IntoIterator<Item = &'a Field>,
        source: &Value,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<QueryError>,
    ) -> Completed {
        let mut data = Map::new();
        for (name, fields) in collect_fields(selection) {
            let field = fields[0];
            let completed = if field.name == TYPENAME_FIELD {
                Ok(Value::String(object.name.clone()))
            } else if let Some(definition) = object.get_field(&field.name) {
                path.push(PathSegment::from(name));
                let value = source.get(&field.name).cloned().unwrap_or(Value::Null);
                let result = self.complete_value(&definition.ty, &object.name, &fields, value, path, errors);
                let settled = settle(&definition.ty, result, field, path, errors);
                path.pop();
                settled
            } else {
                Ok(Value::Null)
            };
            data.insert(name.to_string(), completed?);
        }
        Ok(Value::Object(data))
    }

    async fn subscribe(self) -> QueryOutcome {
        let root = match self.root_type() {
            Ok(root) => root,
            Err(err) => return Response::from_error(err).into(),
        };
        let groups = collect_fields(&self.definition().selection_set);
        let Some((response_name, fields)) = groups.first() else {
            return Response::from_error(QueryError::request("Subscription must select a field.")).into();
        };
        let field = fields[0];
        let fail = |message: String| {
            Response::from_error(
                QueryError::execution(message)
                    .at(field.location)
                    .with_path(vec![PathSegment::from(*response_name)]),
            )
        };

        let Some(definition) = root.get_field(&field.name) else {
            return fail(format!("The subscription field \"{}\" is not defined.", field.name)).into();
        };
        let args = match coerce_arguments(&self.schema, definition, field, &self.variables) {
            Ok(args) => args,
            Err(message) => return fail(message).into(),
        };
        let subscribe = match self.resolvers.get(&field.name) {
            Some(Resolver::Subscription(subscribe)) => Arc::clone(subscribe),
            _ => {
                return fail(format!(
                    "Subscription field \"{}\" has no subscription resolver.",
                    field.name
                ))
                .into()
            }
        };

        let subscription = Arc::new(SubscriptionContext::new(Arc::clone(self.context.pubsub())));
        let params = ResolverParams {
            field_name: field.name.clone(),
            args,
            context: self.context.with_subscription(Arc::clone(&subscription)),
        };
        let events = match subscribe(params, Arc::clone(&subscription)).await {
            Ok(events) => events,
            Err(err) => {
                subscription.close();
                return fail(err.message().to_string()).into();
            }
        };

        let operation = Arc::new(self);
        let responses = events
            .map(move |payload| operation.execute_event(&payload))
            .boxed();
        QueryOutcome::Stream(ResponseStream::new(responses, subscription))
    }

    /// Run the selection set with an event payload as the root value
    fn execute_event(&self, payload: &Value) -> Response {
        let root = match self.root_type() {
            Ok(root) => root,
            Err(err) => return Response::from_error(err),
        };
        let mut errors = Vec::new();
        let mut path = Vec::new();
        let data = self
            .execute_object(root, &self.definition().selection_set, payload, &mut path, &mut errors)
            .unwrap_or(Value::Null);
        Response {
            data: Some(data),
            errors,
        }
    }
}

/// Record an unreported failure, then null the position if it is nullable
fn settle(
    ty: &TypeRef,
    result: Completed,
    field: &Field,
    path: &[PathSegment],
    errors: &mut Vec<QueryError>,
) -> Completed {
    match result {
        Ok(value) => Ok(value),
        Err(failure) => {
            if let Failure::Error(message) = failure {
                errors.push(
                    QueryError::execution(message)
                        .at(field.location)
                        .with_path(path.to_vec()),
                );
            }
            if ty.is_non_null() {
                Err(Failure::Bubble)
            } else {
                Ok(Value::Null)
            }
        }
    }
}

/// Build the response for a set of root fields
fn assemble(groups: &[FieldGroup<'_>], results: Vec<(Completed, Vec<QueryError>)>) -> Response {
    let mut data = Map::new();
    let mut errors = Vec::new();
    let mut bubbled = false;
    for ((name, _), (result, field_errors)) in groups.iter().zip(results) {
        errors.extend(field_errors);
        match result {
            Ok(value) => {
                data.insert(name.to_string(), value);
            }
            Err(_) => bubbled = true,
        }
    }
    Response {
        data: Some(if bubbled { Value::Null } else { Value::Object(data) }),
        errors,
    }
}
