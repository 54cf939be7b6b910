//! Variable and argument coercion

use serde_json::{Map, Value};

use crate::error::QueryError;
use crate::language::{Field, InputValue, OperationDefinition};
use crate::schema::{coerce_input, FieldDef, Schema};

/// Coerce request variables against the operation's variable definitions.
///
/// Variables that are neither provided nor defaulted are left out of the
/// result. All problems are reported, not only the first.
pub fn coerce_variables(
    schema: &Schema,
    operation: &OperationDefinition,
    provided: &Map<String, Value>,
) -> Result<Map<String, Value>, Vec<QueryError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for definition in &operation.variables {
        let name = &definition.name;
        let report = |message: String| QueryError::request(message).at(definition.location);

        let value = match provided.get(name) {
            Some(value) => value,
            None => {
                match &definition.default_value {
                    Some(default) => match coerce_input(schema, &definition.ty, &default.to_const_json()) {
                        Ok(value) => {
                            coerced.insert(name.clone(), value);
                        }
                        Err(reason) => errors.push(report(format!(
                            "Variable \"${}\" has invalid default value: {}",
                            name, reason
                        ))),
                    },
                    None if definition.ty.is_non_null() => errors.push(report(format!(
                        "Variable \"${}\" of required type \"{}\" was not provided.",
                        name, definition.ty
                    ))),
                    None => {}
                }
                continue;
            }
        };

        if value.is_null() && definition.ty.is_non_null() {
            errors.push(report(format!(
                "Variable \"${}\" of non-null type \"{}\" must not be null.",
                name, definition.ty
            )));
            continue;
        }

        match coerce_input(schema, &definition.ty, value) {
            Ok(value) => {
                coerced.insert(name.clone(), value);
            }
            Err(reason) => errors.push(report(format!(
                "Variable \"${}\" got invalid value {}; {}",
                name, value, reason
            ))),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerce a field's argument literals, substituting coerced variables and
/// applying schema defaults.
pub fn coerce_arguments(
    schema: &Schema,
    definition: &FieldDef,
    field: &Field,
    variables: &Map<String, Value>,
) -> Result<Map<String, Value>, String> {
    let mut args = Map::new();

    for arg in definition.arguments.values() {
        let supplied = match field.argument(&arg.name) {
            Some(InputValue::Variable(variable)) if !variables.contains_key(variable) => {
                if arg.ty.is_non_null() && arg.default_value.is_none() {
                    return Err(format!(
                        "Argument \"{}\" of required type \"{}\" was provided the variable \"${}\" which was not provided a runtime value.",
                        arg.name, arg.ty, variable
                    ));
                }
                None
            }
            Some(literal) => Some(literal.to_json(variables)),
            None => None,
        };

        let Some(value) = supplied else {
            match &arg.default_value {
                Some(default) => {
                    args.insert(arg.name.clone(), default.clone());
                }
                None if arg.ty.is_non_null() => {
                    return Err(format!(
                        "Argument \"{}\" of required type \"{}\" was not provided.",
                        arg.name, arg.ty
                    ));
                }
                None => {}
            }
            continue;
        };

        if value.is_null() && arg.ty.is_non_null() {
            return Err(format!(
                "Argument \"{}\" of non-null type \"{}\" must not be null.",
                arg.name, arg.ty
            ));
        }
        let value = coerce_input(schema, &arg.ty, &value)
            .map_err(|reason| format!("Argument \"{}\" has invalid value {}: {}", arg.name, value, reason))?;
        args.insert(arg.name.clone(), value);
    }

    Ok(args)
}
