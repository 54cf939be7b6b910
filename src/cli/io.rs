//! JSON I/O handling for CLI
//!
//! - Input: one JSON request object on stdin
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{CliError, CliResult};

/// A query request as read from stdin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,

    #[serde(default)]
    pub variables: Option<Map<String, Value>>,

    #[serde(default)]
    pub operation_name: Option<String>,

    /// Request context, overlaid on the configured base context
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

/// Parse a request from JSON text
pub fn parse_request(input: &str) -> CliResult<QueryRequest> {
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(input)?)
}

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<QueryRequest> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Write a JSON value to stdout
pub fn write_response(data: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, data)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error object to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_response(&serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let request = parse_request(
            r#"{"query": "query Q($id: ID) { user(id: $id) }", "variables": {"id": 1}, "operationName": "Q"}"#,
        )
        .unwrap();
        assert_eq!(request.operation_name.as_deref(), Some("Q"));
        assert_eq!(request.variables.unwrap().get("id"), Some(&json!(1)));
        assert!(request.context.is_none());

        let request = parse_request(r#"{"query": "{ a }", "variables": null}"#).unwrap();
        assert!(request.variables.is_none());
    }

    #[test]
    fn test_parse_request_errors() {
        assert_eq!(parse_request("  ").unwrap_err().message(), "Empty input");
        assert!(parse_request(r#"{"variables": {}}"#).is_err());
    }
}
