//! Query results
//!
//! A query or mutation yields one [`Response`]; a subscription yields a
//! [`ResponseStream`] of responses, one per event.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;
use crate::realtime::SubscriptionContext;

/// HTTP-style status for a response without errors
pub const STATUS_OK: u16 = 200;

/// HTTP-style status for a response carrying errors
pub const STATUS_CLIENT_ERROR: u16 = 400;

/// `{ data, errors }` result of one execution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,
}

impl Response {
    /// Successful response
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Response without data
    pub fn from_errors(errors: Vec<QueryError>) -> Self {
        Self { data: None, errors }
    }

    pub fn from_error(error: QueryError) -> Self {
        Self::from_errors(vec![error])
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Status a transport should reply with: any error is a client error
    pub fn status_code(&self) -> u16 {
        if self.errors.is_empty() {
            STATUS_OK
        } else {
            STATUS_CLIENT_ERROR
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Ordered stream of subscription responses.
///
/// Ends when the subscription is closed or the pub/sub core shuts down.
/// Dropping the stream closes the subscription.
pub struct ResponseStream {
    inner: BoxStream<'static, Response>,
    subscription: Arc<SubscriptionContext>,
}

impl ResponseStream {
    pub(crate) fn new(inner: BoxStream<'static, Response>, subscription: Arc<SubscriptionContext>) -> Self {
        Self {
            inner,
            subscription,
        }
    }

    /// The subscription context feeding this stream
    pub fn subscription(&self) -> &Arc<SubscriptionContext> {
        &self.subscription
    }

    /// Close the underlying subscription; the stream then ends
    pub fn close(&self) {
        self.subscription.close();
    }
}

impl fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("subscription", &self.subscription.id())
            .field("closed", &self.subscription.is_closed())
            .finish()
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.subscription.close();
    }
}

impl Stream for ResponseStream {
    type Item = Response;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Outcome of running a query
#[derive(Debug)]
pub enum QueryOutcome {
    /// Query, mutation, or a subscription that failed before streaming
    Single(Response),
    /// Live subscription
    Stream(ResponseStream),
}

impl QueryOutcome {
    pub fn is_stream(&self) -> bool {
        matches!(self, QueryOutcome::Stream(_))
    }

    /// The single response, if this is not a stream
    pub fn into_response(self) -> Option<Response> {
        match self {
            QueryOutcome::Single(response) => Some(response),
            QueryOutcome::Stream(_) => None,
        }
    }

    /// The response stream, if this is a live subscription
    pub fn into_stream(self) -> Option<ResponseStream> {
        match self {
            QueryOutcome::Stream(stream) => Some(stream),
            QueryOutcome::Single(_) => None,
        }
    }
}

impl From<Response> for QueryOutcome {
    fn from(response: Response) -> Self {
        QueryOutcome::Single(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(Response::from_data(json!({"ping": "pong"})).status_code(), 200);
        assert_eq!(Response::from_error(QueryError::validation("bad")).status_code(), 400);

        let partial = Response {
            data: Some(json!({"a": null})),
            errors: vec![QueryError::execution("boom")],
        };
        assert_eq!(partial.status_code(), 400);
    }

    #[test]
    fn test_serialization_shape() {
        assert_eq!(
            Response::from_data(json!({"ping": "pong"})).to_json(),
            json!({"data": {"ping": "pong"}})
        );
        assert_eq!(
            Response::from_error(QueryError::validation("bad")).to_json(),
            json!({"errors": [{"message": "bad"}]})
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = QueryOutcome::from(Response::default());
        assert!(!outcome.is_stream());
        assert!(outcome.into_response().unwrap().is_ok());
    }
}
