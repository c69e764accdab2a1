//! JSON-RPC 2.0 method registry and dispatch.
//!
//! Registration binds a typed request to its method name; dispatch trims the
//! input, splits batches from single messages, extracts the id under the
//! strict rules below, materializes a fresh typed request per call, and runs
//! the matching handler. Handler failures become error envelopes and never
//! propagate out of [`JsonRpcRouter::handle`].
//!
//! Id extraction rules for a single message:
//!
//! - missing key: notification, no response is ever produced for it
//! - `null`: invalid, an id must not be null on a request
//! - string or integer-valued number: accepted and echoed verbatim
//! - anything else: Invalid Request
//!
//! When an error must be reported for a message whose id is missing or
//! unrecoverable, the envelope carries an explicit null id.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{ready, BoxFuture};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::jsonrpc::JsonRpcError;
use crate::session::RequestContext;

use super::{JsonRpcResponse, Request, RequestId};

type RequestHandlerFn = Arc<
    dyn Fn(RequestContext, Value) -> BoxFuture<'static, Result<Value, JsonRpcError>> + Send + Sync,
>;

type NotificationHandlerFn = Arc<
    dyn Fn(RequestContext, Value) -> BoxFuture<'static, Result<(), JsonRpcError>> + Send + Sync,
>;

/// Method registry plus dispatcher.
///
/// Tables are populated during construction and read-only while serving;
/// `handle` takes `&self` so one router instance can serve concurrent calls.
#[derive(Default)]
pub struct JsonRpcRouter {
    request_handlers: HashMap<&'static str, RequestHandlerFn>,
    notification_handlers: HashMap<&'static str, NotificationHandlerFn>,
}

impl JsonRpcRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for requests of type `R`, keyed by `R::METHOD`.
    ///
    /// Each dispatch deserializes a fresh `R` from the raw envelope and
    /// serializes the handler's output into a fresh result value, so two
    /// calls never share result memory.
    pub fn set_request_handler<R, H, Fut, Out>(&mut self, handler: H)
    where
        R: Request,
        H: Fn(RequestContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, JsonRpcError>> + Send + 'static,
        Out: Serialize + Send + 'static,
    {
        let wrapped: RequestHandlerFn = Arc::new(
            move |ctx: RequestContext, raw: Value| -> BoxFuture<'static, Result<Value, JsonRpcError>> {
                let request = match serde_json::from_value::<R>(raw) {
                    Ok(request) => request,
                    Err(e) => return Box::pin(ready(Err(JsonRpcError::parse_error(e.to_string())))),
                };
                let invocation = handler(ctx, request);
                Box::pin(async move {
                    let output = invocation.await?;
                    serde_json::to_value(output).map_err(|e| {
                        tracing::error!(error = %e, method = R::METHOD, "failed to encode handler result");
                        JsonRpcError::server_error(-32000, e.to_string())
                    })
                })
            },
        );
        self.request_handlers.insert(R::METHOD, wrapped);
    }

    /// Registers a handler for notifications of type `R`, keyed by
    /// `R::METHOD`. Notification handlers return nothing; no envelope is
    /// produced for a successfully processed notification.
    pub fn set_notification_handler<R, H, Fut>(&mut self, handler: H)
    where
        R: Request,
        H: Fn(RequestContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let wrapped: NotificationHandlerFn = Arc::new(
            move |ctx: RequestContext, raw: Value| -> BoxFuture<'static, Result<(), JsonRpcError>> {
                let request = match serde_json::from_value::<R>(raw) {
                    Ok(request) => request,
                    Err(e) => return Box::pin(ready(Err(JsonRpcError::parse_error(e.to_string())))),
                };
                let invocation = handler(ctx, request);
                Box::pin(async move {
                    invocation.await;
                    Ok(())
                })
            },
        );
        self.notification_handlers.insert(R::METHOD, wrapped);
    }

    /// Processes one inbound frame: a single message or a batch.
    ///
    /// Returns one slot per request in input order; `None` marks a processed
    /// notification. A single notification therefore yields `[None]` and a
    /// batch of n messages yields n slots whose non-null ids form the same
    /// multiset as the input ids.
    pub async fn handle(
        &self,
        ctx: RequestContext,
        payload: &[u8],
    ) -> Vec<Option<JsonRpcResponse>> {
        let trimmed = trim_leading_whitespace(payload);

        match trimmed.first() {
            Some(b'[') => {
                let items: Vec<Value> = match serde_json::from_slice(trimmed) {
                    Ok(items) => items,
                    Err(e) => return vec![Some(null_id_error(JsonRpcError::parse_error(e.to_string())))],
                };
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    responses.push(self.dispatch_value(ctx.clone(), item).await);
                }
                responses
            }
            Some(b'{') => match serde_json::from_slice::<Value>(trimmed) {
                Ok(value) => vec![self.dispatch_value(ctx, value).await],
                Err(e) => vec![Some(null_id_error(JsonRpcError::parse_error(e.to_string())))],
            },
            _ => {
                // Not an object or array: decode as a generic value purely to
                // tell malformed JSON apart from well-formed non-requests.
                match serde_json::from_slice::<Value>(trimmed) {
                    Err(e) => vec![Some(null_id_error(JsonRpcError::parse_error(e.to_string())))],
                    Ok(Value::Null) => vec![Some(null_id_error(JsonRpcError::invalid_request(
                        "Request is null, but must be an object",
                    )))],
                    Ok(other) => vec![Some(null_id_error(JsonRpcError::invalid_request(format!(
                        "Request is expected to be an object or array, but was {}",
                        json_type_name(&other)
                    ))))],
                }
            }
        }
    }

    /// Dispatches one decoded message.
    async fn dispatch_value(&self, ctx: RequestContext, raw: Value) -> Option<JsonRpcResponse> {
        if raw.is_null() {
            return Some(null_id_error(JsonRpcError::invalid_request(
                "Request is null, but must be an object",
            )));
        }

        let (id, method) = {
            let object = match raw.as_object() {
                Some(object) => object,
                None => {
                    return Some(null_id_error(JsonRpcError::parse_error(format!(
                        "request must be an object, but was {}",
                        json_type_name(&raw)
                    ))))
                }
            };

            let id = match extract_id(object) {
                Ok(id) => id,
                Err(reason) => return Some(null_id_error(JsonRpcError::invalid_request(reason))),
            };

            let method = match object.get("method") {
                None => {
                    return Some(JsonRpcResponse::error(
                        id.or_null(),
                        JsonRpcError::invalid_request("Method is required, but is missing"),
                    ))
                }
                Some(Value::Null) => {
                    return Some(JsonRpcResponse::error(
                        id.or_null(),
                        JsonRpcError::invalid_request("Method is required, but was null"),
                    ))
                }
                Some(Value::String(method)) => method.clone(),
                Some(other) => {
                    return Some(JsonRpcResponse::error(
                        id.or_null(),
                        JsonRpcError::invalid_request(format!(
                            "field method in request must be a string, but got {}",
                            json_type_name(other)
                        )),
                    ))
                }
            };

            (id, method)
        };

        let method = method.as_str();
        let registered = self.request_handlers.contains_key(method)
            || self.notification_handlers.contains_key(method);
        if !registered {
            return Some(JsonRpcResponse::error(
                id.or_null(),
                JsonRpcError::method_not_found(format!(
                    "request for method {method} not found in registry"
                )),
            ));
        }

        if id.is_missing() {
            match self.notification_handlers.get(method) {
                None => Some(null_id_error(JsonRpcError::method_not_found(format!(
                    "handler for method {method} not found to process notification"
                )))),
                Some(handler) => match handler(ctx, raw).await {
                    Ok(()) => None,
                    Err(error) => Some(null_id_error(error)),
                },
            }
        } else {
            match self.request_handlers.get(method) {
                None => Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::method_not_found(format!(
                        "handler for method {method} not found to process request"
                    )),
                )),
                Some(handler) => match handler(ctx, raw).await {
                    Ok(result) => Some(JsonRpcResponse::success(id, result)),
                    Err(error) => Some(JsonRpcResponse::error(id, error)),
                },
            }
        }
    }
}

fn extract_id(object: &Map<String, Value>) -> Result<RequestId, String> {
    match object.get("id") {
        None => Ok(RequestId::Missing),
        Some(Value::Null) => Err("field id in request is required cannot be null".to_string()),
        Some(Value::String(s)) => Ok(RequestId::String(s.clone())),
        Some(Value::Number(n)) => n.as_i64().map(RequestId::Number).ok_or_else(|| {
            "field id in request is expected to be string or integer, but got a non-integer number"
                .to_string()
        }),
        Some(other) => Err(format!(
            "field id in request is expected to be string or integer, but got {}",
            json_type_name(other)
        )),
    }
}

fn null_id_error(error: JsonRpcError) -> JsonRpcResponse {
    JsonRpcResponse::error(RequestId::Null, error)
}

fn trim_leading_whitespace(payload: &[u8]) -> &[u8] {
    let start = payload
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .unwrap_or(payload.len());
    &payload[start..]
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
