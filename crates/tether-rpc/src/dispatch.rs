// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP endpoint that routes JSON-RPC calls to registered services.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::Value;
use tracing::{debug, warn};

use tether_core::{CallError, Service};

use crate::codec::{RpcResponse, decode_request};
use crate::handshake::{HANDSHAKE_SERVICE, Handshake, InterfaceMap};
use crate::registry::ServiceRegistry;

/// Routes calls to the handshake or to a registered service.
#[derive(Debug)]
pub struct Dispatcher {
    handshake: Handshake,
    services: ServiceRegistry,
}

impl Dispatcher {
    pub fn new(services: ServiceRegistry, interfaces: Arc<InterfaceMap>) -> Self {
        Self {
            handshake: Handshake::new(interfaces),
            services,
        }
    }

    /// Interfaces reported by the handshake.
    pub fn interfaces(&self) -> &InterfaceMap {
        self.handshake.interfaces()
    }

    /// Every callable `Service.Method`, handshake included.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handshake
            .methods()
            .into_iter()
            .map(|m| format!("{HANDSHAKE_SERVICE}.{m}"))
            .collect();
        names.extend(self.services.method_names());
        names
    }

    /// Invoke `method` with `params`.
    pub async fn dispatch(&self, method: &str, params: Value) -> Result<Value, CallError> {
        match method.split_once('.') {
            Some((HANDSHAKE_SERVICE, local)) => self.handshake.call(local, params).await,
            _ => self.services.call(method, params).await,
        }
    }
}

/// Router serving `POST /`.
pub fn rpc_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .with_state(dispatcher)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Handle one JSON-RPC request body.
///
/// Protocol-level errors are reported inside the envelope with status 200.
pub async fn handle_rpc(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_json(&headers) {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "content type must be application/json",
        )
            .into_response();
    }

    let request = match decode_request(&body) {
        Ok(request) => request,
        Err(response) => {
            debug!(error = ?response.error, "rejected malformed rpc request");
            return Json(response).into_response();
        }
    };

    let response = match dispatcher.dispatch(&request.method, request.params).await {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(err) => {
            match &err {
                CallError::MethodNotFound(_) => {
                    debug!(method = %request.method, "rpc method not found");
                }
                _ => warn!(method = %request.method, error = %err, "rpc call failed"),
            }
            RpcResponse::failure(request.id, err)
        }
    };
    Json(response).into_response()
}
