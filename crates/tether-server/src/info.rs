// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Introspection routes under `/info`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use tether_core::{FunctionSpec, InterfaceSpec};

/// Document served at `GET /info/api.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDescription {
    /// Service name of the primary plugin.
    pub name: String,
    /// Implemented interfaces, sorted.
    pub implements: Vec<InterfaceSpec>,
    /// Per-interface detail in registration order.
    pub interfaces: Vec<InterfaceEntry>,
    /// Handshake methods every server answers.
    pub handshake: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceEntry {
    pub interface: InterfaceSpec,
    pub types: Vec<String>,
    pub methods: Vec<String>,
}

#[derive(Clone)]
pub(crate) struct InfoState {
    pub(crate) api: Arc<ApiDescription>,
    pub(crate) functions: Arc<[FunctionSpec]>,
}

pub(crate) fn info_router(state: InfoState) -> Router {
    Router::new()
        .route("/info/api.json", get(api_json))
        .route("/info/functions.json", get(functions_json))
        .with_state(state)
}

async fn api_json(State(state): State<InfoState>) -> Json<ApiDescription> {
    Json(state.api.as_ref().clone())
}

async fn functions_json(State(state): State<InfoState>) -> Json<Vec<FunctionSpec>> {
    Json(state.functions.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn state(functions: Vec<FunctionSpec>) -> InfoState {
        InfoState {
            api: Arc::new(ApiDescription {
                name: "A".into(),
                implements: vec![InterfaceSpec::new("X", "1.0")],
                interfaces: vec![InterfaceEntry {
                    interface: InterfaceSpec::new("X", "1.0"),
                    types: vec!["a".into()],
                    methods: vec!["A.Echo".into()],
                }],
                handshake: vec!["Handshake.Implements".into()],
            }),
            functions: functions.into(),
        }
    }

    async fn get_json(router: Router, uri: &str) -> Value {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn serves_api_description() {
        let body = get_json(info_router(state(vec![])), "/info/api.json").await;
        assert_eq!(body["name"], json!("A"));
        assert_eq!(body["implements"], json!(["X/1.0"]));
        assert_eq!(body["interfaces"][0]["interface"], json!("X/1.0"));
        assert_eq!(body["interfaces"][0]["methods"], json!(["A.Echo"]));
    }

    #[tokio::test]
    async fn functions_default_to_empty_list() {
        let body = get_json(info_router(state(vec![])), "/info/functions.json").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn serves_exported_functions() {
        let functions = vec![FunctionSpec {
            name: "upper".into(),
            description: "uppercases".into(),
            usage: "{{ upper .x }}".into(),
        }];
        let body = get_json(info_router(state(functions)), "/info/functions.json").await;
        assert_eq!(body[0]["name"], json!("upper"));
    }
}
