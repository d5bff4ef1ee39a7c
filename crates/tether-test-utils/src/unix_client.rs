// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for local-mode servers.
//!
//! Wraps a `reqwest` client pinned to one Unix socket and adds line-by-line
//! Server-Sent Events reading on top of the response body.

use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response};
use serde_json::{Value, json};

/// Host used in request URLs; the socket decides where they go.
const BASE_URL: &str = "http://localhost";

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_slice(&self.body)
    }
}

/// One Server-Sent Event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub id: String,
    pub data: String,
}

/// An open response body read as an event stream.
pub struct EventStream {
    response: Response,
    pending: Vec<u8>,
}

impl EventStream {
    /// Read the rest of the body.
    pub async fn read_to_end(self) -> reqwest::Result<Vec<u8>> {
        let mut body = self.pending;
        body.extend_from_slice(&self.response.bytes().await?);
        Ok(body)
    }

    async fn next_line(&mut self) -> reqwest::Result<Option<String>> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line);
                return Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()));
            }
            match self.response.chunk().await? {
                Some(chunk) => self.pending.extend_from_slice(&chunk),
                None => return Ok(None),
            }
        }
    }

    /// Read the next event, skipping keep-alive comments. `None` at end of stream.
    pub async fn next_event(&mut self) -> reqwest::Result<Option<SseFrame>> {
        let mut frame = SseFrame::default();
        let mut seen = false;
        while let Some(line) = self.next_line().await? {
            if line.is_empty() {
                if seen {
                    return Ok(Some(frame));
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_str(), ""),
            };
            match field {
                "event" => frame.event = value.to_string(),
                "id" => frame.id = value.to_string(),
                "data" => {
                    if !frame.data.is_empty() {
                        frame.data.push('\n');
                    }
                    frame.data.push_str(value);
                }
                _ => {}
            }
            seen = true;
        }
        Ok(None)
    }
}

/// Client bound to one socket path.
#[derive(Debug, Clone)]
pub struct UnixHttpClient {
    client: Client,
}

impl UnixHttpClient {
    pub fn new(path: impl AsRef<Path>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .unix_socket(path.as_ref().to_path_buf())
            .build()?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        method: Method,
        target: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> reqwest::Result<Response> {
        let mut request = self.client.request(method, format!("{BASE_URL}{target}"));
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        request.body(body).send().await
    }

    async fn complete(response: Response) -> reqwest::Result<HttpResponse> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(HttpResponse {
            status,
            content_type,
            body: response.bytes().await?.to_vec(),
        })
    }

    pub async fn get(&self, target: &str) -> reqwest::Result<HttpResponse> {
        Self::complete(self.send(Method::GET, target, None, Vec::new()).await?).await
    }

    /// POST raw bytes with the given content type.
    pub async fn post(
        &self,
        target: &str,
        content_type: &str,
        body: &[u8],
    ) -> reqwest::Result<HttpResponse> {
        let response = self
            .send(Method::POST, target, Some(content_type), body.to_vec())
            .await?;
        Self::complete(response).await
    }

    /// Make a JSON-RPC call and return the raw response.
    pub async fn rpc_raw(&self, method: &str, params: Value) -> reqwest::Result<HttpResponse> {
        let request = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1});
        self.post("/", "application/json", request.to_string().as_bytes())
            .await
    }

    /// Make a JSON-RPC call and return the response envelope.
    ///
    /// A body that is not JSON comes back as a JSON string.
    pub async fn rpc(&self, method: &str, params: Value) -> reqwest::Result<Value> {
        let response = self.rpc_raw(method, params).await?;
        Ok(response
            .json()
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&response.body).into())))
    }

    /// Open an event stream for `topic`.
    pub async fn subscribe(&self, topic: &str) -> reqwest::Result<(u16, EventStream)> {
        let target = format!("/events/{}", topic.trim_start_matches('/'));
        let response = self.send(Method::GET, &target, None, Vec::new()).await?;
        Ok((
            response.status().as_u16(),
            EventStream {
                response,
                pending: Vec::new(),
            },
        ))
    }
}
