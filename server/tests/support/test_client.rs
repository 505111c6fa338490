use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::extract::ConnectInfo;
use axum::Router;
use std::net::SocketAddr;
use serde_json::Value;
use tower::ServiceExt;

/// Drives a router in-process, one request at a time
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    bearer: Option<String>,
    peer: Option<SocketAddr>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            bearer: None,
            peer: None,
        }
    }

    pub fn with_bearer(&self, token: &str) -> Self {
        Self {
            bearer: Some(token.to_string()),
            ..self.clone()
        }
    }

    /// Requests appear to come from `addr`, as if served over a socket.
    pub fn with_peer(&self, addr: &str) -> Result<Self> {
        Ok(Self {
            peer: Some(addr.parse()?),
            ..self.clone()
        })
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let mut request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        if let Some(addr) = self.peer {
            request.extensions_mut().insert(ConnectInfo(addr));
        }

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, None).await
    }
}
