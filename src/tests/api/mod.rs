use std::net::SocketAddr;

use hyper::{Body, Method, StatusCode};
use serde_json::Value;

mod v1;

/// Fire a JSON request at the test server and decode the response.
pub async fn http_request(
    addr: SocketAddr,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = hyper::Request::builder()
        .method(method)
        .uri(format!("http://{addr}{path}"));

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };

    let request = builder.body(body).expect("failed to build request");

    let response = hyper::Client::new()
        .request(request)
        .await
        .expect("request failed");

    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body())
        .await
        .expect("failed to read body");

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}
