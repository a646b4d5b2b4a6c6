use std::fmt;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// One call against the target API. `path` is relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl Request {
    pub fn get(path: impl Into<String>, timeout: Duration) -> Self {
        Request {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            timeout,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>, timeout: Duration) -> Self {
        Request {
            method: HttpMethod::Post,
            path: path.into(),
            body,
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// No response was received.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Sends a single request and waits for the full response.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response, TransportError>;

    /// Base URL shown in progress output and reports.
    fn base_url(&self) -> &str;
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("cqrsbench/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        let builder = builder.timeout(request.timeout);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        // A body that fails to decode still leaves a usable status code.
        let body = response.text().unwrap_or_default();
        Ok(Response { status, body })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
