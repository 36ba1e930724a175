//! HTTP client abstraction.
//!
//! The engine never talks to a socket directly; it goes through the
//! [`HttpClient`] trait so different implementations can be bound per
//! execution environment (a real client, a test double, a loopback into
//! an in-process reference server).

use crate::config::Headers;
use cometsync_protocol::Method;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A raw HTTP response before envelope shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Status text (`"OK"`, `"Not Found"`, ...).
    pub status_text: String,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// True for 2xx responses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A `200 OK` response with the given body.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".into(),
            body: body.into(),
        }
    }

    /// A failure response with no body.
    pub fn failure(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: String::new(),
        }
    }
}

/// HTTP client abstraction.
///
/// `Err` carries the transport exception text; the transport normalizes
/// it before it reaches callers.
pub trait HttpClient: Send + Sync {
    /// Performs a request.
    fn request(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<HttpResponse, String>;
}

/// One request observed by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Verb.
    pub method: Method,
    /// Full URL including any query string.
    pub url: String,
    /// Headers after the before-send hook ran.
    pub headers: Headers,
    /// Serialized body, when the verb carries one.
    pub body: Option<String>,
}

/// A scripted client for tests: pops canned responses in order and
/// records every request it sees. With no scripted response left it
/// answers `200 {}`.
#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    /// Creates an unscripted client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a transport exception.
    pub fn push_exception(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpClient for MockHttpClient {
    fn request(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<HttpResponse, String> {
        self.requests.lock().push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.map(str::to_string),
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::json("{}")))
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_client {
    use super::{HttpClient, HttpResponse};
    use crate::config::Headers;
    use cometsync_protocol::Method;

    /// [`HttpClient`] backed by a blocking reqwest client.
    #[derive(Debug, Default)]
    pub struct ReqwestClient {
        client: reqwest::blocking::Client,
    }

    impl ReqwestClient {
        /// Creates a client with reqwest defaults.
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl HttpClient for ReqwestClient {
        fn request(
            &self,
            method: Method,
            url: &str,
            headers: &Headers,
            body: Option<&str>,
        ) -> Result<HttpResponse, String> {
            let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
                .map_err(|e| e.to_string())?;
            let mut builder = self.client.request(method, url);
            for (name, value) in headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = body {
                builder = builder.body(body.to_string());
            }
            let response = builder.send().map_err(|e| e.to_string())?;
            let status = response.status().as_u16();
            let status_text = response
                .status()
                .canonical_reason()
                .unwrap_or("")
                .to_string();
            let body = response.text().map_err(|e| e.to_string())?;
            Ok(HttpResponse {
                status,
                status_text,
                body,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;
