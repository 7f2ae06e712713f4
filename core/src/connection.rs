//! One-shot HTTP connection to the canteen API.
//!
//! # Design
//! `ApiConnection` owns a single request from construction to body
//! consumption. Construction validates the URL and precomputes headers but
//! performs no I/O; the round trip happens exactly once, inside `connect`,
//! which also verifies the status code the caller declared as success. Any
//! other status makes the connection classify the failure: a parseable
//! error body supplies the message, otherwise a generic one is synthesized.
//!
//! The connection is generic over the error-body schema (`ErrorSchema`)
//! because a few endpoints report failures in a non-standard shape;
//! `ErrorBody` is the default. Request bodies are buffered through
//! `RequestWriter` and ride the single round trip, so the one-call-per-
//! instance invariant holds no matter how the caller interleaves writes.
//!
//! After a failure the connection is terminal: repeated `connect` calls
//! replay the same classified error without touching the network again.

use std::io::{self, Write};
use std::marker::PhantomData;

use base64::engine::general_purpose;
use base64::Engine as _;
use url::Url;

use crate::error::{ApiError, Result};
use crate::types::{Credentials, ErrorBody, ErrorSchema};

/// Remote endpoint the client is built against.
pub const API_ENDPOINT: &str = "https://canteen.austinjadams.com";

/// HTTP verb for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether this verb carries a request body (the create/update family).
    pub fn sends_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

enum State {
    /// No network traffic yet; the request body may still be written.
    Unsent,
    /// Round trip done, status verified, body not yet consumed.
    Open(ureq::http::Response<ureq::Body>),
    /// Success body handed out to a reader.
    Drained,
    /// Terminal failure, replayed on every later call.
    Failed(ApiError),
}

/// A single request to the canteen API and its classified outcome.
pub struct ApiConnection<E: ErrorSchema = ErrorBody> {
    agent: ureq::Agent,
    method: Method,
    path: String,
    url: String,
    expected_status: u16,
    auth: Option<String>,
    body: Vec<u8>,
    state: State,
    schema: PhantomData<E>,
}

impl ApiConnection {
    /// Connection expecting the standard `{"detail": ...}` error body.
    ///
    /// Validates `endpoint` + `path` as a URL; no network I/O happens until
    /// `connect` or `response_reader`.
    pub fn new(
        endpoint: &str,
        method: Method,
        path: &str,
        expected_status: u16,
        credentials: Option<&Credentials>,
    ) -> Result<Self> {
        Self::with_schema(endpoint, method, path, expected_status, credentials)
    }
}

impl<E: ErrorSchema> ApiConnection<E> {
    /// Connection with a caller-chosen error-body schema.
    pub fn with_schema(
        endpoint: &str,
        method: Method,
        path: &str,
        expected_status: u16,
        credentials: Option<&Credentials>,
    ) -> Result<Self> {
        let url = format!("{}{}", endpoint.trim_end_matches('/'), path);
        Url::parse(&url).map_err(|e| ApiError::Config {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();

        Ok(Self {
            agent,
            method,
            path: path.to_string(),
            url,
            expected_status,
            auth: credentials.map(basic_auth),
            body: Vec::new(),
            state: State::Unsent,
            schema: PhantomData,
        })
    }

    /// Performs the round trip once and verifies the status code.
    ///
    /// Idempotent in effect: once the connection is established, later calls
    /// return without touching the network; once it has failed, later calls
    /// return the same classified error.
    pub fn connect(&mut self) -> Result<()> {
        match &self.state {
            State::Open(_) | State::Drained => return Ok(()),
            State::Failed(err) => return Err(err.clone()),
            State::Unsent => {}
        }

        tracing::debug!("{} {}", self.method.as_str(), self.path);
        let response = match self.transmit() {
            Ok(response) => response,
            Err(e) => return Err(self.fail(ApiError::Network {
                context: format!(
                    "could not make {} request to {}",
                    self.method.as_str(),
                    self.path
                ),
                reason: e.to_string(),
            })),
        };

        let status = response.status().as_u16();
        if status != self.expected_status {
            tracing::warn!(
                "{} returned {status}, expected {}",
                self.path,
                self.expected_status
            );
            let raw = response.into_body().read_to_string().unwrap_or_default();
            return Err(self.fail(Self::classify_unexpected(status, &raw)));
        }

        self.state = State::Open(response);
        Ok(())
    }

    /// Readable stream over the success body.
    ///
    /// Calls `connect` first, so this is the usual entry point for requests
    /// whose response payload matters.
    pub fn response_reader(&mut self) -> Result<impl io::Read> {
        self.connect()?;
        match std::mem::replace(&mut self.state, State::Drained) {
            State::Open(response) => Ok(response.into_body().into_reader()),
            _ => Err(ApiError::Network {
                context: format!("reading response from {}", self.path),
                reason: "response body already consumed".to_string(),
            }),
        }
    }

    /// Writable stream for the request body.
    ///
    /// Only valid for verbs that send a body, and only before the round
    /// trip. Whatever is written rides the single `connect` call.
    pub fn request_writer(&mut self) -> Result<RequestWriter<'_>> {
        if !self.method.sends_body() {
            return Err(ApiError::Network {
                context: format!(
                    "opening request body for {} {}",
                    self.method.as_str(),
                    self.path
                ),
                reason: format!("{} requests do not send a body", self.method.as_str()),
            });
        }
        if !matches!(self.state, State::Unsent) {
            return Err(ApiError::Network {
                context: format!(
                    "opening request body for {} {}",
                    self.method.as_str(),
                    self.path
                ),
                reason: "request already sent".to_string(),
            });
        }
        Ok(RequestWriter {
            buf: &mut self.body,
        })
    }

    /// Records a terminal failure and hands back a copy to return.
    fn fail(&mut self, err: ApiError) -> ApiError {
        self.state = State::Failed(err.clone());
        err
    }

    /// Executes the request with the prepared headers and buffered body.
    fn transmit(&self) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = self.url.as_str();
        match self.method {
            Method::Get => {
                let mut req = self.agent.get(url).header("Accept", "application/json");
                if let Some(auth) = &self.auth {
                    req = req.header("Authorization", auth.as_str());
                }
                req.call()
            }
            Method::Delete => {
                let mut req = self.agent.delete(url).header("Accept", "application/json");
                if let Some(auth) = &self.auth {
                    req = req.header("Authorization", auth.as_str());
                }
                req.call()
            }
            Method::Post => {
                let mut req = self
                    .agent
                    .post(url)
                    .header("Accept", "application/json")
                    .content_type("application/json; charset=UTF-8");
                if let Some(auth) = &self.auth {
                    req = req.header("Authorization", auth.as_str());
                }
                req.send(self.body.as_slice())
            }
            Method::Put => {
                let mut req = self
                    .agent
                    .put(url)
                    .header("Accept", "application/json")
                    .content_type("application/json; charset=UTF-8");
                if let Some(auth) = &self.auth {
                    req = req.header("Authorization", auth.as_str());
                }
                req.send(self.body.as_slice())
            }
        }
    }

    /// Turns an unexpected status plus raw error body into an `ApiError`.
    ///
    /// A body that is absent, unparseable under `E`, or parseable but
    /// carrying no message all collapse to the generic form.
    fn classify_unexpected(status: u16, raw: &str) -> ApiError {
        let detail = serde_json::from_str::<E>(raw).ok().and_then(E::detail);
        match detail {
            Some(detail) => ApiError::Api(detail),
            None => ApiError::Api(format!(
                "unexpected response code {status} but no error sent"
            )),
        }
    }
}

/// Writer over the buffered request body. Dropping it without `close`
/// keeps the bytes written so far.
#[derive(Debug)]
pub struct RequestWriter<'c> {
    buf: &'c mut Vec<u8>,
}

impl RequestWriter<'_> {
    /// Flush and close the writer. Failures surface instead of being
    /// swallowed on drop.
    pub fn close(mut self) -> Result<()> {
        self.flush().map_err(|e| ApiError::Network {
            context: "flushing request body".to_string(),
            reason: e.to_string(),
        })
    }
}

impl Write for RequestWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `Authorization` header value for basic auth.
///
/// Encodes "username:password" verbatim. Account validation forbids `:` in
/// usernames, which is what keeps this unambiguous; do not relax one
/// without revisiting the other.
fn basic_auth(credentials: &Credentials) -> String {
    let userpass = format!("{}:{}", credentials.username, credentials.password);
    format!("Basic {}", general_purpose::STANDARD.encode(userpass))
}
