//! Issue a prepared request (or decline to) and fold the outcome into the
//! result IR. The HTTP client sits behind [`HttpFetch`] so tests can
//! supply a canned transport; each execute issues at most one request and
//! applies no implicit timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::error::FetchError;
use crate::model::CommandAction;
use crate::request::{build_request, BuildContext, BuildFailure, Globals, Invocation};
use crate::result::{CommandResult, Outcome, PreparedRequest, ResponseSummary, Timing};

/// Cooperative cancellation handle. Checked before the request is sent;
/// a fetcher may also poll it mid-flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a transport hands back, untouched.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Transport seam.
pub trait HttpFetch {
    fn fetch(
        &self,
        request: &PreparedRequest,
        cancel: &CancelToken,
    ) -> Result<FetchResponse, FetchError>;
}

/// Default transport over a blocking reqwest client.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        ReqwestFetcher {
            client: reqwest::blocking::Client::builder()
                .user_agent(concat!("oac/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("default client builds"),
        }
    }
}

impl HttpFetch for ReqwestFetcher {
    fn fetch(
        &self,
        request: &PreparedRequest,
        cancel: &CancelToken,
    ) -> Result<FetchResponse, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let method: reqwest::Method = request
            .method
            .parse()
            .map_err(|_| FetchError::Transport(format!("bad method '{}'", request.method)))?;

        let mut req = self.client.request(method, &request.url);
        for (name, value) in request.headers.iter() {
            req = req.header(name, value);
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let response = req.send().map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

/// Runs invocations against one transport.
pub struct Executor<'a> {
    pub fetcher: &'a dyn HttpFetch,
    pub cancel: CancelToken,
}

impl<'a> Executor<'a> {
    pub fn new(fetcher: &'a dyn HttpFetch) -> Self {
        Executor {
            fetcher,
            cancel: CancelToken::new(),
        }
    }

    /// Build the request and stop: no I/O.
    pub fn prepare(
        &self,
        ctx: &BuildContext<'_>,
        action: &CommandAction,
        invocation: &Invocation,
        globals: &Globals,
    ) -> CommandResult {
        let outcome = match build_request(ctx, action, invocation, globals) {
            Ok(request) => Outcome::Prepared { request },
            Err(failure) => failure_outcome(failure),
        };
        CommandResult::new(outcome).with_context(&action.resource, &action.action)
    }

    /// Build and execute, or short-circuit into the curl rendering.
    pub fn execute(
        &self,
        ctx: &BuildContext<'_>,
        action: &CommandAction,
        invocation: &Invocation,
        globals: &Globals,
    ) -> CommandResult {
        let request = match build_request(ctx, action, invocation, globals) {
            Ok(request) => request,
            Err(failure) => {
                return CommandResult::new(failure_outcome(failure))
                    .with_context(&action.resource, &action.action);
            }
        };

        if invocation.curl {
            let outcome = Outcome::Curl {
                curl: request.curl.clone(),
                request,
            };
            return CommandResult::new(outcome).with_context(&action.resource, &action.action);
        }

        if self.cancel.is_cancelled() {
            return CommandResult::new(Outcome::Error {
                message: FetchError::Cancelled.to_string(),
                request: Some(request),
                response: None,
                timing: None,
            })
            .with_context(&action.resource, &action.action);
        }

        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let clock = Instant::now();
        log::debug!("{} {}", request.method, request.url);

        let outcome = match self.fetcher.fetch(&request, &self.cancel) {
            Ok(response) => {
                let timing = Timing {
                    started_at,
                    duration_ms: clock.elapsed().as_millis() as u64,
                };
                Outcome::Success {
                    response: summarize(response),
                    request,
                    timing,
                }
            }
            Err(error) => Outcome::Error {
                message: error.to_string(),
                request: Some(request),
                response: None,
                timing: Some(Timing {
                    started_at,
                    duration_ms: clock.elapsed().as_millis() as u64,
                }),
            },
        };
        CommandResult::new(outcome).with_context(&action.resource, &action.action)
    }
}

fn failure_outcome(failure: BuildFailure) -> Outcome {
    match failure {
        BuildFailure::Validation(errors) => Outcome::Validation {
            errors,
            request: None,
        },
        BuildFailure::Error(error) => Outcome::Error {
            message: error.to_string(),
            request: None,
            response: None,
            timing: None,
        },
    }
}

/// Parse the body leniently: JSON when the content type says so and the
/// text parses, else the raw string.
fn summarize(response: FetchResponse) -> ResponseSummary {
    let content_type = response
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.to_ascii_lowercase())
        .unwrap_or_default();
    let body = if content_type.contains("json") && !response.body.is_empty() {
        serde_json::from_str(&response.body)
            .unwrap_or_else(|_| Value::String(response.body.clone()))
    } else {
        Value::String(response.body.clone())
    };
    ResponseSummary {
        status: response.status,
        ok: (200..300).contains(&response.status),
        headers: response.headers,
        body,
        raw_body: response.body,
    }
}
