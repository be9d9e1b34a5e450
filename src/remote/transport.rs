//! HTTP-like transport seam
//!
//! The wire itself is outside this crate. A transport enforces the request
//! deadline it is handed and reports how long the exchange took.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// An outgoing JSON request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// A raw response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    /// Time from send to settle (ms)
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    TimedOut,
    #[error("network error: {0}")]
    Network(String),
}

pub trait Transport {
    /// Send a request, giving up after `timeout_ms`
    fn send(&mut self, request: &Request, timeout_ms: u64) -> Result<Response, TransportError>;
}

/// A transport with no network: every call fails immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn send(&mut self, _request: &Request, _timeout_ms: u64) -> Result<Response, TransportError> {
        Err(TransportError::Network("offline".to_string()))
    }
}

/// One canned outcome for `ScriptedTransport`
#[derive(Debug, Clone, PartialEq)]
pub enum Scripted {
    /// Reply with a status and JSON body after `elapsed_ms`
    Reply {
        status: u16,
        body: Value,
        elapsed_ms: u64,
    },
    /// Never settle; the transport gives up at the deadline
    Hang,
    /// Fail at the network layer
    Fail(String),
}

impl Scripted {
    /// Immediate 200 with a JSON body
    pub fn ok(body: Value) -> Self {
        Scripted::Reply {
            status: 200,
            body,
            elapsed_ms: 20,
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Scripted>,
    sent: Vec<Request>,
}

/// Canned-response transport for tests and offline demos.
///
/// Clones share the script, so a test can keep a handle to inspect the
/// requests after handing the transport to a client. An empty script fails
/// like an unreachable host.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next request
    pub fn push(&self, outcome: Scripted) {
        self.script.borrow_mut().queue.push_back(outcome);
    }

    /// Requests sent so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.script.borrow().sent.clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, request: &Request, timeout_ms: u64) -> Result<Response, TransportError> {
        let mut script = self.script.borrow_mut();
        script.sent.push(request.clone());
        match script.queue.pop_front() {
            Some(Scripted::Reply {
                status,
                body,
                elapsed_ms,
            }) => Ok(Response {
                status,
                body: body.to_string(),
                elapsed_ms,
            }),
            Some(Scripted::Hang) => {
                log::debug!("Scripted hang for {} ms", timeout_ms);
                Err(TransportError::TimedOut)
            }
            Some(Scripted::Fail(msg)) => Err(TransportError::Network(msg)),
            None => Err(TransportError::Network("no scripted response".to_string())),
        }
    }
}
