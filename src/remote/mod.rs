//! Best-effort backend client
//!
//! Every call degrades to a locally synthesized result when the backend is
//! unreachable, slow or malformed. Callers get a `Remote<T>` that says which
//! of the two they are holding.

pub mod client;
pub mod fallback;
pub mod messages;
pub mod transport;

pub use client::RemoteClient;
pub use messages::*;
pub use transport::{
    Method, OfflineTransport, Request, Response, Scripted, ScriptedTransport, Transport,
    TransportError,
};

use crate::error::RemoteUnavailable;

/// Result of a remote call: the backend's answer, or a substitute
#[derive(Debug, Clone, PartialEq)]
pub enum Remote<T> {
    /// Authoritative answer from the backend
    Live(T),
    /// Synthesized stand-in, with the reason the backend was not used
    Fallback { value: T, reason: RemoteUnavailable },
}

impl<T> Remote<T> {
    pub fn is_live(&self) -> bool {
        matches!(self, Remote::Live(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Remote::Live(value) | Remote::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Remote::Live(value) | Remote::Fallback { value, .. } => value,
        }
    }

    pub fn reason(&self) -> Option<&RemoteUnavailable> {
        match self {
            Remote::Live(_) => None,
            Remote::Fallback { reason, .. } => Some(reason),
        }
    }
}
