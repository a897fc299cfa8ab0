//! Message schema.
//!
//! Two top-level message kinds travel in frames: `ClientMessage` (requests)
//! and `ServerMessage` (replies). A reply always carries a status; `Invalid`
//! replies explain themselves in `error` and carry no body.

use serde::{Deserialize, Serialize};

/// Read one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: String,
}

/// Write one key.
///
/// `timestamp` is absent on client-originated writes; the primary stamps
/// the applied timestamp into the requests it forwards to the other
/// replicas, pinning the value's identity across the replica set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
    pub timestamp: Option<u64>,
}

/// Result of a [`GetRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub found: bool,
    pub value: Option<String>,
    pub timestamp: Option<u64>,
}

impl GetResponse {
    /// The placeholder recorded for a replica that never answered.
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(value: String, timestamp: u64) -> Self {
        Self {
            found: true,
            value: Some(value),
            timestamp: Some(timestamp),
        }
    }
}

/// Result of a [`PutRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
}

/// Request envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    Get(GetRequest),
    Put(PutRequest),
}

/// Reply status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    Invalid,
}

/// Reply body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Get(GetResponse),
    Put(PutResponse),
}

/// Reply envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub status: Status,
    pub error: Option<String>,
    pub reply: Option<Reply>,
}

impl ServerMessage {
    pub fn ok(reply: Reply) -> Self {
        Self {
            status: Status::Ok,
            error: None,
            reply: Some(reply),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            status: Status::Invalid,
            error: Some(error.into()),
            reply: None,
        }
    }

    /// The get body, if this is a well-formed OK get reply.
    pub fn into_get_response(self) -> Option<GetResponse> {
        match (self.status, self.reply) {
            (Status::Ok, Some(Reply::Get(response))) => Some(response),
            _ => None,
        }
    }

    /// The put body, if this is a well-formed OK put reply.
    pub fn into_put_response(self) -> Option<PutResponse> {
        match (self.status, self.reply) {
            (Status::Ok, Some(Reply::Put(response))) => Some(response),
            _ => None,
        }
    }
}
