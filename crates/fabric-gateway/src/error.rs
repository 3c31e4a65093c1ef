// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the gateway client and wire-message layer.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the message builder, parser, and gateway client.
///
/// The error message for `TransportFailure` should prefer the innermost
/// decoded detail (often a chaincode error string embedded in a transport
/// status) over the outer transport message; callers build that message
/// before constructing the variant.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input invalid: {0}")]
    InputInvalid(String),

    #[error(transparent)]
    Custodian(#[from] fabric_credentials::Error),

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("endorsement failure: {0}")]
    EndorsementFailure(String),

    #[error("commit failed for tx {tx_id}: {validation_code}")]
    CommitFailed { tx_id: String, validation_code: String },

    /// User cancellation. Streams never surface this as an error: it is
    /// reserved for `submitAndCommit`, where cancellation mid-flight is a
    /// genuine failure to complete.
    #[error("operation cancelled")]
    Cancelled,

    #[error("stream protocol error: {0}")]
    StreamProtocolError(String),

    /// A failure from one of `submitAndCommit`'s stages, tagged with
    /// which stage produced it. Without this, a `TransportFailure` from
    /// `prepare`'s `Endorse` RPC and one from `submit`'s `Submit` RPC are
    /// indistinguishable to the caller.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap `source` with the `submitAndCommit` stage that produced it.
    pub fn stage(stage: &'static str, source: Error) -> Error {
        Error::Stage { stage, source: Box::new(source) }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::InputInvalid(_) => "InputInvalid",
            Error::Custodian(inner) => inner.kind(),
            Error::TransportFailure(_) => "TransportFailure",
            Error::EndorsementFailure(_) => "EndorsementFailure",
            Error::CommitFailed { .. } => "CommitFailed",
            Error::Cancelled => "Cancelled",
            Error::StreamProtocolError(_) => "StreamProtocolError",
            Error::Stage { source, .. } => source.kind(),
        }
    }

    /// The `submitAndCommit` stage this error originated from, if any.
    pub fn stage_name(&self) -> Option<&'static str> {
        match self {
            Error::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
