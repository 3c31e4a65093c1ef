// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Value types shared between the builder, parser, and client.

use serde_json::Value as JsonValue;

/// A chaincode invocation argument: Fabric arguments are raw bytes, but
/// callers overwhelmingly pass UTF-8 strings.
#[derive(Clone, Debug)]
pub enum Arg {
    Text(String),
    Bytes(Vec<u8>),
}

impl Arg {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Arg::Text(s) => s.as_bytes(),
            Arg::Bytes(b) => b,
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Arg::Bytes(value)
    }
}

/// Parameters identifying a chaincode invocation, shared by evaluate,
/// endorse, and submit.
#[derive(Clone, Debug)]
pub struct ProposalParams {
    pub msp_id: String,
    pub channel_name: String,
    pub chaincode_name: String,
    pub function_name: String,
    pub args: Vec<Arg>,
}

/// Per-transaction values derived fresh for every proposal; never
/// persisted and never reused across transactions.
#[derive(Clone, Debug)]
pub struct TransactionContext {
    pub nonce: [u8; 24],
    pub creator_bytes: Vec<u8>,
    pub tx_id: String,
}

/// The outcome of `endorse`: ready to sign and submit.
#[derive(Clone, Debug)]
pub struct PreparedTransaction {
    pub tx_id: String,
    pub envelope_payload: Vec<u8>,
}

/// The terminal validation outcome of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitStatus {
    Valid,
    Invalid(String),
}

/// The outcome of `submitAndCommit`.
#[derive(Clone, Debug)]
pub struct SubmittedOutcome {
    pub tx_id: String,
    pub commit_status: CommitStatus,
}

/// The decoded result of an `evaluate` call, or the evaluate-time
/// simulation embedded in an endorse response.
#[derive(Clone, Debug)]
pub struct EvaluatedTransaction {
    pub tx_id: String,
    pub status: i32,
    pub message: String,
    pub parsed_data: ParsedPayload,
}

/// The three-way decode result the parser produces from a chaincode
/// response payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedPayload {
    Json(JsonValue),
    Text(String),
    Binary(String),
}

/// A single chaincode event, as delivered inside a `ChaincodeEventBatch`.
#[derive(Clone, Debug)]
pub struct ChaincodeEventRecord {
    pub tx_id: String,
    pub chaincode_name: String,
    pub event_name: String,
    pub payload: Vec<u8>,
}

/// A batch of chaincode events sharing a block number.
#[derive(Clone, Debug)]
pub struct ChaincodeEventBatch {
    pub block_number: u64,
    pub events: Vec<ChaincodeEventRecord>,
}

/// A single transaction's outcome inside a `FilteredBlockRecord`.
#[derive(Clone, Debug)]
pub struct FilteredTransactionRecord {
    pub tx_id: String,
    pub validation_code: String,
    pub chaincode_actions: Vec<String>,
}

/// A filtered block, as delivered by the deliver stream.
#[derive(Clone, Debug)]
pub struct FilteredBlockRecord {
    pub channel_id: String,
    pub number: u64,
    pub transactions: Vec<FilteredTransactionRecord>,
}

/// Where a deliver stream should start reading.
#[derive(Clone, Copy, Debug, Default)]
pub enum StartPosition {
    #[default]
    Newest,
    Block(u64),
}

/// The outcome of `submitAndCommit`: the tx id, the already-parsed
/// evaluate-time simulation result, and the final commit status.
#[derive(Clone, Debug)]
pub struct SubmitAndCommitOutcome {
    pub tx_id: String,
    pub result: ParsedPayload,
    pub commit_status: CommitStatus,
}

/// Parameters for subscribing to chaincode events on a channel.
#[derive(Clone, Debug)]
pub struct ChaincodeEventsParams {
    pub msp_id: String,
    pub channel_name: String,
    pub chaincode_name: String,
    pub start: StartPosition,
}

/// Parameters for subscribing to filtered block events over the peer
/// deliver WebSocket.
#[derive(Clone, Debug)]
pub struct BlockEventsParams {
    pub msp_id: String,
    pub channel_name: String,
    pub start: StartPosition,
    /// The `target` query parameter: the peer endpoint the gateway
    /// proxy should dial.
    pub target: String,
    /// The `hostname` query parameter: the TLS SNI to present.
    pub hostname: String,
}
