// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Wire message shapes for the subset of Fabric's protobuf schemas this
//! crate constructs or reads. These are hand-authored `prost::Message`
//! implementations, not generated from `.proto` files: the schemas
//! themselves are assumed available externally, and only the fields this
//! crate actually touches are modeled.

use prost::{Message, Oneof};

/// The chaincode `type` field is set to GOLANG unconditionally. It is
/// informational at the wire level and does not restrict which chaincode
/// language actually runs.
pub const CHAINCODE_TYPE_GOLANG: i32 = 1;

/// `ChannelHeader.type` for an endorser transaction.
pub const HEADER_TYPE_ENDORSER_TRANSACTION: i32 = 3;
/// `ChannelHeader.type` for a deliver-seek request.
pub const HEADER_TYPE_DELIVER_SEEK_INFO: i32 = 8;

/// `SeekInfo.behavior`: block the stream until a requested block exists
/// rather than failing immediately.
pub const SEEK_BEHAVIOR_BLOCK_UNTIL_READY: i32 = 0;

/// `Response.status` for a successful chaincode invocation, mirroring
/// gRPC/HTTP success semantics at the application layer.
pub const RESPONSE_STATUS_SUCCESS: i32 = 200;

/// Transaction validation codes, as assigned at commit time. Only the
/// subset this crate names is enumerated; see [`validation_code_name`] for
/// the rest.
pub mod validation_code {
    pub const VALID: i32 = 0;
    pub const MVCC_READ_CONFLICT: i32 = 11;
}

pub fn validation_code_name(code: i32) -> String {
    match code {
        validation_code::VALID => "VALID".to_string(),
        validation_code::MVCC_READ_CONFLICT => "MVCC_READ_CONFLICT".to_string(),
        other => format!("INVALID_CODE_{other}"),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct SerializedIdentity {
    #[prost(string, tag = "1")]
    pub mspid: String,
    #[prost(bytes = "vec", tag = "2")]
    pub id_bytes: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChannelHeader {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(int32, tag = "2")]
    pub version: i32,
    #[prost(message, optional, tag = "3")]
    pub timestamp: Option<Timestamp>,
    #[prost(string, tag = "4")]
    pub channel_id: String,
    #[prost(string, tag = "5")]
    pub tx_id: String,
    #[prost(int64, tag = "6")]
    pub epoch: i64,
    #[prost(bytes = "vec", tag = "7")]
    pub extension: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignatureHeader {
    #[prost(bytes = "vec", tag = "1")]
    pub creator: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub nonce: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Header {
    #[prost(bytes = "vec", tag = "1")]
    pub channel_header: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature_header: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeId {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeSpec {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeInvocationSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
}

/// The `ChannelHeader.extension` field for an endorser-transaction
/// header: identifies which chaincode the proposal targets.
#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeHeaderExtension {
    #[prost(message, optional, tag = "1")]
    pub chaincode_id: Option<ChaincodeId>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeProposalPayload {
    #[prost(bytes = "vec", tag = "1")]
    pub input: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Proposal {
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignedProposal {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Payload {
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SeekNewest {}

#[derive(Clone, PartialEq, Message)]
pub struct SeekSpecified {
    #[prost(uint64, tag = "1")]
    pub number: u64,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum SeekPositionType {
    #[prost(message, tag = "1")]
    Newest(SeekNewest),
    #[prost(message, tag = "2")]
    Specified(SeekSpecified),
}

#[derive(Clone, PartialEq, Message)]
pub struct SeekPosition {
    #[prost(oneof = "SeekPositionType", tags = "1, 2")]
    pub r#type: Option<SeekPositionType>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SeekInfo {
    #[prost(message, optional, tag = "1")]
    pub start: Option<SeekPosition>,
    #[prost(message, optional, tag = "2")]
    pub stop: Option<SeekPosition>,
    #[prost(int32, tag = "3")]
    pub behavior: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CommitStatusRequest {
    #[prost(string, tag = "1")]
    pub channel_id: String,
    #[prost(string, tag = "2")]
    pub transaction_id: String,
    #[prost(bytes = "vec", tag = "3")]
    pub identity: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignedCommitStatusRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub request: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CommitStatusResponse {
    #[prost(int32, tag = "1")]
    pub result: i32,
    #[prost(uint64, tag = "2")]
    pub block_number: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeEventsRequest {
    #[prost(string, tag = "1")]
    pub channel_id: String,
    #[prost(string, tag = "2")]
    pub chaincode_id: String,
    #[prost(bytes = "vec", tag = "3")]
    pub identity: Vec<u8>,
    #[prost(message, optional, tag = "4")]
    pub start_position: Option<SeekPosition>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignedChaincodeEventsRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub request: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeEvent {
    #[prost(string, tag = "1")]
    pub chaincode_id: String,
    #[prost(string, tag = "2")]
    pub tx_id: String,
    #[prost(string, tag = "3")]
    pub event_name: String,
    #[prost(bytes = "vec", tag = "4")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChaincodeEventsResponse {
    #[prost(uint64, tag = "1")]
    pub block_number: u64,
    #[prost(message, repeated, tag = "2")]
    pub events: Vec<ChaincodeEvent>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FilteredTransaction {
    #[prost(string, tag = "1")]
    pub txid: String,
    #[prost(int32, tag = "2")]
    pub tx_validation_code: i32,
    #[prost(string, repeated, tag = "3")]
    pub chaincode_actions: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FilteredBlock {
    #[prost(string, tag = "1")]
    pub channel_id: String,
    #[prost(uint64, tag = "2")]
    pub number: u64,
    #[prost(message, repeated, tag = "3")]
    pub filtered_transactions: Vec<FilteredTransaction>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum DeliverResponseType {
    #[prost(int32, tag = "1")]
    Status(i32),
    #[prost(message, tag = "2")]
    FilteredBlock(FilteredBlock),
}

#[derive(Clone, PartialEq, Message)]
pub struct DeliverResponse {
    #[prost(oneof = "DeliverResponseType", tags = "1, 2")]
    pub r#type: Option<DeliverResponseType>,
}

/// The `Response` substructure of an evaluate/endorse result: just the
/// fields the parser reads.
#[derive(Clone, PartialEq, Message)]
pub struct Response {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}
