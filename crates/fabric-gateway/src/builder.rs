// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Pure construction of Fabric wire messages. Nothing here touches the
//! network or the custodian; the only non-determinism is the random
//! nonce and the current timestamp, both supplied by the caller's
//! environment rather than hidden global state.

use prost::Message as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::proto::{
    self, ChaincodeEventsRequest, ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput,
    ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec, ChannelHeader,
    CommitStatusRequest, Header, Proposal, SeekInfo, SeekNewest, SeekPosition, SeekPositionType,
    SeekSpecified, SerializedIdentity, SignatureHeader, Timestamp,
};
use crate::types::{Arg, ProposalParams, StartPosition, TransactionContext};

/// The stop position Fabric uses to mean "stream continuously": the
/// largest value a 64-bit block number can represent minus one bit of
/// headroom, matching the reference client's convention.
const CONTINUOUS_STREAM_STOP: u64 = (1u64 << 53) - 1;

/// `serializedIdentity`(msp_id, cert_pem): packs `{mspid, id_bytes}`.
pub fn serialized_identity(msp_id: &str, cert_pem: &str) -> Vec<u8> {
    SerializedIdentity { mspid: msp_id.to_string(), id_bytes: cert_pem.as_bytes().to_vec() }
        .encode_to_vec()
}

/// `txContext`(msp_id, cert_pem): fresh nonce, creator bytes, and the
/// resulting deterministic transaction id.
pub fn tx_context(msp_id: &str, cert_pem: &str) -> TransactionContext {
    let mut nonce = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut nonce);
    let creator_bytes = serialized_identity(msp_id, cert_pem);
    TransactionContext { tx_id: tx_id_for(&nonce, &creator_bytes), nonce, creator_bytes }
}

/// `tx_id = hex(SHA-256(nonce || creator_bytes))`, exposed separately so
/// tests (and `submitAndCommit`'s re-derivation needs) can recompute it
/// without rebuilding a whole `TransactionContext`.
pub fn tx_id_for(nonce: &[u8], creator_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator_bytes);
    hex::encode(hasher.finalize())
}

fn now_timestamp() -> Timestamp {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    Timestamp { seconds: now.as_secs() as i64, nanos: now.subsec_nanos() as i32 }
}

/// `proposalPayload`(params, tx_id, creator_bytes, nonce): the
/// to-be-signed `Proposal` bytes.
pub fn proposal_payload(
    params: &ProposalParams,
    tx_id: &str,
    creator_bytes: &[u8],
    nonce: &[u8],
) -> Vec<u8> {
    let mut args = Vec::with_capacity(params.args.len() + 1);
    args.push(params.function_name.as_bytes().to_vec());
    args.extend(params.args.iter().map(Arg::as_bytes).map(<[u8]>::to_vec));

    let invocation_spec = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            r#type: proto::CHAINCODE_TYPE_GOLANG,
            chaincode_id: Some(ChaincodeId { name: params.chaincode_name.clone() }),
            input: Some(ChaincodeInput { args }),
        }),
    };
    let proposal_proto_payload = ChaincodeProposalPayload {
        input: invocation_spec.encode_to_vec(),
    };

    let extension = ChaincodeHeaderExtension {
        chaincode_id: Some(ChaincodeId { name: params.chaincode_name.clone() }),
    };
    let channel_header = ChannelHeader {
        r#type: proto::HEADER_TYPE_ENDORSER_TRANSACTION,
        version: 1,
        timestamp: Some(now_timestamp()),
        channel_id: params.channel_name.clone(),
        tx_id: tx_id.to_string(),
        epoch: 0,
        extension: extension.encode_to_vec(),
    };
    let signature_header =
        SignatureHeader { creator: creator_bytes.to_vec(), nonce: nonce.to_vec() };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };

    Proposal { header: header.encode_to_vec(), payload: proposal_proto_payload.encode_to_vec() }
        .encode_to_vec()
}

fn seek_position(block: u64) -> SeekPosition {
    SeekPosition { r#type: Some(SeekPositionType::Specified(SeekSpecified { number: block })) }
}

/// `seekInfoEnvelope`(channel, msp_id, cert_pem, start): the
/// to-be-signed `Payload` bytes for a deliver-seek envelope.
pub fn seek_info_envelope(
    channel: &str,
    msp_id: &str,
    cert_pem: &str,
    start: StartPosition,
) -> Vec<u8> {
    let creator_bytes = serialized_identity(msp_id, cert_pem);
    let mut nonce = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut nonce);
    let tx_id = tx_id_for(&nonce, &creator_bytes);

    let channel_header = ChannelHeader {
        r#type: proto::HEADER_TYPE_DELIVER_SEEK_INFO,
        version: 1,
        timestamp: Some(now_timestamp()),
        channel_id: channel.to_string(),
        tx_id,
        epoch: 0,
        extension: Vec::new(),
    };
    let signature_header = SignatureHeader { creator: creator_bytes, nonce: nonce.to_vec() };
    let header = Header {
        channel_header: channel_header.encode_to_vec(),
        signature_header: signature_header.encode_to_vec(),
    };

    let start_position = match start {
        StartPosition::Newest => {
            SeekPosition { r#type: Some(SeekPositionType::Newest(SeekNewest {})) }
        }
        StartPosition::Block(number) => seek_position(number),
    };
    let seek_info = SeekInfo {
        start: Some(start_position),
        stop: Some(seek_position(CONTINUOUS_STREAM_STOP)),
        behavior: proto::SEEK_BEHAVIOR_BLOCK_UNTIL_READY,
    };

    proto::Payload { header: header.encode_to_vec(), data: seek_info.encode_to_vec() }
        .encode_to_vec()
}

/// `commitStatusRequest`(channel, tx_id, msp_id, cert_pem): raw
/// `CommitStatusRequest` bytes, signed as-is (no enclosing `Proposal`).
pub fn commit_status_request(
    channel: &str,
    tx_id: &str,
    msp_id: &str,
    cert_pem: &str,
) -> Vec<u8> {
    CommitStatusRequest {
        channel_id: channel.to_string(),
        transaction_id: tx_id.to_string(),
        identity: serialized_identity(msp_id, cert_pem),
    }
    .encode_to_vec()
}

/// `chaincodeEventsRequest`(channel, chaincode, msp_id, cert_pem, start)
///: raw `ChaincodeEventsRequest` bytes.
pub fn chaincode_events_request(
    channel: &str,
    chaincode: &str,
    msp_id: &str,
    cert_pem: &str,
    start: StartPosition,
) -> Vec<u8> {
    let start_position = match start {
        StartPosition::Newest => {
            SeekPosition { r#type: Some(SeekPositionType::Newest(SeekNewest {})) }
        }
        StartPosition::Block(number) => seek_position(number),
    };
    ChaincodeEventsRequest {
        channel_id: channel.to_string(),
        chaincode_id: chaincode.to_string(),
        identity: serialized_identity(msp_id, cert_pem),
        start_position: Some(start_position),
    }
    .encode_to_vec()
}
