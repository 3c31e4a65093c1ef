// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The network collaborator the client drives. Both the gRPC-Web
//! transport and the peer deliver WebSocket are external to this crate;
//! only their interface is specified here, and production adapters are
//! expected to be supplied by the embedding application.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::proto;

/// Result of an `Evaluate` RPC: the chaincode's simulated response, never
/// sent on to the ordering service.
#[derive(Clone, Debug)]
pub struct EvaluateResponse {
    pub result: proto::Response,
}

/// Result of an `Endorse` RPC: the simulated response plus the signed
/// envelope payload the caller will submit next.
#[derive(Clone, Debug)]
pub struct EndorseResponse {
    pub result: proto::Response,
    pub envelope_payload: Vec<u8>,
}

/// The four unary gateway RPCs plus the chaincode-events server stream.
/// A production implementation speaks gRPC-Web/HTTP2 to a Fabric
/// gateway; tests supply an in-memory double.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn evaluate(&self, req: proto::SignedProposal) -> Result<EvaluateResponse>;
    async fn endorse(&self, req: proto::SignedProposal) -> Result<EndorseResponse>;
    async fn submit(&self, req: proto::Envelope) -> Result<()>;
    async fn commit_status(
        &self,
        req: proto::SignedCommitStatusRequest,
    ) -> Result<proto::CommitStatusResponse>;
    async fn chaincode_events(
        &self,
        req: proto::SignedChaincodeEventsRequest,
    ) -> Result<BoxStream<'static, Result<proto::ChaincodeEventsResponse>>>;
}

/// The peer deliver-filtered WebSocket: one binary frame out (the seek
/// envelope), a stream of binary frames in (`DeliverResponse`s).
#[async_trait]
pub trait DeliverTransport: Send + Sync {
    async fn connect(
        &self,
        ws_url: &str,
        envelope: proto::Envelope,
    ) -> Result<BoxStream<'static, Result<proto::DeliverResponse>>>;
}
