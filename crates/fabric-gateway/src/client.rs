// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The single public entry point: orchestrates proposal construction,
//! signing, and the gateway RPCs on top of a [`Transport`] collaborator.

use std::sync::Arc;

use fabric_credentials::AppIdentity;
use fabric_credentials::signer::sign_and_encode;

use crate::builder;
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::parser;
use crate::proto;
use crate::transport::{DeliverTransport, Transport};
use crate::types::{
    BlockEventsParams, ChaincodeEventsParams, CommitStatus, EvaluatedTransaction,
    PreparedTransaction, ProposalParams, SubmitAndCommitOutcome,
};

pub use crate::events::{BlockEventStream, Cancellation, ChaincodeEventStream};

/// Orchestrates the Fabric transaction lifecycle on top of a transport
/// collaborator. Holds no key material; every signature is requested
/// from the `AppIdentity` passed into each call.
pub struct GatewayClient {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    deliver_transport: Option<Arc<dyn DeliverTransport>>,
}

impl GatewayClient {
    /// Construct a client from `config`, using its `transport_override`
    /// (and, if present, `deliver_transport_override`) as the transport.
    /// A production embedder wires a real gRPC-Web/WebSocket adapter
    /// through these factories; this crate does not ship one itself.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let transport_factory = config.transport_override.clone().ok_or_else(|| {
            Error::InputInvalid("gateway_url configured but no transport_override supplied".to_string())
        })?;
        let transport = transport_factory();
        let deliver_transport = config.deliver_transport_override.as_ref().map(|factory| factory());
        Ok(Self { config, transport, deliver_transport })
    }

    /// Construct a client directly from concrete transports, bypassing
    /// the override factories. The path production embedders use once
    /// they have real adapters.
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        deliver_transport: Option<Arc<dyn DeliverTransport>>,
    ) -> Self {
        Self { config, transport, deliver_transport }
    }

    async fn signed_proposal(
        &self,
        params: &ProposalParams,
        identity: &AppIdentity,
    ) -> Result<(String, proto::SignedProposal)> {
        let ctx = builder::tx_context(&params.msp_id, &identity.cert_pem);
        let payload = builder::proposal_payload(params, &ctx.tx_id, &ctx.creator_bytes, &ctx.nonce);
        let raw_signature = identity.sign(&payload).await.map_err(Error::Custodian)?;
        let signature = sign_and_encode(&raw_signature);
        Ok((ctx.tx_id, proto::SignedProposal { proposal_bytes: payload, signature }))
    }

    /// `evaluateTransaction`: simulate only; never reaches the
    /// ordering service.
    pub async fn evaluate_transaction(
        &self,
        params: &ProposalParams,
        identity: &AppIdentity,
    ) -> Result<EvaluatedTransaction> {
        let (tx_id, signed_proposal) = self.signed_proposal(params, identity).await?;
        tracing::debug!(tx_id = %tx_id, function = %params.function_name, "dispatching Evaluate");
        let response = self.transport.evaluate(signed_proposal).await?;
        if response.result.status != proto::RESPONSE_STATUS_SUCCESS {
            tracing::warn!(tx_id = %tx_id, status = response.result.status, "evaluate endorsement failed");
            return Err(Error::EndorsementFailure(response.result.message));
        }
        Ok(parser::evaluated_transaction(&tx_id, &response.result))
    }

    /// `prepareTransaction`: endorse, returning the signed envelope
    /// payload ready for submission. Also hands back the decoded
    /// simulation result so `submitAndCommit` doesn't need a second
    /// round trip.
    async fn prepare(
        &self,
        params: &ProposalParams,
        identity: &AppIdentity,
    ) -> Result<(PreparedTransaction, EvaluatedTransaction)> {
        let (tx_id, signed_proposal) = self.signed_proposal(params, identity).await?;
        tracing::debug!(tx_id = %tx_id, function = %params.function_name, "dispatching Endorse");
        let response = self.transport.endorse(signed_proposal).await?;
        if response.result.status != proto::RESPONSE_STATUS_SUCCESS {
            tracing::warn!(tx_id = %tx_id, status = response.result.status, "endorse failed");
            return Err(Error::EndorsementFailure(response.result.message));
        }
        let prepared =
            PreparedTransaction { tx_id: tx_id.clone(), envelope_payload: response.envelope_payload };
        let evaluated = parser::evaluated_transaction(&tx_id, &response.result);
        Ok((prepared, evaluated))
    }

    pub async fn prepare_transaction(
        &self,
        params: &ProposalParams,
        identity: &AppIdentity,
    ) -> Result<PreparedTransaction> {
        self.prepare(params, identity).await.map(|(prepared, _)| prepared)
    }

    /// `submitSignedTransaction`: sign the prepared payload and hand it
    /// to the ordering service. Returns once the gateway accepts it; does
    /// not wait for commit.
    pub async fn submit_signed_transaction(
        &self,
        prepared: &PreparedTransaction,
        identity: &AppIdentity,
    ) -> Result<()> {
        let raw_signature = identity.sign(&prepared.envelope_payload).await.map_err(Error::Custodian)?;
        let signature = sign_and_encode(&raw_signature);
        let envelope = proto::Envelope { payload: prepared.envelope_payload.clone(), signature };
        tracing::debug!(tx_id = %prepared.tx_id, "dispatching Submit");
        self.transport.submit(envelope).await
    }

    /// `commitStatus`: poll the gateway for the final validation
    /// outcome of a submitted transaction.
    pub async fn commit_status(
        &self,
        channel: &str,
        tx_id: &str,
        msp_id: &str,
        identity: &AppIdentity,
    ) -> Result<CommitStatus> {
        let request_bytes = builder::commit_status_request(channel, tx_id, msp_id, &identity.cert_pem);
        let raw_signature = identity.sign(&request_bytes).await.map_err(Error::Custodian)?;
        let signature = sign_and_encode(&raw_signature);
        let signed = proto::SignedCommitStatusRequest { request: request_bytes, signature };
        tracing::debug!(tx_id, "dispatching CommitStatus");
        let response = self.transport.commit_status(signed).await?;
        if response.result == proto::validation_code::VALID {
            Ok(CommitStatus::Valid)
        } else {
            let code = proto::validation_code_name(response.result);
            tracing::warn!(tx_id, validation_code = %code, "commit status not valid");
            Err(Error::CommitFailed { tx_id: tx_id.to_string(), validation_code: code })
        }
    }

    /// `submitAndCommit`: prepare, submit, then wait for the commit
    /// status, surfacing the first failure wrapped in `Error::Stage` so
    /// the caller can tell which of the three stages it came from.
    /// Checked for cancellation between each stage; a cancelled call
    /// surfaces `Error::Cancelled` rather than leaving the transaction
    /// half-submitted silently.
    pub async fn submit_and_commit(
        &self,
        params: &ProposalParams,
        identity: &AppIdentity,
        cancellation: &Cancellation,
    ) -> Result<SubmitAndCommitOutcome> {
        let (prepared, evaluated) =
            self.prepare(params, identity).await.map_err(|e| Error::stage("prepare", e))?;
        if cancellation.is_cancelled() {
            tracing::debug!(tx_id = %prepared.tx_id, stage = "prepare", "submitAndCommit cancelled");
            return Err(Error::Cancelled);
        }
        self.submit_signed_transaction(&prepared, identity)
            .await
            .map_err(|e| Error::stage("submit", e))?;
        if cancellation.is_cancelled() {
            tracing::debug!(tx_id = %prepared.tx_id, stage = "submit", "submitAndCommit cancelled");
            return Err(Error::Cancelled);
        }
        let commit_status = self
            .commit_status(&params.channel_name, &prepared.tx_id, &params.msp_id, identity)
            .await
            .map_err(|e| Error::stage("commit_status", e))?;
        tracing::info!(tx_id = %prepared.tx_id, "submitAndCommit completed");
        Ok(SubmitAndCommitOutcome {
            tx_id: prepared.tx_id,
            result: evaluated.parsed_data,
            commit_status,
        })
    }

    /// `listenChaincodeEvents`: a restartable, single-consumer,
    /// cancellable stream of chaincode event batches.
    pub async fn listen_chaincode_events(
        &self,
        params: &ChaincodeEventsParams,
        identity: &AppIdentity,
        cancellation: Cancellation,
    ) -> Result<ChaincodeEventStream> {
        let request_bytes = builder::chaincode_events_request(
            &params.channel_name,
            &params.chaincode_name,
            &params.msp_id,
            &identity.cert_pem,
            params.start,
        );
        let raw_signature = identity.sign(&request_bytes).await.map_err(Error::Custodian)?;
        let signature = sign_and_encode(&raw_signature);
        let signed = proto::SignedChaincodeEventsRequest { request: request_bytes, signature };
        tracing::debug!(channel = %params.channel_name, chaincode = %params.chaincode_name, "dispatching ChaincodeEvents");
        let inner = self.transport.chaincode_events(signed).await?;
        Ok(ChaincodeEventStream::spawn(inner, cancellation))
    }

    /// `listenBlockEvents`: opens a WebSocket to the configured
    /// `ws_url`, sends the seek envelope as a single binary frame, and
    /// yields each decoded `FilteredBlock` thereafter.
    pub async fn listen_block_events(
        &self,
        params: &BlockEventsParams,
        identity: &AppIdentity,
        cancellation: Cancellation,
    ) -> Result<BlockEventStream> {
        let ws_base = self.config.ws_url.as_ref().ok_or_else(|| {
            Error::InputInvalid("block-event subscription requires ws_url".to_string())
        })?;
        let deliver_transport = self.deliver_transport.as_ref().ok_or_else(|| {
            Error::InputInvalid("block-event subscription requires a deliver transport".to_string())
        })?;

        let payload = builder::seek_info_envelope(
            &params.channel_name,
            &params.msp_id,
            &identity.cert_pem,
            params.start,
        );
        let raw_signature = identity.sign(&payload).await.map_err(Error::Custodian)?;
        let signature = sign_and_encode(&raw_signature);
        let envelope = proto::Envelope { payload, signature };

        let ws_url = format!("{ws_base}?target={}&hostname={}", params.target, params.hostname);
        tracing::debug!(channel = %params.channel_name, ws_url = %ws_url, "opening block event deliver stream");
        let inner = deliver_transport.connect(&ws_url, envelope).await?;
        Ok(BlockEventStream::spawn(inner, cancellation))
    }
}
