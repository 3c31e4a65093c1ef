// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The literal end-to-end scenarios against a stubbed transport, driving
//! a real custodian-backed identity through the public `GatewayClient`
//! surface rather than a bare signing stub.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fabric_credentials::{Custodian, FileKeyStore, CredentialsConfig};
use fabric_gateway::{
    Cancellation, EndorseResponse, EvaluateResponse, Error, GatewayClient, GatewayConfig,
    ProposalParams, Transport,
};
use futures::stream::{self, BoxStream};
use p256::ecdsa::SigningKey;
use p256::pkcs8::EncodePrivateKey;

async fn fresh_identity(dir: &std::path::Path) -> fabric_credentials::AppIdentity {
    let config = CredentialsConfig { storage_path: Some(dir.to_path_buf()), ..Default::default() };
    let store = Arc::new(FileKeyStore::open(&config).await.unwrap());
    let custodian = Custodian::new(store);
    let signing_key = SigningKey::random(&mut rand_core::OsRng);
    let key_pem = signing_key.to_pkcs8_pem(Default::default()).unwrap().to_string();
    let cert_pem = "-----BEGIN CERTIFICATE-----\nOrg1MSP-admin\n-----END CERTIFICATE-----".to_string();
    let created = custodian
        .create_password_identity(cert_pem, key_pem, Some("a-reasonably-strong-password".to_string()))
        .await
        .unwrap();
    created.identity
}

fn params(function_name: &str, args: Vec<&str>) -> ProposalParams {
    ProposalParams {
        msp_id: "Org1MSP".to_string(),
        channel_name: "mychannel".to_string(),
        chaincode_name: "basic".to_string(),
        function_name: function_name.to_string(),
        args: args.into_iter().map(|a| a.into()).collect(),
    }
}

struct ScriptedTransport {
    evaluate_response: Mutex<Vec<u8>>,
    evaluate_status: Mutex<i32>,
    evaluate_message: Mutex<String>,
    endorse_response: Mutex<Vec<u8>>,
    commit_result: Mutex<i32>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            evaluate_response: Mutex::new(Vec::new()),
            evaluate_status: Mutex::new(fabric_gateway::proto::RESPONSE_STATUS_SUCCESS),
            evaluate_message: Mutex::new(String::new()),
            endorse_response: Mutex::new(Vec::new()),
            commit_result: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn evaluate(
        &self,
        _req: fabric_gateway::proto::SignedProposal,
    ) -> fabric_gateway::Result<EvaluateResponse> {
        Ok(EvaluateResponse {
            result: fabric_gateway::proto::Response {
                status: *self.evaluate_status.lock().unwrap(),
                message: self.evaluate_message.lock().unwrap().clone(),
                payload: self.evaluate_response.lock().unwrap().clone(),
            },
        })
    }

    async fn endorse(
        &self,
        _req: fabric_gateway::proto::SignedProposal,
    ) -> fabric_gateway::Result<EndorseResponse> {
        Ok(EndorseResponse {
            result: fabric_gateway::proto::Response {
                status: fabric_gateway::proto::RESPONSE_STATUS_SUCCESS,
                message: String::new(),
                payload: self.endorse_response.lock().unwrap().clone(),
            },
            envelope_payload: b"prepared-envelope".to_vec(),
        })
    }

    async fn submit(&self, _req: fabric_gateway::proto::Envelope) -> fabric_gateway::Result<()> {
        Ok(())
    }

    async fn commit_status(
        &self,
        _req: fabric_gateway::proto::SignedCommitStatusRequest,
    ) -> fabric_gateway::Result<fabric_gateway::proto::CommitStatusResponse> {
        Ok(fabric_gateway::proto::CommitStatusResponse {
            result: *self.commit_result.lock().unwrap(),
            block_number: 7,
        })
    }

    async fn chaincode_events(
        &self,
        _req: fabric_gateway::proto::SignedChaincodeEventsRequest,
    ) -> fabric_gateway::Result<BoxStream<'static, fabric_gateway::Result<fabric_gateway::proto::ChaincodeEventsResponse>>>
    {
        use futures::StreamExt;
        Ok(stream::empty().boxed())
    }
}

// Scenario 1: evaluate round trip.
#[tokio::test]
async fn evaluate_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let identity = fresh_identity(dir.path()).await;
    let transport = ScriptedTransport::new();
    *transport.evaluate_response.lock().unwrap() =
        br#"[{"ID":"asset1"},{"ID":"asset2"}]"#.to_vec();
    let client = GatewayClient::with_transport(GatewayConfig::new("https://gateway"), Arc::new(transport), None);

    let evaluated = client.evaluate_transaction(&params("GetAllAssets", vec![]), &identity).await.unwrap();
    assert_eq!(evaluated.tx_id.len(), 64);
    match evaluated.parsed_data {
        fabric_gateway::ParsedPayload::Json(serde_json::Value::Array(items)) => assert_eq!(items.len(), 2),
        other => panic!("expected a json array, got {other:?}"),
    }
}

// Scenario 2: create then read.
#[tokio::test]
async fn create_then_read() {
    let dir = tempfile::tempdir().unwrap();
    let identity = fresh_identity(dir.path()).await;
    let transport = ScriptedTransport::new();
    *transport.endorse_response.lock().unwrap() = br#"{"ok":true}"#.to_vec();
    let client = GatewayClient::with_transport(GatewayConfig::new("https://gateway"), Arc::new(transport), None);

    let outcome = client
        .submit_and_commit(
            &params("CreateAsset", vec!["test-asset-1", "blue", "10", "owner1", "500"]),
            &identity,
            &Cancellation::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.commit_status, fabric_gateway::CommitStatus::Valid);

    let read_transport = ScriptedTransport::new();
    *read_transport.evaluate_response.lock().unwrap() =
        br#"{"ID":"test-asset-1","Color":"blue","Size":10,"Owner":"owner1","AppraisedValue":500}"#
            .to_vec();
    let read_client =
        GatewayClient::with_transport(GatewayConfig::new("https://gateway"), Arc::new(read_transport), None);
    let evaluated =
        read_client.evaluate_transaction(&params("ReadAsset", vec!["test-asset-1"]), &identity).await.unwrap();
    match evaluated.parsed_data {
        fabric_gateway::ParsedPayload::Json(serde_json::Value::Object(map)) => {
            assert_eq!(map.get("Color").unwrap(), "blue");
            assert_eq!(map.get("Owner").unwrap(), "owner1");
        }
        other => panic!("expected json object, got {other:?}"),
    }
}

// Scenario 3: unknown function.
#[tokio::test]
async fn unknown_function_surfaces_endorsement_failure() {
    let dir = tempfile::tempdir().unwrap();
    let identity = fresh_identity(dir.path()).await;
    let transport = ScriptedTransport::new();
    *transport.evaluate_status.lock().unwrap() = 500;
    *transport.evaluate_message.lock().unwrap() =
        "Function NonExistentFunction not found".to_string();
    let client = GatewayClient::with_transport(GatewayConfig::new("https://gateway"), Arc::new(transport), None);

    let err = client
        .evaluate_transaction(&params("NonExistentFunction", vec![]), &identity)
        .await
        .unwrap_err();
    match err {
        Error::EndorsementFailure(message) => {
            assert!(message.contains("Function NonExistentFunction not found"));
        }
        other => panic!("expected EndorsementFailure, got {other:?}"),
    }
}

// Scenario 4: commit failure surfacing.
#[tokio::test]
async fn commit_failure_surfaces_with_tx_id() {
    let dir = tempfile::tempdir().unwrap();
    let identity = fresh_identity(dir.path()).await;
    let transport = ScriptedTransport::new();
    *transport.commit_result.lock().unwrap() = fabric_gateway::proto::validation_code::MVCC_READ_CONFLICT;
    let client = GatewayClient::with_transport(GatewayConfig::new("https://gateway"), Arc::new(transport), None);

    let err = client
        .submit_and_commit(&params("CreateAsset", vec!["a"]), &identity, &Cancellation::new())
        .await
        .unwrap_err();
    match err {
        Error::Stage { stage, source } => {
            assert_eq!(stage, "commit_status");
            match *source {
                Error::CommitFailed { tx_id, validation_code } => {
                    assert!(!tx_id.is_empty());
                    assert_eq!(validation_code, "MVCC_READ_CONFLICT");
                }
                other => panic!("expected CommitFailed, got {other:?}"),
            }
        }
        other => panic!("expected a commit_status-stage error, got {other:?}"),
    }
}

// Cancellation safety for submitAndCommit: per the concurrency model,
// every streaming call and submitAndCommit accepts a cancellation handle,
// and a cancelled call must not complete successfully nor commit.
#[tokio::test]
async fn cancelling_before_submit_surfaces_cancelled_without_committing() {
    let dir = tempfile::tempdir().unwrap();
    let identity = fresh_identity(dir.path()).await;
    let transport = ScriptedTransport::new();
    *transport.endorse_response.lock().unwrap() = br#"{"ok":true}"#.to_vec();
    let client = GatewayClient::with_transport(GatewayConfig::new("https://gateway"), Arc::new(transport), None);

    let cancellation = Cancellation::new();
    cancellation.cancel();
    let err = client
        .submit_and_commit(&params("CreateAsset", vec!["a"]), &identity, &cancellation)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
