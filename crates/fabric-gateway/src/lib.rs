// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Fabric wire-message construction, signing orchestration, and the
//! gateway client built on top of them. Depends on `fabric-credentials`
//! for the opaque signing capability; never touches private key
//! material directly.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod parser;
pub mod proto;
pub mod transport;
pub mod types;

pub use client::{BlockEventStream, Cancellation, ChaincodeEventStream, GatewayClient};
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use transport::{DeliverTransport, EndorseResponse, EvaluateResponse, Transport};
pub use types::{
    Arg, BlockEventsParams, ChaincodeEventBatch, ChaincodeEventRecord, ChaincodeEventsParams,
    CommitStatus, EvaluatedTransaction, FilteredBlockRecord, FilteredTransactionRecord,
    ParsedPayload, PreparedTransaction, ProposalParams, StartPosition, SubmitAndCommitOutcome,
    SubmittedOutcome, TransactionContext,
};
