// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Pull-based, cancellable event streams. The producer runs as its own
//! task writing into a bounded channel; the consumer reads via
//! [`futures::Stream`]; cancellation stops the producer and closes the
//! channel without surfacing an error. Modeled on the SSE stream used
//! elsewhere in this workspace for long-lived server-pushed events.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::proto;
use crate::types::{ChaincodeEventBatch, ChaincodeEventRecord, FilteredBlockRecord, FilteredTransactionRecord};

const CHANNEL_CAPACITY: usize = 32;

/// A handle the caller holds to cancel a running stream. Cloning shares
/// the same underlying token; cancelling from any clone stops the
/// producer.
#[derive(Clone, Debug)]
pub struct Cancellation(CancellationToken);

impl Cancellation {
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// A restartable, single-consumer stream of chaincode event batches.
pub struct ChaincodeEventStream {
    receiver: mpsc::Receiver<Result<ChaincodeEventBatch>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl ChaincodeEventStream {
    pub(crate) fn spawn(
        mut inner: futures::stream::BoxStream<'static, Result<proto::ChaincodeEventsResponse>>,
        cancellation: Cancellation,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancellation.0.cancelled() => break,
                    next = inner.next() => {
                        match next {
                            None => break,
                            Some(Ok(response)) => {
                                let batch = decode_batch(response);
                                if tx.send(Ok(batch)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                let _ = tx.send(Err(err)).await;
                                break;
                            }
                        }
                    }
                }
            }
        });
        Self { receiver: rx, _handle: handle }
    }
}

fn decode_batch(response: proto::ChaincodeEventsResponse) -> ChaincodeEventBatch {
    ChaincodeEventBatch {
        block_number: response.block_number,
        events: response
            .events
            .into_iter()
            .map(|event| ChaincodeEventRecord {
                tx_id: event.tx_id,
                chaincode_name: event.chaincode_id,
                event_name: event.event_name,
                payload: event.payload,
            })
            .collect(),
    }
}

impl Stream for ChaincodeEventStream {
    type Item = Result<ChaincodeEventBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// A restartable, single-consumer stream of filtered blocks. Backed by a
/// `DeliverTransport` binary-frame WebSocket: `status` frames become
/// diagnostics (logged, not yielded), malformed frames become
/// [`Error::StreamProtocolError`].
pub struct BlockEventStream {
    receiver: mpsc::Receiver<Result<FilteredBlockRecord>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl BlockEventStream {
    pub(crate) fn spawn(
        mut inner: futures::stream::BoxStream<'static, Result<proto::DeliverResponse>>,
        cancellation: Cancellation,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancellation.0.cancelled() => break,
                    next = inner.next() => {
                        match next {
                            None => break,
                            Some(Ok(response)) => match response.r#type {
                                Some(proto::DeliverResponseType::FilteredBlock(block)) => {
                                    if tx.send(Ok(decode_block(block))).await.is_err() {
                                        break;
                                    }
                                }
                                Some(proto::DeliverResponseType::Status(code)) => {
                                    tracing::debug!(code, "deliver stream status frame");
                                }
                                None => {
                                    let err = Error::StreamProtocolError(
                                        "deliver response carried no payload".to_string(),
                                    );
                                    let _ = tx.send(Err(err)).await;
                                    break;
                                }
                            },
                            Some(Err(err)) => {
                                let _ = tx.send(Err(err)).await;
                                break;
                            }
                        }
                    }
                }
            }
        });
        Self { receiver: rx, _handle: handle }
    }
}

fn decode_block(block: proto::FilteredBlock) -> FilteredBlockRecord {
    FilteredBlockRecord {
        channel_id: block.channel_id,
        number: block.number,
        transactions: block
            .filtered_transactions
            .into_iter()
            .map(|tx| FilteredTransactionRecord {
                tx_id: tx.txid,
                validation_code: proto::validation_code_name(tx.tx_validation_code),
                chaincode_actions: tx.chaincode_actions,
            })
            .collect(),
    }
}

impl Stream for BlockEventStream {
    type Item = Result<FilteredBlockRecord>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn chaincode_event_stream_ends_when_the_transport_stream_ends() {
        let response = proto::ChaincodeEventsResponse { block_number: 1, events: vec![] };
        let inner = stream::iter(vec![Ok(response)]).boxed();
        let mut events = ChaincodeEventStream::spawn(inner, Cancellation::new());
        assert!(events.next().await.is_some());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn cancelling_stops_the_producer_without_an_error() {
        let cancellation = Cancellation::new();
        let inner = stream::pending().boxed();
        let mut events: ChaincodeEventStream = ChaincodeEventStream::spawn(inner, cancellation.clone());
        cancellation.cancel();
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(1), events.next()).await;
        assert_eq!(outcome.unwrap(), None);
    }

    #[tokio::test]
    async fn status_frames_are_diagnostics_not_yielded_items() {
        let status = proto::DeliverResponse { r#type: Some(proto::DeliverResponseType::Status(200)) };
        let block = proto::DeliverResponse {
            r#type: Some(proto::DeliverResponseType::FilteredBlock(proto::FilteredBlock {
                channel_id: "mychannel".to_string(),
                number: 5,
                filtered_transactions: vec![],
            })),
        };
        let inner = stream::iter(vec![Ok(status), Ok(block)]).boxed();
        let mut events = BlockEventStream::spawn(inner, Cancellation::new());
        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.number, 5);
        assert!(events.next().await.is_none());
    }
}
