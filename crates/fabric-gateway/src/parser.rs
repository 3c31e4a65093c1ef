// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Decodes the `Response` payload returned by `evaluate`/`endorse` into
//! the caller-facing shape.

use crate::proto::Response;
use crate::types::{EvaluatedTransaction, ParsedPayload};

/// Three-step decode: UTF-8, then JSON-if-possible, else the raw string.
/// Binary (non-UTF-8) payloads degrade to a `(binary) 0x...` hex dump
/// rather than failing the call.
pub fn parse_payload(payload: &[u8]) -> ParsedPayload {
    match std::str::from_utf8(payload) {
        Ok(text) => match serde_json::from_str(text) {
            Ok(json) => ParsedPayload::Json(json),
            Err(_) => ParsedPayload::Text(text.to_string()),
        },
        Err(_) => ParsedPayload::Binary(format!("(binary) 0x{}", hex::encode(payload))),
    }
}

/// Re-parsing an already-parsed payload is idempotent: feed the decoded
/// value's canonical bytes back through and the same variant comes out.
/// Exposed for the testable-property suite, not needed by the client
/// itself (which only ever parses raw bytes once).
pub fn reparse(parsed: &ParsedPayload) -> ParsedPayload {
    match parsed {
        ParsedPayload::Json(value) => {
            parse_payload(serde_json::to_string(value).unwrap_or_default().as_bytes())
        }
        ParsedPayload::Text(text) => parse_payload(text.as_bytes()),
        ParsedPayload::Binary(rendered) => ParsedPayload::Binary(rendered.clone()),
    }
}

/// Builds the caller-facing [`EvaluatedTransaction`] from a decoded
/// `Response` and the transaction id that produced it.
pub fn evaluated_transaction(tx_id: &str, response: &Response) -> EvaluatedTransaction {
    EvaluatedTransaction {
        tx_id: tx_id.to_string(),
        status: response.status,
        message: response.message.clone(),
        parsed_data: parse_payload(&response.payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_json_array_payload() {
        let payload = br#"[{"ID":"asset1"},{"ID":"asset2"}]"#;
        match parse_payload(payload) {
            ParsedPayload::Json(serde_json::Value::Array(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected a json array, got {other:?}"),
        }
    }

    #[test]
    fn decodes_plain_text_payload() {
        match parse_payload(b"Function NonExistentFunction not found") {
            ParsedPayload::Text(text) => assert_eq!(text, "Function NonExistentFunction not found"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn decodes_non_utf8_payload_as_hex() {
        match parse_payload(&[0xff, 0xfe, 0x00, 0x80]) {
            ParsedPayload::Binary(rendered) => assert_eq!(rendered, "(binary) 0xfffe0080"),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn reparsing_a_json_value_is_idempotent() {
        let payload = json!({"ID": "asset1", "Size": 10}).to_string();
        let first = parse_payload(payload.as_bytes());
        let second = reparse(&first);
        assert_eq!(first, second);
    }

    #[test]
    fn reparsing_plain_text_is_idempotent() {
        let first = parse_payload(b"not json at all");
        let second = reparse(&first);
        assert_eq!(first, second);
    }
}
