// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Low-S normalization and minimal ASN.1 DER encoding of ECDSA-P256
//! signatures.
//!
//! Only one big-integer operation is needed here: comparing `S` against
//! `N/2` and, if necessary, computing `N - S` over the fixed 256-bit P-256
//! group order. A general big-integer dependency would be overkill for
//! that, so the comparison and subtraction are written out by hand below.

/// The P-256 group order, big-endian.
const ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

/// `floor(ORDER / 2)`, big-endian.
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0x80, 0x00, 0x00, 0x00, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xde, 0x73, 0x7d, 0x56, 0xd3, 0x8b, 0xcf, 0x42, 0x79, 0xdc, 0xe5, 0x61, 0x7e, 0x31, 0x92, 0xa8,
];

fn is_greater(a: &[u8; 32], b: &[u8; 32]) -> bool {
    for i in 0..32 {
        if a[i] != b[i] {
            return a[i] > b[i];
        }
    }
    false
}

/// `ORDER - s`, assuming `s < ORDER` (always true for a valid signature).
fn subtract_from_order(s: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow: i16 = 0;
    for i in (0..32).rev() {
        let diff = ORDER[i] as i16 - s[i] as i16 - borrow;
        if diff < 0 {
            out[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            out[i] = diff as u8;
            borrow = 0;
        }
    }
    out
}

/// Normalize `s` to the lower half of the group order: if `s > N/2`, replace
/// it with `N - s`.
pub fn normalize_low_s(s: &[u8; 32]) -> [u8; 32] {
    if is_greater(s, &HALF_ORDER) {
        subtract_from_order(s)
    } else {
        *s
    }
}

/// Minimal ASN.1 DER `INTEGER` encoding of a 32-byte big-endian value: strip
/// leading zero bytes while the next byte's high bit is clear, then prepend
/// a single `0x00` if the remaining leading byte's high bit is set.
fn encode_integer(bytes: &[u8; 32]) -> Vec<u8> {
    let mut start = 0;
    while start < 31 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
        start += 1;
    }
    let trimmed = &bytes[start..];

    let mut content = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        content.push(0x00);
    }
    content.extend_from_slice(trimmed);

    let mut out = Vec::with_capacity(content.len() + 2);
    out.push(0x02);
    out.push(content.len() as u8);
    out.extend_from_slice(&content);
    out
}

/// Normalize and DER-encode a raw 64-byte `(R || S)` ECDSA-P256 signature
/// into `SEQUENCE { INTEGER r, INTEGER s }`. This is the only accepted
/// signature encoding anywhere in this crate's callers.
pub fn sign_and_encode(raw_signature: &[u8; 64]) -> Vec<u8> {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&raw_signature[..32]);
    s.copy_from_slice(&raw_signature[32..]);

    let s = normalize_low_s(&s);

    let r_der = encode_integer(&r);
    let s_der = encode_integer(&s);

    let mut body = Vec::with_capacity(r_der.len() + s_der.len());
    body.extend_from_slice(&r_der);
    body.extend_from_slice(&s_der);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(0x30);
    out.push(body.len() as u8);
    out.extend_from_slice(&body);
    out
}
