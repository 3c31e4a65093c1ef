// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client-facing configuration for [`crate::client::GatewayClient`].

use std::sync::Arc;

use crate::transport::{DeliverTransport, Transport};

/// A factory producing test-double transports in place of the real
/// gRPC-Web / WebSocket adapters. Supplied only by tests and embedding
/// applications that want to bypass the network.
pub type TransportOverride = Arc<dyn Fn() -> Arc<dyn Transport> + Send + Sync>;

/// A factory producing test-double deliver transports, analogous to
/// [`TransportOverride`] but for the block-event WebSocket path.
pub type DeliverTransportOverride = Arc<dyn Fn() -> Arc<dyn DeliverTransport> + Send + Sync>;

/// Connection and override settings recognized by the gateway client.
#[derive(Clone)]
pub struct GatewayConfig {
    /// The gRPC-Web gateway endpoint. Required.
    pub gateway_url: String,
    /// The WebSocket endpoint proxying the peer's deliver-filtered
    /// service. Required only if block-event subscription is used.
    pub ws_url: Option<String>,
    /// PEM-encoded CA certificate pinning the gateway's TLS chain.
    pub tls_ca_cert: Option<String>,
    /// Test-double factory for the RPC transport.
    pub transport_override: Option<TransportOverride>,
    /// Test-double factory for the deliver-stream transport.
    pub deliver_transport_override: Option<DeliverTransportOverride>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("gateway_url", &self.gateway_url)
            .field("ws_url", &self.ws_url)
            .field("tls_ca_cert", &self.tls_ca_cert.as_ref().map(|_| "<redacted>"))
            .field("transport_override", &self.transport_override.as_ref().map(|_| "<fn>"))
            .field("deliver_transport_override", &self.deliver_transport_override.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl GatewayConfig {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            ws_url: None,
            tls_ca_cert: None,
            transport_override: None,
            deliver_transport_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_tls_ca_cert_in_debug_output() {
        let mut config = GatewayConfig::new("https://gateway.example.com:7053");
        config.tls_ca_cert = Some("-----BEGIN CERTIFICATE-----\nsecret\n-----END CERTIFICATE-----".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }
}
