//! Side-channel metadata query against a local node

use alloy_rpc_client::ClientBuilder;
use async_trait::async_trait;
use fhevm_core::{BackendMetadata, MetadataSource, DEFAULT_METADATA_METHOD};
use tracing::{debug, warn};

/// Asks a node for backend metadata with a single JSON-RPC call
#[derive(Debug, Clone)]
pub struct RpcMetadataSource {
    method: String,
}

impl RpcMetadataSource {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl Default for RpcMetadataSource {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_METHOD)
    }
}

#[async_trait]
impl MetadataSource for RpcMetadataSource {
    async fn fetch_metadata(&self, rpc_url: &str) -> Option<BackendMetadata> {
        let client = match ClientBuilder::default().connect(rpc_url).await {
            Ok(client) => client,
            Err(e) => {
                warn!(rpc = rpc_url, error = %e, "Metadata endpoint unreachable");
                return None;
            }
        };

        let params: Vec<serde_json::Value> = Vec::new();
        let result: Result<Option<BackendMetadata>, _> =
            client.request(self.method.clone(), params).await;

        match result {
            Ok(Some(metadata)) => {
                debug!(
                    rpc = rpc_url,
                    acl = %metadata.acl_address,
                    input_verifier = %metadata.input_verifier_address,
                    kms_verifier = %metadata.kms_verifier_address,
                    "Fetched backend metadata"
                );
                Some(metadata)
            }
            Ok(None) => {
                warn!(rpc = rpc_url, method = %self.method, "Node returned no backend metadata");
                None
            }
            Err(e) => {
                warn!(rpc = rpc_url, method = %self.method, error = %e, "Metadata query failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_method() {
        assert_eq!(RpcMetadataSource::default().method(), "fhevm_relayer_metadata");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_none() {
        let source = RpcMetadataSource::default();
        assert!(source.fetch_metadata("http://127.0.0.1:1").await.is_none());
    }
}
