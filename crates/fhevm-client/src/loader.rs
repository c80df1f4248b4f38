//! Backend selection and bootstrap

use async_trait::async_trait;
use fhevm_core::{
    BackendKind, FhevmConfig, MetadataSource, MockInstanceFactory, MockInstanceParams,
    RelayerConfig, RelayerModule, SharedInstance, WalletProvider,
};
use fhevm_mock::MockFhevm;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{FhevmError, Result};
use crate::metadata::RpcMetadataSource;
use crate::metrics;
use crate::relayer::RelayerRuntime;

/// Parameters of one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTarget {
    pub provider: WalletProvider,
    /// `None` while the wallet has not reported its chain yet
    pub chain_id: Option<u64>,
}

/// Backend chosen for a load, decided once from the chain id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendPlan {
    Mock { rpc_url: String, chain_id: u64 },
    Relayer,
}

impl BackendPlan {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendPlan::Mock { .. } => BackendKind::Mock,
            BackendPlan::Relayer => BackendKind::Relayer,
        }
    }
}

/// Produces instances for the lifecycle manager
#[async_trait]
pub trait InstanceLoader: Send + Sync {
    async fn load(&self, target: &LoadTarget) -> Result<SharedInstance>;
}

/// Loader that bootstraps either the local deterministic backend or the
/// remote production module
pub struct BackendLoader {
    mock_chains: BTreeMap<u64, String>,
    metadata: Arc<dyn MetadataSource>,
    mock_factory: Arc<dyn MockInstanceFactory>,
    relayer: Option<Arc<RelayerRuntime>>,
    relayer_config: RelayerConfig,
}

impl BackendLoader {
    /// Loader with the default collaborators: JSON-RPC metadata source,
    /// in-process mock backend and no production module
    pub fn new(config: &FhevmConfig) -> Self {
        Self {
            mock_chains: config.mock_chains.clone(),
            metadata: Arc::new(RpcMetadataSource::new(config.metadata_method.clone())),
            mock_factory: Arc::new(MockFhevm::new()),
            relayer: None,
            relayer_config: config.relayer.clone(),
        }
    }

    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = source;
        self
    }

    pub fn with_mock_factory(mut self, factory: Arc<dyn MockInstanceFactory>) -> Self {
        self.mock_factory = factory;
        self
    }

    pub fn with_relayer(mut self, runtime: Arc<RelayerRuntime>) -> Self {
        self.relayer = Some(runtime);
        self
    }

    /// Install a production module through its process-wide runtime, so
    /// loaders sharing a module also share its initialization
    pub fn with_relayer_module(self, module: Arc<dyn RelayerModule>) -> Self {
        self.with_relayer(RelayerRuntime::shared(module))
    }

    /// Choose the backend for `chain_id`
    pub fn plan(&self, chain_id: Option<u64>) -> BackendPlan {
        match chain_id.and_then(|id| self.mock_chains.get(&id).map(|url| (id, url))) {
            Some((chain_id, rpc_url)) => BackendPlan::Mock {
                rpc_url: rpc_url.clone(),
                chain_id,
            },
            None => BackendPlan::Relayer,
        }
    }

    async fn load_mock(&self, rpc_url: String, chain_id: u64) -> Result<SharedInstance> {
        let metadata = self.metadata.fetch_metadata(&rpc_url).await.ok_or_else(|| {
            FhevmError::BackendUnavailable(format!("no backend metadata at {}", rpc_url))
        })?;

        let params = MockInstanceParams {
            rpc_url,
            chain_id,
            metadata,
        };
        self.mock_factory
            .create_mock_instance(params)
            .await
            .map_err(|e| FhevmError::BackendUnavailable(e.to_string()))
    }

    async fn load_relayer(&self, provider: &WalletProvider) -> Result<SharedInstance> {
        let runtime = self.relayer.as_ref().ok_or_else(|| {
            FhevmError::SdkLoadFailure("no relayer module installed".into())
        })?;
        Ok(runtime
            .create_instance(&self.relayer_config, provider)
            .await?)
    }
}

#[async_trait]
impl InstanceLoader for BackendLoader {
    async fn load(&self, target: &LoadTarget) -> Result<SharedInstance> {
        let plan = self.plan(target.chain_id);
        let backend = plan.kind().to_string();
        info!(chain_id = ?target.chain_id, backend = %backend, "Loading instance");

        let started = Instant::now();
        let result = match plan {
            BackendPlan::Mock { rpc_url, chain_id } => self.load_mock(rpc_url, chain_id).await,
            BackendPlan::Relayer => self.load_relayer(&target.provider).await,
        };

        match &result {
            Ok(_) => {
                metrics::record_load(&backend, metrics::OUTCOME_OK, started.elapsed());
                info!(backend = %backend, elapsed_ms = started.elapsed().as_millis() as u64, "Instance loaded");
            }
            Err(e) => {
                metrics::record_load(&backend, metrics::OUTCOME_ERROR, started.elapsed());
                warn!(backend = %backend, error = %e, "Instance load failed");
            }
        }
        result
    }
}

impl std::fmt::Debug for BackendLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLoader")
            .field("mock_chains", &self.mock_chains)
            .field("relayer", &self.relayer)
            .field("relayer_chain_id", &self.relayer_config.chain_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use fhevm_core::{BackendMetadata, ModuleError, RelayerConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StaticMetadata {
        metadata: Option<BackendMetadata>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSource for StaticMetadata {
        async fn fetch_metadata(&self, _rpc_url: &str) -> Option<BackendMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.metadata
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        inner: MockFhevm,
        seen: Mutex<Vec<MockInstanceParams>>,
    }

    #[async_trait]
    impl MockInstanceFactory for RecordingFactory {
        async fn create_mock_instance(
            &self,
            params: MockInstanceParams,
        ) -> std::result::Result<SharedInstance, fhevm_core::BackendError> {
            self.seen.lock().unwrap().push(params.clone());
            self.inner.create_mock_instance(params).await
        }
    }

    #[derive(Default)]
    struct CountingModule {
        init: AtomicUsize,
        create: AtomicUsize,
        last_config: Mutex<Option<RelayerConfig>>,
    }

    #[async_trait]
    impl RelayerModule for CountingModule {
        async fn initialize(&self) -> std::result::Result<(), ModuleError> {
            self.init.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create_instance(
            &self,
            config: RelayerConfig,
        ) -> std::result::Result<SharedInstance, ModuleError> {
            self.create.fetch_add(1, Ordering::SeqCst);
            *self.last_config.lock().unwrap() = Some(config);
            Err(ModuleError::Instance("relayer offline".into()))
        }
    }

    fn metadata() -> BackendMetadata {
        BackendMetadata {
            acl_address: Address::with_last_byte(0x0a),
            input_verifier_address: Address::with_last_byte(0x0b),
            kms_verifier_address: Address::with_last_byte(0x0c),
        }
    }

    fn target(chain_id: Option<u64>) -> LoadTarget {
        LoadTarget {
            provider: WalletProvider::new("http://wallet"),
            chain_id,
        }
    }

    #[test]
    fn test_plan() {
        let loader = BackendLoader::new(&FhevmConfig::default());
        assert_eq!(
            loader.plan(Some(31337)),
            BackendPlan::Mock {
                rpc_url: "http://localhost:8545".into(),
                chain_id: 31337
            }
        );
        assert_eq!(loader.plan(Some(11155111)), BackendPlan::Relayer);
        assert_eq!(loader.plan(None), BackendPlan::Relayer);
    }

    #[test]
    fn test_plan_honours_custom_table() {
        let config = FhevmConfig::default().with_mock_chains([(1337, "http://127.0.0.1:7545".to_string())]);
        let loader = BackendLoader::new(&config);
        assert_eq!(loader.plan(Some(31337)), BackendPlan::Relayer);
        assert_eq!(loader.plan(Some(1337)).kind(), BackendKind::Mock);
    }

    #[tokio::test]
    async fn test_local_path_passes_metadata_through() {
        let source = Arc::new(StaticMetadata {
            metadata: Some(metadata()),
            calls: AtomicUsize::new(0),
        });
        let factory = Arc::new(RecordingFactory::default());
        let module = Arc::new(CountingModule::default());
        let loader = BackendLoader::new(&FhevmConfig::default())
            .with_metadata_source(source.clone())
            .with_mock_factory(factory.clone())
            .with_relayer_module(module.clone());

        let instance = loader.load(&target(Some(31337))).await.unwrap();
        assert_eq!(instance.backend(), BackendKind::Mock);

        let seen = factory.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![MockInstanceParams {
                rpc_url: "http://localhost:8545".into(),
                chain_id: 31337,
                metadata: metadata(),
            }]
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(module.init.load(Ordering::SeqCst), 0);
        assert_eq!(module.create.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_metadata_is_backend_unavailable() {
        let source = Arc::new(StaticMetadata {
            metadata: None,
            calls: AtomicUsize::new(0),
        });
        let factory = Arc::new(RecordingFactory::default());
        let loader = BackendLoader::new(&FhevmConfig::default())
            .with_metadata_source(source)
            .with_mock_factory(factory.clone());

        let err = loader.load(&target(Some(31337))).await.unwrap_err();
        assert!(matches!(err, FhevmError::BackendUnavailable(_)));
        assert!(factory.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loaders_share_module_initialization() {
        let module = Arc::new(CountingModule::default());
        let first = BackendLoader::new(&FhevmConfig::default()).with_relayer_module(module.clone());
        let second = BackendLoader::new(&FhevmConfig::default()).with_relayer_module(module.clone());

        let _ = first.load(&target(Some(11155111))).await;
        let _ = second.load(&target(Some(11155111))).await;
        assert_eq!(module.init.load(Ordering::SeqCst), 1);
        assert_eq!(module.create.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_configured_relayer_reaches_module() {
        let mut relayer = RelayerConfig::sepolia();
        relayer.relayer_url = "https://relayer.internal.test".into();
        let config = FhevmConfig::default().with_relayer(relayer.clone());
        let module = Arc::new(CountingModule::default());
        let loader = BackendLoader::new(&config).with_relayer_module(module.clone());

        let _ = loader.load(&target(Some(11155111))).await;
        let seen = module.last_config.lock().unwrap().clone().unwrap();
        assert_eq!(seen, relayer.with_network(WalletProvider::new("http://wallet")));
    }

    #[tokio::test]
    async fn test_production_path_skips_metadata() {
        let source = Arc::new(StaticMetadata {
            metadata: Some(metadata()),
            calls: AtomicUsize::new(0),
        });
        let module = Arc::new(CountingModule::default());
        let loader = BackendLoader::new(&FhevmConfig::default())
            .with_metadata_source(source.clone())
            .with_relayer_module(module.clone());

        let err = loader.load(&target(Some(11155111))).await.unwrap_err();
        assert!(matches!(err, FhevmError::SdkLoadFailure(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(module.init.load(Ordering::SeqCst), 1);
        assert_eq!(module.create.load(Ordering::SeqCst), 1);

        // a second load reuses the initialized module
        let _ = loader.load(&target(Some(11155111))).await;
        assert_eq!(module.init.load(Ordering::SeqCst), 1);
        assert_eq!(module.create.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_production_without_module() {
        let loader = BackendLoader::new(&FhevmConfig::default());
        let err = loader.load(&target(Some(11155111))).await.unwrap_err();
        assert_eq!(
            err,
            FhevmError::SdkLoadFailure("no relayer module installed".into())
        );
    }
}
