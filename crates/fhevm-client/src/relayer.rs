//! Process-wide handle on the remote production module
//!
//! Every module instance gets exactly one runtime per process, so the module
//! is initialized at most once no matter how many loaders use it (the first
//! successful call wins; a failed attempt leaves it uninitialized so a later
//! load may retry). Only [`crate::BackendLoader`] reaches the module, and
//! only through this runtime.

use fhevm_core::{ModuleError, RelayerConfig, RelayerModule, SharedInstance, WalletProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::OnceCell;
use tracing::info;

/// Runtimes keyed by module address; entries keep their module alive so an
/// address is never reused while registered.
static RUNTIMES: OnceLock<Mutex<HashMap<usize, Arc<RelayerRuntime>>>> = OnceLock::new();

pub struct RelayerRuntime {
    module: Arc<dyn RelayerModule>,
    initialized: OnceCell<()>,
}

impl RelayerRuntime {
    /// Runtime private to the caller; prefer [`shared`](Self::shared)
    pub fn new(module: Arc<dyn RelayerModule>) -> Self {
        Self {
            module,
            initialized: OnceCell::new(),
        }
    }

    /// The process-wide runtime for `module`
    pub fn shared(module: Arc<dyn RelayerModule>) -> Arc<Self> {
        let key = Arc::as_ptr(&module) as *const () as usize;
        let mut runtimes = RUNTIMES
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        runtimes
            .entry(key)
            .or_insert_with(|| Arc::new(Self::new(module)))
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Initialize the module if no earlier call has done so
    pub async fn ensure_initialized(&self) -> Result<(), ModuleError> {
        self.initialized
            .get_or_try_init(|| async {
                info!("Initializing relayer module");
                self.module.initialize().await
            })
            .await
            .map(|_| ())
    }

    /// Build a production instance from `base` bound to `network`
    pub async fn create_instance(
        &self,
        base: &RelayerConfig,
        network: &WalletProvider,
    ) -> Result<SharedInstance, ModuleError> {
        self.ensure_initialized().await?;
        let config = self.module.build_config(base, network);
        info!(
            chain_id = config.chain_id,
            relayer = %config.relayer_url,
            "Creating relayer instance"
        );
        self.module.create_instance(config).await
    }
}

impl std::fmt::Debug for RelayerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerRuntime")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
