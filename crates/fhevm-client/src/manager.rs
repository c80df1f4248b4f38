//! Instance lifecycle: idle -> loading -> ready | error
//!
//! Every transition into loading bumps a generation counter. A load result
//! is committed only if its generation is still current, so a superseded
//! load can never overwrite the state reached by a newer one, whichever of
//! the two resolves first. The superseded network call itself keeps running;
//! only its result is dropped.

use fhevm_core::{SharedInstance, WalletProvider};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{FhevmError, Result};
use crate::loader::{InstanceLoader, LoadTarget};
use crate::metrics;

/// Coarse lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FhevmStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for FhevmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhevmStatus::Idle => write!(f, "idle"),
            FhevmStatus::Loading => write!(f, "loading"),
            FhevmStatus::Ready => write!(f, "ready"),
            FhevmStatus::Error => write!(f, "error"),
        }
    }
}

/// Lifecycle state; the instance exists only in `Ready`, the error only in `Error`
#[derive(Debug, Clone)]
pub enum LifecycleState {
    Idle,
    Loading,
    Ready(SharedInstance),
    Error(FhevmError),
}

impl LifecycleState {
    pub fn status(&self) -> FhevmStatus {
        match self {
            LifecycleState::Idle => FhevmStatus::Idle,
            LifecycleState::Loading => FhevmStatus::Loading,
            LifecycleState::Ready(_) => FhevmStatus::Ready,
            LifecycleState::Error(_) => FhevmStatus::Error,
        }
    }

    pub fn instance(&self) -> Option<&SharedInstance> {
        match self {
            LifecycleState::Ready(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FhevmError> {
        match self {
            LifecycleState::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// State plus the generation that produced it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: LifecycleState,
    pub generation: u64,
}

impl Snapshot {
    pub fn status(&self) -> FhevmStatus {
        self.state.status()
    }

    pub fn instance(&self) -> Option<&SharedInstance> {
        self.state.instance()
    }

    pub fn error(&self) -> Option<&FhevmError> {
        self.state.error()
    }
}

#[derive(Debug)]
struct Params {
    provider: Option<WalletProvider>,
    chain_id: Option<u64>,
    enabled: bool,
}

struct Inner {
    loader: Arc<dyn InstanceLoader>,
    params: Mutex<Params>,
    state: watch::Sender<Snapshot>,
}

impl Inner {
    fn params(&self) -> MutexGuard<'_, Params> {
        self.params.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a load result if `generation` is still current
    fn commit(&self, generation: u64, result: Result<SharedInstance>) {
        let outcome = match &result {
            Ok(_) => FhevmStatus::Ready,
            Err(_) => FhevmStatus::Error,
        };
        let applied = self.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            snap.state = match result {
                Ok(instance) => LifecycleState::Ready(instance),
                Err(err) => LifecycleState::Error(err),
            };
            true
        });

        if applied {
            info!(generation, status = %outcome, "Lifecycle settled");
        } else {
            metrics::record_stale_load();
            debug!(generation, status = %outcome, "Discarding stale load result");
        }
    }
}

/// Owner of the computation instance
///
/// Cheap to clone; clones share state. Parameter setters and
/// [`refresh`](Self::refresh) never block: they reset the state and, when
/// enabled with a provider, spawn the load on the current Tokio runtime.
/// Setters must therefore be called from within a runtime.
#[derive(Clone)]
pub struct FhevmManager {
    inner: Arc<Inner>,
}

impl FhevmManager {
    /// Idle manager, enabled, with no provider yet
    pub fn new(loader: Arc<dyn InstanceLoader>) -> Self {
        let (state, _) = watch::channel(Snapshot {
            state: LifecycleState::Idle,
            generation: 0,
        });
        Self {
            inner: Arc::new(Inner {
                loader,
                params: Mutex::new(Params {
                    provider: None,
                    chain_id: None,
                    enabled: true,
                }),
                state,
            }),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> FhevmStatus {
        self.inner.state.borrow().status()
    }

    pub fn instance(&self) -> Option<SharedInstance> {
        self.inner.state.borrow().instance().cloned()
    }

    pub fn error(&self) -> Option<FhevmError> {
        self.inner.state.borrow().error().cloned()
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// Receiver notified on every committed transition
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    pub fn set_provider(&self, provider: Option<WalletProvider>) {
        let mut params = self.inner.params();
        if params.provider == provider {
            return;
        }
        params.provider = provider;
        self.restart(&params, "provider changed");
    }

    pub fn set_chain_id(&self, chain_id: Option<u64>) {
        let mut params = self.inner.params();
        if params.chain_id == chain_id {
            return;
        }
        params.chain_id = chain_id;
        self.restart(&params, "chain changed");
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut params = self.inner.params();
        if params.enabled == enabled {
            return;
        }
        params.enabled = enabled;
        self.restart(&params, "enabled changed");
    }

    /// Drop the current instance and load again
    pub fn refresh(&self) {
        let params = self.inner.params();
        self.restart(&params, "refresh");
    }

    /// Wait until the current load settles
    ///
    /// Fails with [`FhevmError::InstanceNotReady`] when the manager is idle
    /// and cannot load (disabled or no provider).
    pub async fn wait_ready(&self) -> Result<SharedInstance> {
        let mut rx = self.subscribe();
        let snap = rx
            .wait_for(|s| !matches!(s.state, LifecycleState::Loading))
            .await
            .map_err(|_| FhevmError::InstanceNotReady)?
            .clone();

        match snap.state {
            LifecycleState::Ready(instance) => Ok(instance),
            LifecycleState::Error(err) => Err(err),
            _ => Err(FhevmError::InstanceNotReady),
        }
    }

    /// Ready instance and the generation it belongs to
    pub(crate) fn ready_instance(&self) -> Result<(u64, SharedInstance)> {
        let snap = self.inner.state.borrow();
        match snap.instance() {
            Some(instance) => Ok((snap.generation, instance.clone())),
            None => Err(FhevmError::InstanceNotReady),
        }
    }

    /// True while `generation` is current and ready
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let snap = self.inner.state.borrow();
        snap.generation == generation && snap.instance().is_some()
    }

    /// Invalidate the current state and start a new generation.
    ///
    /// The return to idle and the entry into loading are published as one
    /// update, so subscribers never observe `Idle` between them: they see
    /// `Loading` with the next generation and no instance. `Idle` is only
    /// published when no load follows (disabled or no provider).
    ///
    /// Runs under the params lock so generation bumps are serialized.
    fn restart(&self, params: &Params, reason: &str) {
        let provider = params.provider.clone().filter(|_| params.enabled);
        let will_load = provider.is_some();

        let mut generation = 0;
        self.inner.state.send_modify(|snap| {
            snap.generation += 1;
            snap.state = if will_load {
                LifecycleState::Loading
            } else {
                LifecycleState::Idle
            };
            generation = snap.generation;
        });

        let Some(provider) = provider else {
            info!(generation, reason, "Lifecycle idle");
            return;
        };

        info!(generation, reason, chain_id = ?params.chain_id, "Lifecycle idle -> loading");
        let target = LoadTarget {
            provider,
            chain_id: params.chain_id,
        };
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let result = inner.loader.load(&target).await;
            if let Err(e) = &result {
                warn!(generation, error = %e, "Load failed");
            }
            inner.commit(generation, result);
        });
    }
}

impl fmt::Debug for FhevmManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("FhevmManager")
            .field("status", &snap.status())
            .field("generation", &snap.generation)
            .finish_non_exhaustive()
    }
}
