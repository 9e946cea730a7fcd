//! The runtime: process-level setup and the factory for isolates.
//!
//! Most hosts use the lazily initialized [`Runtime::global`]. Hosts that need
//! to control the data directory, or tests that want an isolated runtime,
//! construct one with [`Runtime::new`].

use crate::config::{IsolateConfig, PlatformConfig};
use crate::error::{EmbedError, EmbedResult};
use crate::isolate::{Isolate, IsolateShared};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once, OnceLock, Weak};
use tracing::{error, info};

static PLATFORM: Once = Once::new();
static GLOBAL: OnceLock<Runtime> = OnceLock::new();

/// Factory for isolates, holding the resolved platform configuration.
pub struct Runtime {
    data_dir: Option<PathBuf>,
    prelude: Option<Arc<str>>,
    isolates: Mutex<Vec<Weak<IsolateShared>>>,
    shut_down: AtomicBool,
}

impl Runtime {
    /// Initialize a runtime from `config`.
    ///
    /// Fails with [`EmbedError::DataPath`] when an explicitly configured data
    /// directory is missing or its prelude cannot be read.
    pub fn new(config: PlatformConfig) -> EmbedResult<Self> {
        PLATFORM.call_once(|| info!(engine = "quickjs", "script platform initialized"));

        let data_dir = config.resolve_data_dir()?;
        let prelude = PlatformConfig::load_prelude(data_dir.as_deref())?.map(Arc::<str>::from);
        info!(data_dir = ?data_dir, prelude = prelude.is_some(), "runtime initialized");

        Ok(Self {
            data_dir,
            prelude,
            isolates: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Initialize the process-wide runtime from `config`.
    ///
    /// Only the first successful call configures the runtime; later calls
    /// (and [`Runtime::global`]) return the same instance.
    pub fn initialize(config: PlatformConfig) -> EmbedResult<&'static Runtime> {
        if let Some(runtime) = GLOBAL.get() {
            return Ok(runtime);
        }
        let runtime = Runtime::new(config)?;
        Ok(GLOBAL.get_or_init(|| runtime))
    }

    /// The process-wide runtime, initialized from the environment on first
    /// use.
    ///
    /// # Panics
    ///
    /// Panics if the data directory named by
    /// [`PlatformConfig::DATA_DIR_ENV`] is unusable. Use
    /// [`Runtime::initialize`] to handle that case.
    pub fn global() -> &'static Runtime {
        GLOBAL.get_or_init(|| match Runtime::new(PlatformConfig::from_env()) {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "runtime initialization failed");
                panic!("cannot initialize script runtime: {e}");
            }
        })
    }

    /// Resolved data directory, if any.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Whether new contexts run a prelude script.
    pub fn has_prelude(&self) -> bool {
        self.prelude.is_some()
    }

    /// Create an isolate with default limits.
    pub fn create_isolate(&self) -> EmbedResult<Isolate> {
        self.create_isolate_with(&IsolateConfig::default())
    }

    /// Create an isolate with the given limits.
    pub fn create_isolate_with(&self, config: &IsolateConfig) -> EmbedResult<Isolate> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(EmbedError::PlatformShutdown);
        }
        let isolate = Isolate::new(config, self.prelude.clone())?;
        let mut isolates = self.isolates.lock();
        isolates.retain(|weak| weak.upgrade().is_some_and(|shared| !shared.is_disposed()));
        isolates.push(Arc::downgrade(isolate.shared()));
        Ok(isolate)
    }

    /// Number of isolates created by this runtime and not yet disposed.
    pub fn live_isolates(&self) -> usize {
        self.isolates
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|shared| !shared.is_disposed())
            .count()
    }

    /// Whether [`Runtime::shutdown`] has succeeded.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Refuse further isolate creation.
    ///
    /// Every isolate must be disposed first; otherwise this fails with
    /// [`EmbedError::IsolatesAlive`] and the runtime stays usable.
    pub fn shutdown(&self) -> EmbedResult<()> {
        let alive = self.live_isolates();
        if alive > 0 {
            return Err(EmbedError::IsolatesAlive(alive));
        }
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            info!("runtime shut down");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("data_dir", &self.data_dir)
            .field("prelude", &self.prelude.is_some())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
