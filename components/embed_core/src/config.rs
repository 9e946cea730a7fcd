//! Platform and isolate configuration.

use crate::error::{EmbedError, EmbedResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide settings consumed when the runtime initializes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Directory holding engine support files.
    ///
    /// When set explicitly (or through [`PlatformConfig::DATA_DIR_ENV`]) the
    /// directory must exist. When unset, [`PlatformConfig::DEFAULT_DATA_DIR`]
    /// is used if present and ignored otherwise.
    pub data_dir: Option<PathBuf>,
}

impl PlatformConfig {
    /// Environment variable naming the data directory.
    pub const DATA_DIR_ENV: &'static str = "JSEMBED_DATA_DIR";

    /// Well-known install location probed when nothing is configured.
    pub const DEFAULT_DATA_DIR: &'static str = "/usr/local/share/jsembed";

    /// Script evaluated in every newly created context, if present in the
    /// data directory.
    pub const PRELUDE_FILE: &'static str = "prelude.js";

    /// Empty configuration: probe the default location only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the data directory from [`PlatformConfig::DATA_DIR_ENV`].
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var_os(Self::DATA_DIR_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Use `dir` as the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Resolve the data directory, validating an explicit one.
    pub(crate) fn resolve_data_dir(&self) -> EmbedResult<Option<PathBuf>> {
        match &self.data_dir {
            Some(dir) => {
                let metadata = std::fs::metadata(dir).map_err(|e| EmbedError::DataPath {
                    path: dir.clone(),
                    reason: e.to_string(),
                })?;
                if !metadata.is_dir() {
                    return Err(EmbedError::DataPath {
                        path: dir.clone(),
                        reason: "not a directory".to_string(),
                    });
                }
                Ok(Some(dir.clone()))
            }
            None => {
                let fallback = Path::new(Self::DEFAULT_DATA_DIR);
                Ok(fallback.is_dir().then(|| fallback.to_path_buf()))
            }
        }
    }

    /// Load the prelude script from a resolved data directory.
    pub(crate) fn load_prelude(data_dir: Option<&Path>) -> EmbedResult<Option<String>> {
        let Some(dir) = data_dir else {
            return Ok(None);
        };
        let path = dir.join(Self::PRELUDE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EmbedError::DataPath {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

/// Per-isolate resource limits.
///
/// Every field is optional; `None` leaves the engine default in place.
///
/// # Examples
///
/// ```
/// use embed_core::IsolateConfig;
/// use std::time::Duration;
///
/// let config = IsolateConfig::new()
///     .with_memory_limit(64 * 1024 * 1024)
///     .with_execution_timeout(Duration::from_millis(250));
/// assert_eq!(config.execution_timeout(), Some(Duration::from_millis(250)));
///
/// let parsed = IsolateConfig::from_json_str(r#"{ "execution_timeout_ms": 250 }"#).unwrap();
/// assert_eq!(parsed.execution_timeout_ms, Some(250));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IsolateConfig {
    /// Heap limit in bytes.
    pub memory_limit: Option<usize>,
    /// Native stack budget for script execution, in bytes.
    pub max_stack_size: Option<usize>,
    /// Allocation volume that triggers a collection, in bytes.
    pub gc_threshold: Option<usize>,
    /// Wall-clock budget for one outermost `evaluate`.
    pub execution_timeout_ms: Option<u64>,
}

impl IsolateConfig {
    /// Configuration with every limit left at the engine default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heap limit.
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Set the native stack budget.
    pub fn with_max_stack_size(mut self, bytes: usize) -> Self {
        self.max_stack_size = Some(bytes);
        self
    }

    /// Set the collection threshold.
    pub fn with_gc_threshold(mut self, bytes: usize) -> Self {
        self.gc_threshold = Some(bytes);
        self
    }

    /// Bound each outermost `evaluate` to `timeout`.
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout_ms = Some(timeout.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    /// The evaluation budget, if any.
    pub fn execution_timeout(&self) -> Option<Duration> {
        self.execution_timeout_ms.map(Duration::from_millis)
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> EmbedResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EmbedResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
