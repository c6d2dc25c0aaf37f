//! Clap-free settings for the orchestrator and its adapters.

use camino::Utf8PathBuf;
use linepatch_types::task_schema::DEFAULT_TASK_SCHEMA_PATH;

pub const DEFAULT_ORCHESTRATOR_URL: &str = "http://localhost:8787";
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TYPECHECK_TIMEOUT_SECS: u64 = 30;
/// Per-stream cap on captured checker output.
pub const TYPECHECK_OUTPUT_LIMIT: usize = 64 * 1024;

/// Settings for applying a batch.
#[derive(Debug, Clone)]
pub struct ApplySettings {
    /// Every operation path is resolved under this directory.
    pub project_root: Utf8PathBuf,
    /// Compute results and diffs without writing.
    pub dry_run: bool,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    pub enabled: bool,
    /// Base URL; events go to `<url>/api/patches/events`.
    pub url: String,
    pub timeout_secs: u64,
    /// When set, diffs are written here and events carry a path instead of inline text.
    pub diff_dir: Option<Utf8PathBuf>,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_ORCHESTRATOR_URL.to_string(),
            timeout_secs: DEFAULT_NOTIFY_TIMEOUT_SECS,
            diff_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCheckSettings {
    pub enabled: bool,
    /// Program and leading arguments; the file path is appended.
    pub command: Vec<String>,
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for TypeCheckSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: vec!["npx".into(), "tsc".into(), "--noEmit".into()],
            extensions: vec!["ts".into(), "tsx".into()],
            timeout_secs: DEFAULT_TYPECHECK_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSettings {
    /// Relative to the project root.
    pub path: Utf8PathBuf,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            path: Utf8PathBuf::from(DEFAULT_TASK_SCHEMA_PATH),
        }
    }
}
