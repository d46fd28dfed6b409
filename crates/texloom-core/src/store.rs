use crate::tools::ExecOutput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use texloom_log::ProcessedLog;
use tokio::sync::watch;

/// Which tool a [`BuildLog`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKey {
    Latex,
    Bibtex,
    Sagetex,
    Clean,
}

impl ToolKey {
    pub const ALL: [ToolKey; 4] = [
        ToolKey::Latex,
        ToolKey::Bibtex,
        ToolKey::Sagetex,
        ToolKey::Clean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKey::Latex => "latex",
            ToolKey::Bibtex => "bibtex",
            ToolKey::Sagetex => "sagetex",
            ToolKey::Clean => "clean",
        }
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one tool run, optionally with its parsed diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLog {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<ProcessedLog>,
}

impl BuildLog {
    /// A log that only has accumulated text, as produced by streamed tools.
    pub fn streamed(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn with_parse(mut self, parse: ProcessedLog) -> Self {
        self.parse = Some(parse);
        self
    }
}

impl From<ExecOutput> for BuildLog {
    fn from(output: ExecOutput) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            parse: None,
        }
    }
}

/// Build logs keyed by tool. Entries are only ever replaced whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildLogStore {
    entries: BTreeMap<ToolKey, BuildLog>,
}

impl BuildLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for `key`; other keys are untouched.
    pub fn set(&mut self, key: ToolKey, log: BuildLog) {
        self.entries.insert(key, log);
    }

    pub fn get(&self, key: ToolKey) -> Option<&BuildLog> {
        self.entries.get(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToolKey, &BuildLog)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

/// Read-only view of the orchestrator's store.
///
/// Each read sees one complete store state; updates land as a single
/// transition.
#[derive(Debug, Clone)]
pub struct LogStoreReader {
    rx: watch::Receiver<BuildLogStore>,
}

impl LogStoreReader {
    pub fn snapshot(&self) -> BuildLogStore {
        self.rx.borrow().clone()
    }

    pub fn get(&self, key: ToolKey) -> Option<BuildLog> {
        self.rx.borrow().get(key).cloned()
    }

    /// Waits for the next update. Returns `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// The single writer of a [`BuildLogStore`].
#[derive(Debug)]
pub(crate) struct LogStoreWriter {
    tx: watch::Sender<BuildLogStore>,
}

impl LogStoreWriter {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(BuildLogStore::new());
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> LogStoreReader {
        LogStoreReader {
            rx: self.tx.subscribe(),
        }
    }

    pub(crate) fn set(&self, key: ToolKey, log: BuildLog) {
        self.tx.send_modify(|store| store.set(key, log));
    }

    pub(crate) fn clear(&self) {
        self.tx.send_modify(BuildLogStore::clear);
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&BuildLogStore) -> R) -> R {
        f(&self.tx.borrow())
    }
}
