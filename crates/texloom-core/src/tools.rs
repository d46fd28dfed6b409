use crate::target::{BuildTarget, Timestamp};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Captured result of one tool run.
///
/// A nonzero `exit_code` is an ordinary failed build, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// The typesetting toolchain, as seen by the orchestrator.
///
/// Implementations return `Err` only when a tool could not be launched or
/// waited on (missing binary, unreadable directory). Timeouts, if any, are the
/// implementation's business. The timestamp is advisory metadata and never
/// decides whether a tool runs.
#[async_trait]
pub trait BuildTools: Send + Sync {
    async fn latexmk(&self, target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput>;

    async fn bibtex(&self, target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput>;

    async fn sagetex(&self, target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput>;

    /// Removes auxiliary files, reporting progress one line at a time.
    async fn clean(
        &self,
        target: &BuildTarget,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<()>;
}
