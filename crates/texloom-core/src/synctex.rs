//! Position resolution through the `synctex` command line tool.

use crate::config::{Config, ToolCommand};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// One `Key:value` block of synctex output. Values are kept as text; the
/// position mapper decides what is a valid number.
pub type SyncRecord = BTreeMap<String, String>;

/// Parses `Key:value` lines. The first occurrence of a key wins, since
/// synctex lists its best match first.
pub fn parse_record(stdout: &str) -> SyncRecord {
    let mut record = SyncRecord::new();
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        record
            .entry(key.to_string())
            .or_insert_with(|| value.trim().to_string());
    }
    record
}

/// Bidirectional coordinate translation between source and compiled output.
///
/// Rows and columns are 1-based, as synctex counts them. Paths are relative to
/// the project directory.
#[async_trait]
pub trait SyncService: Send + Sync {
    async fn tex_to_pdf(
        &self,
        project_id: &str,
        tex_path: &Path,
        pdf_path: &Path,
        line: u32,
        column: u32,
    ) -> Result<SyncRecord>;

    async fn pdf_to_tex(
        &self,
        project_id: &str,
        pdf_path: &Path,
        page: u32,
        x: f64,
        y: f64,
    ) -> Result<SyncRecord>;
}

/// [`SyncService`] that shells out to `synctex` in the project directory.
#[derive(Debug, Clone)]
pub struct SynctexCli {
    tool: ToolCommand,
    config: Config,
}

impl SynctexCli {
    pub fn new(config: Config) -> Self {
        Self {
            tool: config.synctex.clone(),
            config,
        }
    }

    async fn query(&self, project_id: &str, args: &[String]) -> Result<SyncRecord> {
        let program = which::which(&self.tool.program)
            .with_context(|| format!("Failed to find {}", self.tool.program))?;
        let dir: PathBuf = self.config.project_dir(project_id);
        log::debug!(
            "Running '{}' in {:?}",
            self.tool.display_with(&args.iter().map(String::as_str).collect::<Vec<_>>()),
            dir
        );

        let output = Command::new(program)
            .args(&self.tool.args)
            .args(args)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.tool.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("synctex failed ({}): {}", output.status, stderr.trim());
        }
        Ok(parse_record(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl SyncService for SynctexCli {
    async fn tex_to_pdf(
        &self,
        project_id: &str,
        tex_path: &Path,
        pdf_path: &Path,
        line: u32,
        column: u32,
    ) -> Result<SyncRecord> {
        let args = vec![
            "view".to_string(),
            "-i".to_string(),
            format!("{}:{}:{}", line, column, tex_path.display()),
            "-o".to_string(),
            pdf_path.display().to_string(),
        ];
        self.query(project_id, &args).await
    }

    async fn pdf_to_tex(
        &self,
        project_id: &str,
        pdf_path: &Path,
        page: u32,
        x: f64,
        y: f64,
    ) -> Result<SyncRecord> {
        let args = vec![
            "edit".to_string(),
            "-o".to_string(),
            format!("{}:{}:{}:{}", page, x, y, pdf_path.display()),
        ];
        self.query(project_id, &args).await
    }
}
