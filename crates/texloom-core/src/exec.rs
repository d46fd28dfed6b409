//! [`BuildTools`] backed by real processes.

use crate::config::{Config, ToolCommand};
use crate::target::{BuildTarget, Timestamp};
use crate::tools::{BuildTools, ExecOutput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Environment variable carrying the advisory build timestamp to every tool.
pub const BUILD_TIME_ENV: &str = "TEXLOOM_BUILD_TIME";

/// Runs latexmk, bibtex, sage and the cleanup inside the project directory.
#[derive(Debug, Clone)]
pub struct ProcessTools {
    config: Config,
}

impl ProcessTools {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Directory the document lives in, on disk.
    pub fn working_dir(&self, target: &BuildTarget) -> PathBuf {
        self.config
            .project_dir(target.project_id())
            .join(target.directory())
    }

    async fn run(
        &self,
        tool: &ToolCommand,
        file: &str,
        dir: &Path,
        time: Option<Timestamp>,
    ) -> Result<ExecOutput> {
        let program = locate(tool)?;
        log::debug!("Running '{}' in {:?}", tool.display_with(&[file]), dir);

        let mut cmd = Command::new(&program);
        cmd.args(&tool.args)
            .arg(file)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(time) = time {
            cmd.env(BUILD_TIME_ENV, time.to_string());
        }

        let output = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", tool.program))?
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {}", tool.program))?;

        let exit_code = output.status.code().unwrap_or(-1);
        log::info!("{} exited with code {}", tool.program, exit_code);
        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}

fn locate(tool: &ToolCommand) -> Result<PathBuf> {
    which::which(&tool.program).with_context(|| {
        format!(
            "Failed to find {}. Ensure it is installed and in your PATH.",
            tool.program
        )
    })
}

fn file_arg(target: &BuildTarget) -> String {
    target
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Forwards every line of `stream` into `tx`. Bytes that are not UTF-8 are
/// replaced, as in captured output.
fn forward_lines<R>(
    stream: R,
    tx: mpsc::UnboundedSender<String>,
) -> tokio::task::JoinHandle<std::io::Result<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(());
            }
            let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if tx.send(String::from_utf8_lossy(line).into_owned()).is_err() {
                return Ok(());
            }
        }
    })
}

async fn join_reader(
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
    stream: &str,
) -> Result<()> {
    handle
        .await
        .with_context(|| format!("{stream} reader panicked"))?
        .with_context(|| format!("Failed to read {stream}"))
}

#[async_trait]
impl BuildTools for ProcessTools {
    async fn latexmk(&self, target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput> {
        let dir = self.working_dir(target);
        self.run(&self.config.latexmk, &file_arg(target), &dir, time)
            .await
    }

    async fn bibtex(&self, target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput> {
        let dir = self.working_dir(target);
        self.run(&self.config.bibtex, &target.base_name(), &dir, time)
            .await
    }

    async fn sagetex(&self, target: &BuildTarget, time: Option<Timestamp>) -> Result<ExecOutput> {
        let dir = self.working_dir(target);
        let script = format!("{}.sagetex.sage", target.base_name());
        self.run(&self.config.sagetex, &script, &dir, time).await
    }

    async fn clean(
        &self,
        target: &BuildTarget,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<()> {
        let dir = self.working_dir(target);
        let base = target.base_name();
        let tool = &self.config.clean;

        on_line(&format!(
            "Running '{}' in '{}'...",
            tool.display_with(&[base.as_str()]),
            dir.display()
        ));

        let program = locate(tool)?;
        let mut child = Command::new(&program)
            .args(&tool.args)
            .arg(&base)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", tool.program))?;

        let stdout = child.stdout.take().context("Failed to open stdout")?;
        let stderr = child.stderr.take().context("Failed to open stderr")?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stdout_handle = forward_lines(stdout, tx.clone());
        let stderr_handle = forward_lines(stderr, tx);

        // Closes once both readers hit EOF.
        while let Some(line) = rx.recv().await {
            on_line(&line);
        }
        let (out, err) = tokio::join!(
            join_reader(stdout_handle, "stdout"),
            join_reader(stderr_handle, "stderr")
        );
        out?;
        err?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for {}", tool.program))?;
        log::info!("{} exited with {}", tool.program, status);
        if !status.success() {
            on_line(&format!(
                "'{}' exited with {}",
                tool.display_with(&[base.as_str()]),
                status
            ));
        }

        for ext in &self.config.clean_extensions {
            let name = format!("{base}{ext}");
            match tokio::fs::remove_file(dir.join(&name)).await {
                Ok(()) => on_line(&format!("Removing '{name}'")),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    log::warn!("Failed to remove {}: {}", name, e);
                    on_line(&format!("Could not remove '{name}': {e}"));
                }
            }
        }
        on_line("done.");
        Ok(())
    }
}
