mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{ConsoleUi, EDITOR};
use notify::{EventKind, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use texloom_core::ui::{ViewId, LATEX_GUTTER};
use texloom_core::{
    BuildTarget, Collaborators, Config, MemoryPdfCache, Orchestrator, ProcessTools, SynctexCli,
    Timestamp,
};

#[derive(Parser)]
#[command(name = "texloom")]
#[command(about = "LaTeX build orchestration and log tools", long_about = None)]
struct Cli {
    /// Directory holding one sub-directory per project (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    projects_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a TeX log file and emit the diagnostics as JSON
    Parse {
        /// Path to the .log file
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Keep repeated (message, file, line) diagnostics
        #[arg(long)]
        keep_duplicates: bool,
    },
    /// Run one build action and print the build logs as JSON
    Build {
        /// Document path, relative to the project
        path: PathBuf,
        #[arg(long, default_value = ".")]
        project: String,
        /// recompile, latex, bibtex, sagetex or clean
        #[arg(long, default_value = "recompile")]
        action: String,
    },
    /// Recompile every time the document is written
    Watch {
        path: PathBuf,
        #[arg(long, default_value = ".")]
        project: String,
    },
    /// Find the PDF position of a source line (forward search)
    Forward {
        path: PathBuf,
        #[arg(long, default_value = ".")]
        project: String,
        /// 1-based source line
        #[arg(long)]
        line: u32,
        /// 1-based source column
        #[arg(long, default_value_t = 1)]
        column: u32,
    },
    /// Find the source line of a PDF position (inverse search)
    Inverse {
        path: PathBuf,
        #[arg(long, default_value = ".")]
        project: String,
        #[arg(long)]
        page: u32,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
}

fn orchestrator(config: &Config, project: &str, path: &Path, ui: Arc<ConsoleUi>) -> Orchestrator {
    let collaborators = Collaborators {
        tools: Arc::new(ProcessTools::new(config.clone())),
        sync: Arc::new(SynctexCli::new(config.clone())),
        cache: Arc::new(MemoryPdfCache::new(config.clone())),
        gutters: ui.clone(),
        status: ui.clone(),
        views: ui,
    };
    Orchestrator::new(
        BuildTarget::new(project, path),
        config.parse_options(),
        collaborators,
    )
}

async fn build(config: &Config, project: &str, path: &Path, action: &str) -> Result<()> {
    let ui = Arc::new(ConsoleUi::new());
    let orch = orchestrator(config, project, path, ui.clone());
    let result = orch.build_action(action).await;

    println!("{}", serde_json::to_string_pretty(&orch.logs().snapshot())?);
    ui.print_gutter(LATEX_GUTTER);
    result?;
    Ok(())
}

async fn watch(config: &Config, project: &str, path: &Path) -> Result<()> {
    let ui = Arc::new(ConsoleUi::new());
    let orch = orchestrator(config, project, path, ui.clone());
    let document = config.project_dir(project).join(path);
    let document = fs::canonicalize(&document)
        .with_context(|| format!("Failed to open {}", document.display()))?;
    let dir = document
        .parent()
        .map(Path::to_path_buf)
        .context("Document has no parent directory")?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )?;
    // Editors often replace the file instead of writing it, so watch the
    // directory and filter by path.
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    log::info!("Watching {}", document.display());

    while let Some(res) = rx.recv().await {
        match res {
            Ok(event) => {
                let written = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event.paths.iter().any(|p| p == &document);
                if !written {
                    continue;
                }
                // A single save usually arrives as several events.
                while rx.try_recv().is_ok() {}
                if orch.on_save_to_disk(Timestamp::now()).await.is_ok() {
                    ui.print_gutter(LATEX_GUTTER);
                }
            }
            Err(e) => log::error!("watch error: {:?}", e),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(dir) = cli.projects_dir {
        config.projects_dir = dir;
    }

    match cli.command {
        Commands::Parse {
            path,
            keep_duplicates,
        } => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut options = config.parse_options();
            if keep_duplicates {
                options.ignore_duplicates = false;
            }
            let log = texloom_log::parse(&content, options);
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        Commands::Build {
            path,
            project,
            action,
        } => build(&config, &project, &path, &action).await?,
        Commands::Watch { path, project } => watch(&config, &project, &path).await?,
        Commands::Forward {
            path,
            project,
            line,
            column,
        } => {
            let ui = Arc::new(ConsoleUi::with_cursor(
                line.saturating_sub(1),
                column.saturating_sub(1),
            ));
            let orch = orchestrator(&config, &project, &path, ui);
            if let Some(position) = orch.forward_search(&ViewId::new(EDITOR)).await? {
                println!("{}", serde_json::to_string_pretty(&position)?);
            }
        }
        Commands::Inverse {
            path,
            project,
            page,
            x,
            y,
        } => {
            let orch = orchestrator(&config, &project, &path, Arc::new(ConsoleUi::new()));
            let position = orch.synctex_pdf_to_tex(page, x, y).await?;
            println!("{}", serde_json::to_string_pretty(&position)?);
        }
    }
    Ok(())
}
