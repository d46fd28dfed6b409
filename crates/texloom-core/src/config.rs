use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use texloom_log::text::DEFAULT_WRAP_WIDTH;
use texloom_log::ParseOptions;

/// An external program and the arguments that precede the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Human-readable command line, for logs.
    pub fn display_with(&self, tail: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(tail.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Settings shared by the process-backed collaborators and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Holds one directory per project id.
    pub projects_dir: PathBuf,
    pub latexmk: ToolCommand,
    pub bibtex: ToolCommand,
    pub sagetex: ToolCommand,
    pub clean: ToolCommand,
    pub synctex: ToolCommand,
    /// Suffixes appended to the document base name and removed on clean.
    pub clean_extensions: Vec<String>,
    pub ignore_duplicates: bool,
    pub wrap_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from("."),
            latexmk: ToolCommand::new(
                "latexmk",
                &[
                    "-pdf",
                    "-f",
                    "-g",
                    "-bibtex",
                    "-synctex=1",
                    "-interaction=nonstopmode",
                ],
            ),
            bibtex: ToolCommand::new("bibtex", &[]),
            sagetex: ToolCommand::new("sage", &[]),
            clean: ToolCommand::new("latexmk", &["-f", "-c"]),
            synctex: ToolCommand::new("synctex", &[]),
            clean_extensions: [
                ".synctex.gz",
                ".fdb_latexmk",
                ".fls",
                ".bbl",
                ".blg",
                ".pdfsync",
                ".sagetex.sage",
                ".sagetex.py",
                ".sagetex.scmd",
                ".sagetex.sout",
                "-concordance.tex",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignore_duplicates: true,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl Config {
    /// Environment variable naming an explicit config file.
    pub const ENV_VAR: &'static str = "TEXLOOM_CONFIG";

    /// `$TEXLOOM_CONFIG`, else `<config_dir>/texloom/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(Self::ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("texloom").join("config.json"))
    }

    /// Loads the default config file, falling back to defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => match Self::load_from_path(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring config {:?}: {:#}", path, e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            ignore_duplicates: self.ignore_duplicates,
            wrap_width: self.wrap_width,
        }
    }

    /// Directory of `project_id`; `.` or an empty id means `projects_dir`.
    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        if project_id.is_empty() || project_id == "." {
            self.projects_dir.clone()
        } else {
            self.projects_dir.join(project_id)
        }
    }
}
