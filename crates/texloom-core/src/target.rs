use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (project, document) pair every tool run and cache entry is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildTarget {
    project_id: String,
    /// Document path, relative to the project directory.
    path: PathBuf,
}

impl BuildTarget {
    pub fn new(project_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            project_id: project_id.into(),
            path: path.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The compiled output: the document path with a `.pdf` extension.
    pub fn pdf_path(&self) -> PathBuf {
        self.path.with_extension("pdf")
    }

    /// Directory containing the document, relative to the project.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name without extension, as passed to bibtex and friends.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    pub fn cache_key(&self, version: u64) -> CacheKey {
        CacheKey {
            project_id: self.project_id.clone(),
            pdf_path: self.pdf_path(),
            version,
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.path.display())
    }
}

/// Key of a cached rendered document: target plus a reload version token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub project_id: String,
    pub pdf_path: PathBuf,
    pub version: u64,
}

impl CacheKey {
    pub fn belongs_to(&self, target: &BuildTarget) -> bool {
        self.project_id == target.project_id && self.pdf_path == target.pdf_path()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/raw/{}?param={}",
            self.project_id,
            self.pdf_path.display(),
            self.version
        )
    }
}
