use serde::{Deserialize, Serialize};

/// Which group of a [`ProcessedLog`] a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    /// Informational layout messages (bad boxes, font substitutions).
    Typesetting,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Typesetting => "typesetting",
        }
    }
}

/// One error, warning or typesetting message extracted from a build log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// Continuation lines attached to the marker line, newline separated.
    pub content: String,
    /// 1-based source line, when the log names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Every log line the diagnostic was built from, after unwrapping.
    pub raw: String,
}

impl Diagnostic {
    /// The triple used for duplicate suppression.
    pub fn identity(&self) -> (&str, Option<&str>, Option<u32>) {
        (self.message.as_str(), self.file.as_deref(), self.line)
    }
}

/// Structured parse of one compiler run.
///
/// Each group keeps the order in which its diagnostics appear in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedLog {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub typesetting: Vec<Diagnostic>,
}

impl ProcessedLog {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.typesetting.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.typesetting.len()
    }

    pub fn group(&self, level: Level) -> &[Diagnostic] {
        match level {
            Level::Error => &self.errors,
            Level::Warning => &self.warnings,
            Level::Typesetting => &self.typesetting,
        }
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Error => self.errors.push(diagnostic),
            Level::Warning => self.warnings.push(diagnostic),
            Level::Typesetting => self.typesetting.push(diagnostic),
        }
    }
}
