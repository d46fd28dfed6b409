use crate::error::BuildError;
use crate::store::ToolKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A build action as requested by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildAction {
    /// Same as `Latex`; latexmk decides what needs rerunning.
    Recompile,
    Latex,
    Bibtex,
    Sagetex,
    Clean,
}

impl BuildAction {
    pub const ALL: [BuildAction; 5] = [
        BuildAction::Recompile,
        BuildAction::Latex,
        BuildAction::Bibtex,
        BuildAction::Sagetex,
        BuildAction::Clean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildAction::Recompile => "recompile",
            BuildAction::Latex => "latex",
            BuildAction::Bibtex => "bibtex",
            BuildAction::Sagetex => "sagetex",
            BuildAction::Clean => "clean",
        }
    }

    /// The store entry this action writes.
    pub fn tool_key(&self) -> ToolKey {
        match self {
            BuildAction::Recompile | BuildAction::Latex => ToolKey::Latex,
            BuildAction::Bibtex => ToolKey::Bibtex,
            BuildAction::Sagetex => ToolKey::Sagetex,
            BuildAction::Clean => ToolKey::Clean,
        }
    }
}

impl FromStr for BuildAction {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| BuildError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
