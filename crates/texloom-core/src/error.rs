use thiserror::Error;

/// Failures surfaced by build actions and position lookups.
///
/// Every variant is reported to the status channel's error banner before it
/// is returned, so callers are free to drop it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// An external tool could not be started, crashed, or the service
    /// behind it failed. The message is the tool's own, verbatim.
    #[error("{0}")]
    ToolLaunch(String),

    /// The position-resolution service answered with something that is not
    /// a position.
    #[error("invalid synctex output ({0})")]
    InvalidResponse(String),

    /// The compile ran but produced no usable output.
    #[error("{0}")]
    FatalCompile(String),

    #[error("unknown build action '{0}'")]
    UnknownAction(String),

    /// The surrounding UI broke a precondition; always a bug.
    #[error("BUG -- {0}")]
    InvariantViolation(String),
}

impl BuildError {
    /// Wraps a collaborator failure, keeping its whole context chain.
    pub fn tool(err: anyhow::Error) -> Self {
        BuildError::ToolLaunch(format!("{err:#}"))
    }
}
