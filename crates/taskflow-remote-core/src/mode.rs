//! Operator choices for resolving divergence.

use std::fmt;
use std::str::FromStr;

use crate::error::ModeError;

/// Which side wins a forced divergence resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Local wins: overwrite remote.
    Push,
    /// Remote wins: overwrite local.
    Pull,
}

impl ForceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceMode::Push => "push",
            ForceMode::Pull => "pull",
        }
    }
}

impl FromStr for ForceMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(ForceMode::Push),
            "pull" => Ok(ForceMode::Pull),
            other => Err(ModeError::Invalid(other.to_string())),
        }
    }
}

impl fmt::Display for ForceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags accompanying a reconciliation request.
///
/// `mode` is only consulted when both sides changed and `force` is set. No
/// default mode exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub force: bool,
    pub mode: Option<ForceMode>,
}

impl SyncOptions {
    /// Plain reconciliation: divergence is refused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forced reconciliation with an explicit winner.
    pub fn forced(mode: ForceMode) -> Self {
        Self {
            force: true,
            mode: Some(mode),
        }
    }

    /// Build from raw command-line flags.
    ///
    /// An empty or absent mode string means "no mode". Anything other than
    /// `push`/`pull` is rejected here, before any I/O happens.
    pub fn from_flags(force: bool, mode: Option<&str>) -> Result<Self, ModeError> {
        let mode = match mode {
            None | Some("") => None,
            Some(s) => Some(s.parse()?),
        };
        Ok(Self { force, mode })
    }
}
